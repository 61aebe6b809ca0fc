//! # zonage
//!
//! Classification des communes françaises dans trois zones d'intervention
//! emboîtées, par appartenance point-dans-polygone.
//!
//! ## Étapes
//!
//! - Normalisation des géométries de zone (simplification, nettoyage, éclatement)
//! - Résolution des priorités par différence géométrique
//! - Jointure spatiale stricte (R-tree puis test exact)
//! - Agrégation : une ligne par commune, `Hors zone` à défaut
//!
//! ## Usage
//!
//! ```rust,ignore
//! use zonage::{classify_files, ZoneLevel};
//! use std::path::Path;
//!
//! let output = classify_files(
//!     [
//!         (Path::new("Zone_1.geojson"), ZoneLevel::Zone1.default_tolerance()),
//!         (Path::new("Zone_2.geojson"), ZoneLevel::Zone2.default_tolerance()),
//!         (Path::new("Zone_3.geojson"), ZoneLevel::Zone3.default_tolerance()),
//!     ],
//!     Path::new("communes_FR.csv"),
//!     b';',
//! )?;
//!
//! for row in &output.classification.rows {
//!     println!("{} ({}) → {}", row.name, row.postal_code, row.zone);
//! }
//! ```

pub mod aggregate;
pub mod classify;
pub mod error;
pub mod normalize;
pub mod pipeline;
pub mod precedence;
pub mod source;
pub mod types;

pub use error::ZonageError;
pub use pipeline::{Pipeline, PipelineOutput};
pub use precedence::{ResolvedZones, ZoneSet};
pub use types::{
    ClassifiedCommune, Classification, Commune, CommuneKey, PostalCode, ResolvedZone, Zone,
    ZoneAssignment, ZoneLevel, ZonePolygon,
};

use std::path::Path;

/// Classe les communes d'un fichier à partir de trois fichiers de zone en WGS84.
///
/// # Arguments
///
/// * `zone_files` - Chemin et tolérance de Zone 1, Zone 2 puis Zone 3
/// * `communes_path` - Table des communes
/// * `delimiter` - Séparateur de la table (`;` en général)
///
/// # Errors
///
/// Retourne `ZonageError` si un fichier est illisible, si une colonne
/// obligatoire manque ou si une zone n'est pas en EPSG:4326. Aucune
/// jointure n'est tentée dans ces cas.
pub fn classify_files(
    zone_files: [(&Path, f64); 3],
    communes_path: &Path,
    delimiter: u8,
) -> Result<PipelineOutput, ZonageError> {
    let mut zones = Vec::with_capacity(3);
    for ((path, tolerance), level) in zone_files.into_iter().zip(ZoneLevel::ALL) {
        let source = source::read_zone_file(path, level)?;
        zones.push(normalize::normalize_zone(&source, tolerance)?);
    }
    let zones = ZoneSet::from_zones(zones)?;

    let table = source::read_communes(communes_path, delimiter)?;

    Ok(Pipeline::new(zones, table.communes).run())
}
