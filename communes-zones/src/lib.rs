//! # communes-zones
//!
//! Affectation des communes françaises aux zones d'intervention 1, 2 et 3,
//! export de la table classifiée et des couches GeoJSON.
//!
//! ## Features
//!
//! - Configuration JSON (preset embarqué `default` ou fichier)
//! - Reprojection vers EPSG:4326 (feature `reproject`)
//! - Export CSV de la table, GeoJSON des zones et des marqueurs
//! - Rapport de passage (console ou JSON)
//!
//! ## Usage CLI
//!
//! ```bash
//! # Classer les communes du répertoire de données
//! communes-zones classify --data-dir ./data --output communes_classees.csv
//!
//! # Zones résolues pour la carte
//! communes-zones zones --output zones.geojson
//!
//! # Zone de quelques communes
//! communes-zones lookup "Saint-Étienne (42000)" --markers selection.geojson
//! ```

pub mod config;
pub mod export;
pub mod lookup;
pub mod pipeline;
pub mod report;
pub mod reproject;

pub use config::Config;
pub use export::{export_classification, export_markers, export_zones, CsvOptions};
pub use lookup::{parse_selection, SelectionError};
pub use report::{ClassificationReport, RunStatus};
