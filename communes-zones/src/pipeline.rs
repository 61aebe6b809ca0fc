//! Chargement des entrées d'après la configuration, puis exécution

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use zonage::normalize::normalize_zone;
use zonage::source::{read_communes, read_zone_file};
use zonage::{Pipeline, PipelineOutput, ZoneLevel, ZoneSet};

use crate::config::Config;
use crate::report::ClassificationReport;
use crate::reproject;

/// Charge et normalise les trois zones, sans lire la table des communes
pub fn load_zones(config: &Config) -> Result<ZoneSet> {
    config.validate()?;

    let mut zones = Vec::with_capacity(ZoneLevel::ALL.len());
    for level in ZoneLevel::ALL {
        let zone_config = config
            .zone(level)
            .with_context(|| format!("Missing configuration for {}", level))?;
        let tolerance = zone_config.tolerance()?;

        let source = read_zone_file(&zone_config.path, level)
            .with_context(|| format!("Failed to load {}", level))?;
        debug!(
            zone = %level,
            file = %zone_config.path.display(),
            epsg = source.epsg,
            features = source.features.len(),
            "Zone file read"
        );

        let source = reproject::to_wgs84(source)
            .with_context(|| format!("Failed to bring {} to EPSG:4326", level))?;
        let zone = normalize_zone(&source, tolerance)
            .with_context(|| format!("Failed to normalize {}", level))?;

        if zone.is_empty() {
            warn!(zone = %level, "No polygon left after normalization");
        }
        zones.push(zone);
    }

    Ok(ZoneSet::from_zones(zones)?)
}

/// Charge les trois zones et la table des communes
///
/// Toute erreur de lecture, de colonnes ou de projection arrête le passage
/// avant la moindre jointure.
pub fn load(config: &Config) -> Result<Pipeline> {
    let zones = load_zones(config)?;

    let delimiter = config.communes.delimiter as u8;
    let table = read_communes(&config.communes.path, delimiter).with_context(|| {
        format!(
            "Failed to load communes: {}",
            config.communes.path.display()
        )
    })?;
    info!(
        communes = table.communes.len(),
        encoding = table.encoding.name(),
        missing_location = table.missing_locations(),
        "Communes loaded"
    );

    Ok(Pipeline::new(zones, table.communes))
}

/// Charge puis exécute un passage complet
pub fn run(config: &Config) -> Result<(PipelineOutput, ClassificationReport)> {
    let output = load(config)?.run();
    let report = ClassificationReport::from_output(&output);
    Ok((output, report))
}
