//! Définition et implémentation des commandes CLI
//!
//! - `classify` : table des communes → CSV classifié + rapport
//! - `zones` : zones résolues → GeoJSON
//! - `lookup` : zone de communes choisies par libellé `Nom (CP)`

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Args, Subcommand};
use tracing::info;
use zonage::precedence::resolve;

use communes_zones::config::{self, Config};
use communes_zones::export::{export_classification, export_markers, export_zones, CsvOptions};
use communes_zones::{lookup, pipeline};

/// Options communes à toutes les commandes
#[derive(Args, Debug, Clone)]
pub struct InputArgs {
    /// Config preset name (default) or path to a JSON config
    #[arg(long, default_value = "default")]
    pub config: String,

    /// Data directory for relative paths (défaut : env ZONAGE_DATA_DIR / .)
    #[arg(long)]
    pub data_dir: Option<PathBuf>,

    /// Override the commune table path
    #[arg(long)]
    pub communes: Option<PathBuf>,

    /// Override the commune table delimiter
    #[arg(long)]
    pub delimiter: Option<char>,

    /// Override a zone tolerance, as LEVEL=DEGREES (e.g. 3=0.02)
    #[arg(long, value_parser = parse_tolerance)]
    pub tolerance: Vec<(u8, f64)>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Classify every commune and export the table
    Classify {
        #[command(flatten)]
        input: InputArgs,

        /// Output CSV path
        #[arg(short, long, default_value = "communes_classees.csv")]
        output: PathBuf,

        /// Output delimiter (défaut : config)
        #[arg(long)]
        output_delimiter: Option<char>,

        /// Export only communes assigned to a zone
        #[arg(long)]
        classified_only: bool,

        /// Write the run report as JSON
        #[arg(long)]
        report: Option<PathBuf>,
    },

    /// Export the resolved zones as GeoJSON
    Zones {
        #[command(flatten)]
        input: InputArgs,

        /// Output GeoJSON path
        #[arg(short, long, default_value = "zones.geojson")]
        output: PathBuf,
    },

    /// Show the zone of selected communes
    Lookup {
        #[command(flatten)]
        input: InputArgs,

        /// Selections formatted as "Nom (CP)"
        selections: Vec<String>,

        /// List every selection label instead
        #[arg(long)]
        list: bool,

        /// Write the selected communes as GeoJSON markers
        #[arg(long)]
        markers: Option<PathBuf>,
    },
}

/// Charge la configuration et applique les surcharges CLI
///
/// La validation a lieu au chargement des zones, après toutes les surcharges.
pub fn load_config(input: &InputArgs) -> Result<Config> {
    let mut config = Config::load_spec(&input.config)?;

    if let Some(path) = &input.communes {
        config.communes.path = path.clone();
    }
    if let Some(delimiter) = input.delimiter {
        config.communes.delimiter = delimiter;
    }
    for &(level, tolerance) in &input.tolerance {
        let zone = config
            .zones
            .iter_mut()
            .find(|z| z.level == level)
            .with_context(|| format!("No zone with level {} in config", level))?;
        zone.tolerance = Some(tolerance);
    }

    let data_dir = config::data_dir(input.data_dir.clone());
    config.resolve_paths(&data_dir);

    info!(config = %input.config, data_dir = %data_dir.display(), "Configuration loaded");
    Ok(config)
}

/// Exécute la commande classify
pub fn cmd_classify(
    input: &InputArgs,
    output: &Path,
    output_delimiter: Option<char>,
    classified_only: bool,
    report_path: Option<&Path>,
) -> Result<()> {
    let mut config = load_config(input)?;
    if let Some(delimiter) = output_delimiter {
        config.output.delimiter = delimiter;
    }
    if classified_only {
        config.output.classified_only = true;
    }

    println!("=== Classification ===");
    println!("Communes: {}", config.communes.path.display());
    for zone in &config.zones {
        println!(
            "Zone {}: {} (tolerance {})",
            zone.level,
            zone.path.display(),
            zone.tolerance()?
        );
    }

    let (result, report) = pipeline::run(&config)?;

    let options = CsvOptions {
        delimiter: config.output.delimiter as u8,
        classified_only: config.output.classified_only,
    };
    let written = export_classification(&result.classification, output, &options)?;
    println!("\nWrote {} rows to {}", written, output.display());

    report.display();
    if let Some(path) = report_path {
        report.save_to_file(path)?;
        println!("Report: {}", path.display());
    }

    Ok(())
}

/// Exécute la commande zones
pub fn cmd_zones(input: &InputArgs, output: &Path) -> Result<()> {
    let config = load_config(input)?;
    let zones = pipeline::load_zones(&config)?;
    let resolved = resolve(&zones);

    export_zones(&resolved, output)?;

    for zone in resolved.iter() {
        println!("{}: {} polygons", zone.level, zone.geometry.0.len());
    }
    println!("Wrote {}", output.display());

    Ok(())
}

/// Exécute la commande lookup
pub fn cmd_lookup(
    input: &InputArgs,
    selections: &[String],
    list: bool,
    markers: Option<&Path>,
) -> Result<()> {
    if !list && selections.is_empty() {
        bail!("Give at least one selection \"Nom (CP)\" or use --list");
    }

    let config = load_config(input)?;
    let (result, _) = pipeline::run(&config)?;
    let classification = &result.classification;

    if list {
        for label in classification.options() {
            println!("{}", label);
        }
        return Ok(());
    }

    let rows = lookup::resolve(classification, selections)?;
    for row in &rows {
        println!("{}", lookup::format_row(row));
    }

    if let Some(path) = markers {
        let written = export_markers(&rows, path)?;
        println!("Wrote {} markers to {}", written, path.display());
    }

    Ok(())
}

/// Parse une surcharge `LEVEL=DEGREES`
fn parse_tolerance(raw: &str) -> Result<(u8, f64)> {
    let (level, value) = raw
        .split_once('=')
        .with_context(|| format!("Invalid tolerance '{}'. Expected LEVEL=DEGREES", raw))?;

    let level: u8 = level
        .trim()
        .parse()
        .map_err(|_| anyhow::anyhow!("Invalid zone level in '{}'", raw))?;
    let value: f64 = value
        .trim()
        .parse()
        .map_err(|_| anyhow::anyhow!("Invalid tolerance value in '{}'", raw))?;

    if !(1..=3).contains(&level) {
        bail!("Zone level must be 1, 2 or 3, got: {}", level);
    }
    if !value.is_finite() || value < 0.0 {
        bail!("Tolerance must be a non-negative number, got: {}", value);
    }

    Ok((level, value))
}
