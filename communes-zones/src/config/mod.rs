//! Configuration d'un passage de classification

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use zonage::ZoneLevel;

/// Variable d'environnement du répertoire des données
pub const DATA_DIR_ENV: &str = "ZONAGE_DATA_DIR";

/// Configuration principale
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Table des communes
    pub communes: CommunesConfig,

    /// Les trois fichiers de zone
    pub zones: Vec<ZoneConfig>,

    /// Options d'export
    #[serde(default)]
    pub output: OutputConfig,
}

/// Source de la table des communes
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CommunesConfig {
    pub path: PathBuf,

    /// Séparateur de champs
    #[serde(default = "default_input_delimiter")]
    pub delimiter: char,
}

/// Fichier de zone
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ZoneConfig {
    /// Niveau 1, 2 ou 3
    pub level: u8,

    pub path: PathBuf,

    /// Tolérance de simplification en degrés (défaut selon le niveau)
    #[serde(default)]
    pub tolerance: Option<f64>,
}

/// Options d'export de la table classifiée
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OutputConfig {
    #[serde(default = "default_output_delimiter")]
    pub delimiter: char,

    /// N'exporter que les communes affectées à une zone
    #[serde(default)]
    pub classified_only: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            delimiter: default_output_delimiter(),
            classified_only: false,
        }
    }
}

fn default_input_delimiter() -> char {
    ';'
}

fn default_output_delimiter() -> char {
    ','
}

impl ZoneConfig {
    pub fn zone_level(&self) -> Result<ZoneLevel> {
        ZoneLevel::from_rank(self.level)
            .with_context(|| format!("Invalid zone level {} (expected 1, 2 or 3)", self.level))
    }

    /// Tolérance effective
    pub fn tolerance(&self) -> Result<f64> {
        Ok(self
            .tolerance
            .unwrap_or(self.zone_level()?.default_tolerance()))
    }
}

impl Config {
    /// Charge une configuration depuis un fichier
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .context(format!("Failed to read config file: {}", path.display()))?;

        serde_json::from_str(&content).context("Failed to parse config JSON")
    }

    /// Charge une configuration depuis un preset embarqué
    pub fn from_preset(preset: &str) -> Result<Self> {
        match preset {
            "default" => Self::load_embedded(include_str!("presets/default.json")),
            _ => bail!("Unknown preset: {}. Use: default", preset),
        }
    }

    fn load_embedded(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("Failed to parse embedded config")
    }

    /// Preset embarqué ou chemin vers un fichier JSON
    pub fn load_spec(spec: &str) -> Result<Self> {
        let path = Path::new(spec);
        if path.extension().is_some_and(|ext| ext == "json") || path.exists() {
            Self::load(path)
        } else {
            Self::from_preset(spec)
        }
    }

    /// Rend absolus les chemins relatifs, par rapport au répertoire des données
    pub fn resolve_paths(&mut self, data_dir: &Path) {
        let resolve = |p: &mut PathBuf| {
            if p.is_relative() {
                *p = data_dir.join(&*p);
            }
        };
        resolve(&mut self.communes.path);
        for zone in &mut self.zones {
            resolve(&mut zone.path);
        }
    }

    /// Configuration d'un niveau de zone
    pub fn zone(&self, level: ZoneLevel) -> Option<&ZoneConfig> {
        self.zones.iter().find(|z| z.level == level.rank())
    }

    /// Vérifie la cohérence avant tout chargement
    pub fn validate(&self) -> Result<()> {
        for level in ZoneLevel::ALL {
            let count = self.zones.iter().filter(|z| z.level == level.rank()).count();
            match count {
                1 => {}
                0 => bail!("Missing configuration for {}", level),
                _ => bail!("{} is configured {} times", level, count),
            }
        }
        for zone in &self.zones {
            zone.zone_level()?;
            if zone.tolerance()? < 0.0 {
                bail!("Negative tolerance for zone {}", zone.level);
            }
        }
        if !self.communes.delimiter.is_ascii() {
            bail!("Input delimiter must be ASCII: {:?}", self.communes.delimiter);
        }
        if !self.output.delimiter.is_ascii() {
            bail!("Output delimiter must be ASCII: {:?}", self.output.delimiter);
        }
        Ok(())
    }
}

/// Répertoire des données : argument, sinon `ZONAGE_DATA_DIR`, sinon `.`
pub fn data_dir(cli_value: Option<PathBuf>) -> PathBuf {
    cli_value
        .or_else(|| std::env::var(DATA_DIR_ENV).ok().map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from("."))
}
