//! Types d'erreurs pour le crate zonage

use thiserror::Error;

use crate::types::ZoneLevel;

/// Erreurs fatales du pipeline de classification
///
/// Les problèmes de qualité de données (géométrie nulle, coordonnées
/// manquantes) ne sont pas des erreurs : ils sont absorbés par le
/// normaliseur ou se traduisent par `Hors zone`.
#[derive(Debug, Error)]
pub enum ZonageError {
    /// Erreur d'I/O lors de la lecture d'un fichier source
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Colonnes obligatoires absentes de la table des communes
    #[error("Missing required columns in {file}: {}", missing.join(", "))]
    MissingColumns { file: String, missing: Vec<String> },

    /// Fichier GeoJSON illisible
    #[error("Invalid GeoJSON in {file}: {reason}")]
    InvalidGeoJson { file: String, reason: String },

    /// Système de coordonnées non géré
    #[error("Unsupported CRS for {file}: {crs}")]
    UnsupportedCrs { file: String, crs: String },

    /// Zone absente du jeu de zones
    #[error("Missing zone: {0}")]
    MissingZone(ZoneLevel),

    /// Zone fournie plusieurs fois
    #[error("Zone provided more than once: {0}")]
    DuplicateZone(ZoneLevel),

    /// Erreur de parsing d'un fichier
    #[error("Parse error in {file}: {reason}")]
    ParseError { file: String, reason: String },
}

impl ZonageError {
    /// Crée une erreur de parsing avec contexte
    pub fn parse_error(file: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ParseError {
            file: file.into(),
            reason: reason.into(),
        }
    }

    /// Crée une erreur GeoJSON avec contexte
    pub fn invalid_geojson(file: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidGeoJson {
            file: file.into(),
            reason: reason.into(),
        }
    }

    /// Crée une erreur de CRS non géré
    pub fn unsupported_crs(file: impl Into<String>, crs: impl Into<String>) -> Self {
        Self::UnsupportedCrs {
            file: file.into(),
            crs: crs.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_columns_message() {
        let err = ZonageError::MissingColumns {
            file: "communes_FR.csv".to_string(),
            missing: vec!["latitude".to_string(), "longitude".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "Missing required columns in communes_FR.csv: latitude, longitude"
        );
    }
}
