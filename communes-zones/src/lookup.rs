//! Recherche de communes par libellé de sélection `Nom (CP)`

use regex::Regex;
use std::sync::OnceLock;
use thiserror::Error;

use zonage::{ClassifiedCommune, Classification, CommuneKey, PostalCode};

/// Erreurs de sélection
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SelectionError {
    /// Libellé qui ne suit pas le format `Nom (CP)`
    #[error("Invalid selection '{0}', expected 'Nom (CP)'")]
    Malformed(String),

    /// Aucune commune ne porte cette clé
    #[error("Unknown commune: {0}")]
    NotFound(String),
}

fn selection_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\s*(.+?)\s*\(\s*(\w+)\s*\)\s*$").expect("valid regex"))
}

/// Découpe un libellé `Nom (CP)` en clé composite
pub fn parse_selection(label: &str) -> Result<CommuneKey, SelectionError> {
    let caps = selection_regex()
        .captures(label)
        .ok_or_else(|| SelectionError::Malformed(label.to_string()))?;

    let postal_code = PostalCode::normalize(&caps[2]);
    if postal_code.is_empty() {
        return Err(SelectionError::Malformed(label.to_string()));
    }

    Ok(CommuneKey::new(&caps[1], postal_code))
}

/// Résout une liste de libellés ; le premier libellé invalide arrête tout
pub fn resolve<'a>(
    classification: &'a Classification,
    labels: &[String],
) -> Result<Vec<&'a ClassifiedCommune>, SelectionError> {
    labels
        .iter()
        .map(|label| {
            let key = parse_selection(label)?;
            classification
                .find(&key)
                .ok_or_else(|| SelectionError::NotFound(key.to_string()))
        })
        .collect()
}

/// Ligne d'affichage `Nom | CP | Zone`
pub fn format_row(row: &ClassifiedCommune) -> String {
    format!("{} | {} | {}", row.name, row.postal_code, row.zone)
}
