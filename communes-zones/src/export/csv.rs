//! Export de la table classifiée en texte délimité

use std::borrow::Cow;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use zonage::{ClassifiedCommune, Classification};

/// En-tête de la table exportée
pub const HEADER: [&str; 3] = ["nom_commune", "code_postal", "zone"];

/// Options d'écriture
#[derive(Debug, Clone, Copy)]
pub struct CsvOptions {
    pub delimiter: u8,

    /// N'écrire que les communes affectées à une zone
    pub classified_only: bool,
}

impl Default for CsvOptions {
    fn default() -> Self {
        Self {
            delimiter: b',',
            classified_only: false,
        }
    }
}

/// Écrit la table dans un fichier, retourne le nombre de lignes écrites
pub fn export_classification(
    classification: &Classification,
    output_path: &Path,
    options: &CsvOptions,
) -> Result<usize> {
    let file = File::create(output_path)
        .context(format!("Failed to create file: {}", output_path.display()))?;
    let mut writer = BufWriter::new(file);

    let written = write_classification(&mut writer, classification, options)?;
    writer.flush()?;

    Ok(written)
}

/// Écrit la table : une ligne par commune, sans colonne d'index
pub fn write_classification<W: Write>(
    writer: &mut W,
    classification: &Classification,
    options: &CsvOptions,
) -> Result<usize> {
    let delimiter = char::from(options.delimiter);

    writeln!(writer, "{}", HEADER.join(&delimiter.to_string()))?;

    let rows: Box<dyn Iterator<Item = &ClassifiedCommune> + '_> = if options.classified_only {
        Box::new(classification.classified())
    } else {
        Box::new(classification.rows.iter())
    };

    let mut written = 0;
    for row in rows {
        write_row(writer, row, options.delimiter)?;
        written += 1;
    }

    Ok(written)
}

fn write_row<W: Write>(writer: &mut W, row: &ClassifiedCommune, delimiter: u8) -> Result<()> {
    let d = char::from(delimiter);
    writeln!(
        writer,
        "{}{d}{}{d}{}",
        escape_field(&row.name, delimiter),
        escape_field(row.postal_code.as_str(), delimiter),
        escape_field(row.zone.label(), delimiter),
    )?;
    Ok(())
}

/// Met un champ entre guillemets s'il contient le séparateur, un guillemet
/// ou un saut de ligne
fn escape_field(value: &str, delimiter: u8) -> Cow<'_, str> {
    let needs_quotes = value
        .bytes()
        .any(|b| b == delimiter || b == b'"' || b == b'\n' || b == b'\r');

    if needs_quotes {
        Cow::Owned(format!("\"{}\"", value.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(value)
    }
}
