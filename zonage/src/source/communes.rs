//! Lecture de la table des communes (texte délimité, `;` par défaut)

use std::borrow::Cow;
use std::collections::HashMap;
use std::path::Path;

use encoding_rs::Encoding;
use geo::Point;
use tracing::{debug, info, warn};

use crate::types::{Commune, PostalCode};
use crate::ZonageError;

/// Colonnes obligatoires, dans l'ordre de signalement
pub const REQUIRED_COLUMNS: [&str; 4] = ["nom_commune", "latitude", "longitude", "code_postal"];

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Table des communes chargée
#[derive(Debug)]
pub struct CommuneTable {
    pub communes: Vec<Commune>,

    /// Encodage effectivement utilisé pour décoder le fichier
    pub encoding: &'static Encoding,
}

impl CommuneTable {
    /// Nombre de communes sans position exploitable
    pub fn missing_locations(&self) -> usize {
        self.communes.iter().filter(|c| c.location.is_none()).count()
    }
}

/// Lit la table des communes depuis un fichier
///
/// # Errors
///
/// Retourne `ZonageError::MissingColumns` si une colonne obligatoire manque :
/// aucun traitement partiel n'est tenté.
pub fn read_communes(path: &Path, delimiter: u8) -> Result<CommuneTable, ZonageError> {
    let data = std::fs::read(path)?;
    parse(&data, delimiter, &path.display().to_string())
}

/// Parse le contenu d'une table des communes
pub fn parse(data: &[u8], delimiter: u8, origin: &str) -> Result<CommuneTable, ZonageError> {
    if !delimiter.is_ascii() {
        return Err(ZonageError::parse_error(
            origin,
            format!("delimiter must be ASCII, got byte 0x{:02x}", delimiter),
        ));
    }

    let (content, encoding) = decode(data);
    if encoding != encoding_rs::UTF_8 {
        warn!(file = origin, encoding = encoding.name(), "File is not valid UTF-8, decoded as fallback");
    }

    let mut lines = content.lines().filter(|l| !l.trim().is_empty());

    let header = lines
        .next()
        .ok_or_else(|| ZonageError::parse_error(origin, "empty file"))?;
    let columns = column_index(header, delimiter);

    let missing: Vec<String> = REQUIRED_COLUMNS
        .iter()
        .filter(|c| !columns.contains_key(**c))
        .map(|c| c.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(ZonageError::MissingColumns {
            file: origin.to_string(),
            missing,
        });
    }

    let name_idx = columns["nom_commune"];
    let lat_idx = columns["latitude"];
    let lon_idx = columns["longitude"];
    let cp_idx = columns["code_postal"];

    let mut communes = Vec::new();
    for (line_no, line) in lines.enumerate() {
        let fields = split_record(line, delimiter);
        let field = |idx: usize| fields.get(idx).map(|s| s.trim()).unwrap_or("");

        let name = field(name_idx).to_string();
        let postal_code = PostalCode::normalize(field(cp_idx));
        let location = parse_location(field(lat_idx), field(lon_idx));

        if location.is_none() {
            // +2 : en-tête et numérotation à partir de 1
            debug!(file = origin, line = line_no + 2, commune = %name, "Missing or invalid coordinates");
        }

        communes.push(Commune {
            name,
            postal_code,
            location,
        });
    }

    let table = CommuneTable { communes, encoding };
    info!(
        file = origin,
        communes = table.communes.len(),
        missing_location = table.missing_locations(),
        "Commune table loaded"
    );

    Ok(table)
}

/// Décode les bytes : UTF-8 (BOM toléré), sinon Windows-1252
pub fn decode(data: &[u8]) -> (Cow<'_, str>, &'static Encoding) {
    let data = data.strip_prefix(UTF8_BOM).unwrap_or(data);

    match simdutf8::basic::from_utf8(data) {
        Ok(s) => (Cow::Borrowed(s), encoding_rs::UTF_8),
        Err(_) => {
            let (decoded, _) = encoding_rs::WINDOWS_1252.decode_without_bom_handling(data);
            (decoded, encoding_rs::WINDOWS_1252)
        }
    }
}

/// Découpe un enregistrement en champs, guillemets doubles compris
///
/// `""` à l'intérieur d'un champ entre guillemets vaut un guillemet.
pub fn split_record(line: &str, delimiter: u8) -> Vec<String> {
    let bytes = line.as_bytes();
    let mut fields = Vec::new();
    let mut field = String::new();
    let mut pos = 0;
    let mut in_quotes = false;

    loop {
        if in_quotes {
            match memchr::memchr(b'"', &bytes[pos..]) {
                Some(offset) => {
                    field.push_str(&line[pos..pos + offset]);
                    pos += offset + 1;
                    if bytes.get(pos) == Some(&b'"') {
                        field.push('"');
                        pos += 1;
                    } else {
                        in_quotes = false;
                    }
                }
                None => {
                    // Guillemet non fermé : on garde le reste tel quel
                    field.push_str(&line[pos..]);
                    break;
                }
            }
        } else {
            match memchr::memchr2(delimiter, b'"', &bytes[pos..]) {
                Some(offset) => {
                    field.push_str(&line[pos..pos + offset]);
                    let found = bytes[pos + offset];
                    pos += offset + 1;
                    if found == b'"' {
                        in_quotes = true;
                    } else {
                        fields.push(std::mem::take(&mut field));
                    }
                }
                None => {
                    field.push_str(&line[pos..]);
                    break;
                }
            }
        }
    }

    fields.push(field);
    fields
}

/// Index des colonnes de l'en-tête
fn column_index(header: &str, delimiter: u8) -> HashMap<String, usize> {
    split_record(header, delimiter)
        .into_iter()
        .enumerate()
        .map(|(i, name)| (name.trim().to_string(), i))
        .collect()
}

/// Construit la position (lon, lat) si les deux valeurs sont exploitables
fn parse_location(lat: &str, lon: &str) -> Option<Point> {
    let lat = parse_coordinate(lat)?;
    let lon = parse_coordinate(lon)?;

    if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon) {
        return None;
    }

    Some(Point::new(lon, lat))
}

/// Parse une coordonnée, virgule décimale acceptée
#[inline]
fn parse_coordinate(s: &str) -> Option<f64> {
    if s.is_empty() {
        return None;
    }
    let value: f64 = if s.contains(',') {
        fast_float::parse(s.replace(',', ".")).ok()?
    } else {
        fast_float::parse(s).ok()?
    };
    value.is_finite().then_some(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "nom_commune;code_postal;latitude;longitude\n\
                          Saint-Étienne;42000;45.4397;4.3872\n\
                          \"Ambérieu; en Bugey\";1500;45.9581;5.3572\n\
                          Sans Position;38000;;\n";

    #[test]
    fn test_parse_communes() {
        let table = parse(SAMPLE.as_bytes(), b';', "test.csv").unwrap();
        assert_eq!(table.communes.len(), 3);
        assert_eq!(table.encoding, encoding_rs::UTF_8);

        let se = &table.communes[0];
        assert_eq!(se.name, "Saint-Étienne");
        assert_eq!(se.postal_code.as_str(), "42000");
        let p = se.location.unwrap();
        assert!((p.x() - 4.3872).abs() < 1e-9);
        assert!((p.y() - 45.4397).abs() < 1e-9);

        assert_eq!(table.communes[1].name, "Ambérieu; en Bugey");
        assert_eq!(table.communes[1].postal_code.as_str(), "01500");

        assert!(table.communes[2].location.is_none());
        assert_eq!(table.missing_locations(), 1);
    }

    #[test]
    fn test_missing_columns_is_fatal() {
        let data = b"nom_commune;code_postal;lat;longitude\nA;42000;45.0;4.0\n";
        let err = parse(data, b';', "bad.csv").unwrap_err();
        match err {
            ZonageError::MissingColumns { missing, .. } => {
                assert_eq!(missing, vec!["latitude".to_string()]);
            }
            other => panic!("Expected MissingColumns, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_file() {
        assert!(parse(b"", b';', "empty.csv").is_err());
    }

    #[test]
    fn test_decimal_comma_and_invalid_coordinates() {
        let data = "nom_commune;latitude;longitude;code_postal\n\
                    Virgule;\"45,5\";\"4,25\";42100\n\
                    Hors bornes;95.0;4.0;42100\n\
                    Texte;abc;4.0;42100\n";
        let table = parse(data.as_bytes(), b';', "t.csv").unwrap();

        let p = table.communes[0].location.unwrap();
        assert!((p.y() - 45.5).abs() < 1e-9);
        assert!((p.x() - 4.25).abs() < 1e-9);
        assert!(table.communes[1].location.is_none());
        assert!(table.communes[2].location.is_none());
    }

    #[test]
    fn test_bom_and_latin1_fallback() {
        let mut data = UTF8_BOM.to_vec();
        data.extend_from_slice(b"nom_commune;latitude;longitude;code_postal\nA;45;4;42000\n");
        let table = parse(&data, b';', "bom.csv").unwrap();
        assert_eq!(table.communes.len(), 1);
        assert_eq!(table.encoding, encoding_rs::UTF_8);

        // "É" en Windows-1252
        let data = b"nom_commune;latitude;longitude;code_postal\n\xC9vian;46.4;6.6;74500\n";
        let table = parse(data, b';', "latin1.csv").unwrap();
        assert_eq!(table.encoding, encoding_rs::WINDOWS_1252);
        assert_eq!(table.communes[0].name, "Évian");
    }

    #[test]
    fn test_split_record() {
        assert_eq!(split_record("a;b;c", b';'), vec!["a", "b", "c"]);
        assert_eq!(split_record("a;;", b';'), vec!["a", "", ""]);
        assert_eq!(
            split_record(r#""say ""hi""",x"#, b','),
            vec![r#"say "hi""#, "x"]
        );
        assert_eq!(split_record("", b';'), vec![""]);
    }
}
