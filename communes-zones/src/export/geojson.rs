//! Export GeoJSON avec geozero (zones résolues, marqueurs de communes)

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use geo::Geometry;
use geozero::geojson::GeoJsonWriter;
use geozero::GeozeroGeometry;
use tracing::warn;

use zonage::types::WGS84_EPSG;
use zonage::{ClassifiedCommune, ResolvedZones, ZoneAssignment, ZoneLevel};

/// Exporte les zones résolues, une feature par niveau
///
/// Ordre de dessin : Zone 3 d'abord pour que les contours des zones
/// prioritaires restent au-dessus.
pub fn export_zones(zones: &ResolvedZones, output_path: &Path) -> Result<()> {
    let mut writer = create(output_path)?;
    write_zones(&mut writer, zones)?;
    writer.flush()?;
    Ok(())
}

/// Exporte les communes sélectionnées sous forme de points
///
/// Retourne le nombre de marqueurs écrits ; les communes sans position sont
/// ignorées.
pub fn export_markers(rows: &[&ClassifiedCommune], output_path: &Path) -> Result<usize> {
    let mut writer = create(output_path)?;
    let written = write_markers(&mut writer, rows)?;
    writer.flush()?;
    Ok(written)
}

fn create(output_path: &Path) -> Result<BufWriter<File>> {
    let file = File::create(output_path)
        .context(format!("Failed to create file: {}", output_path.display()))?;
    Ok(BufWriter::new(file))
}

pub fn write_zones<W: Write>(writer: &mut W, zones: &ResolvedZones) -> Result<()> {
    write_header(writer)?;

    for (i, level) in ZoneLevel::ALL.iter().rev().enumerate() {
        if i > 0 {
            write!(writer, ",")?;
        }
        let zone = zones.get(*level);
        let assignment = ZoneAssignment::from(*level);
        let geometry = Geometry::MultiPolygon(zone.geometry.clone());

        write_feature(
            writer,
            level.label(),
            &geometry,
            &[
                ("zone", Property::Text(level.label())),
                ("color", Property::Text(assignment.color())),
                ("polygons", Property::Count(zone.geometry.0.len())),
            ],
        )?;
    }

    write!(writer, "]}}")?;
    Ok(())
}

pub fn write_markers<W: Write>(writer: &mut W, rows: &[&ClassifiedCommune]) -> Result<usize> {
    write_header(writer)?;

    let mut written = 0;
    for row in rows {
        let Some(location) = row.location else {
            warn!(commune = %row.key(), "No location, marker skipped");
            continue;
        };

        if written > 0 {
            write!(writer, ",")?;
        }
        let popup = format!("{} ({})", row.name, row.zone);
        write_feature(
            writer,
            &row.key().to_string(),
            &Geometry::Point(location),
            &[
                ("nom_commune", Property::Text(&row.name)),
                ("code_postal", Property::Text(row.postal_code.as_str())),
                ("zone", Property::Text(row.zone.label())),
                ("color", Property::Text(row.zone.color())),
                ("popup", Property::Text(&popup)),
            ],
        )?;
        written += 1;
    }

    write!(writer, "]}}")?;
    Ok(written)
}

/// Valeur de propriété d'une feature
#[derive(Debug, Clone, Copy)]
enum Property<'a> {
    Text(&'a str),
    Count(usize),
}

/// Header FeatureCollection avec CRS
fn write_header<W: Write>(writer: &mut W) -> Result<()> {
    write!(
        writer,
        r#"{{"type":"FeatureCollection","crs":{{"type":"name","properties":{{"name":"urn:ogc:def:crs:EPSG::{}"}}}},"features":["#,
        WGS84_EPSG
    )?;
    Ok(())
}

/// Écrit une feature, géométrie via geozero
fn write_feature<W: Write>(
    writer: &mut W,
    id: &str,
    geometry: &Geometry,
    properties: &[(&str, Property)],
) -> Result<()> {
    write!(writer, r#"{{"type":"Feature","id":"{}","#, escape_json(id))?;

    write!(writer, r#""geometry":"#)?;
    let mut geom_buf = Vec::new();
    let mut geom_writer = GeoJsonWriter::new(&mut geom_buf);
    geometry.process_geom(&mut geom_writer)?;
    writer.write_all(&geom_buf)?;

    write!(writer, r#","properties":{{"#)?;
    for (i, (key, value)) in properties.iter().enumerate() {
        if i > 0 {
            write!(writer, ",")?;
        }
        match value {
            Property::Text(text) => {
                write!(writer, r#""{}":"{}""#, escape_json(key), escape_json(text))?
            }
            Property::Count(count) => write!(writer, r#""{}":{}"#, escape_json(key), count)?,
        }
    }
    write!(writer, "}}}}")?;

    Ok(())
}

/// Échappe une chaîne pour JSON
fn escape_json(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '"' => result.push_str("\\\""),
            '\\' => result.push_str("\\\\"),
            '\n' => result.push_str("\\n"),
            '\r' => result.push_str("\\r"),
            '\t' => result.push_str("\\t"),
            c if c.is_control() => {
                result.push_str(&format!("\\u{:04x}", c as u32));
            }
            c => result.push(c),
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{polygon, MultiPolygon, Point};
    use zonage::{PostalCode, ResolvedZone};

    fn resolved() -> ResolvedZones {
        let square = polygon![
            (x: 4.0, y: 45.0),
            (x: 4.1, y: 45.0),
            (x: 4.1, y: 45.1),
            (x: 4.0, y: 45.1),
            (x: 4.0, y: 45.0),
        ];
        ResolvedZones {
            zone1: ResolvedZone {
                level: ZoneLevel::Zone1,
                geometry: MultiPolygon::new(vec![square]),
            },
            zone2: ResolvedZone {
                level: ZoneLevel::Zone2,
                geometry: MultiPolygon::new(vec![]),
            },
            zone3: ResolvedZone {
                level: ZoneLevel::Zone3,
                geometry: MultiPolygon::new(vec![]),
            },
        }
    }

    #[test]
    fn test_write_zones() {
        let mut buffer = Vec::new();
        write_zones(&mut buffer, &resolved()).unwrap();
        let json = String::from_utf8(buffer).unwrap();

        assert!(json.contains(r#""type":"FeatureCollection""#));
        assert!(json.contains("EPSG::4326"));
        assert!(json.contains(r#""id":"Zone 1""#));
        assert!(json.contains(r#""color":"green""#));
        assert!(json.contains("MultiPolygon"));
        assert!(json.contains(r#""polygons":1"#));
        assert!(json.contains(r#""polygons":0"#));
        // Ordre de dessin : Zone 3 en premier
        assert!(json.find("Zone 3").unwrap() < json.find("Zone 1").unwrap());
    }

    #[test]
    fn test_write_markers_skips_missing_location() {
        let with_location = ClassifiedCommune {
            name: "Saint-Étienne".to_string(),
            postal_code: PostalCode::normalize("42000"),
            department: "42".to_string(),
            location: Some(Point::new(4.38717, 45.4396)),
            zone: ZoneAssignment::Zone1,
        };
        let without = ClassifiedCommune {
            name: "Inconnue".to_string(),
            location: None,
            zone: ZoneAssignment::Unclassified,
            ..with_location.clone()
        };

        let mut buffer = Vec::new();
        let written = write_markers(&mut buffer, &[&with_location, &without]).unwrap();
        let json = String::from_utf8(buffer).unwrap();

        assert_eq!(written, 1);
        assert!(json.contains(r#""popup":"Saint-Étienne (Zone 1)""#));
        assert!(json.contains(r#""id":"Saint-Étienne (42000)""#));
        assert!(!json.contains("Inconnue"));
    }

    #[test]
    fn test_escape_json() {
        assert_eq!(escape_json("hello"), "hello");
        assert_eq!(escape_json("hello\"world"), "hello\\\"world");
        assert_eq!(escape_json("line\nbreak"), "line\\nbreak");
    }

    #[test]
    fn test_export_zones_to_file() {
        let output_path =
            std::env::temp_dir().join(format!("zonage_zones_{}.geojson", std::process::id()));

        export_zones(&resolved(), &output_path).unwrap();

        let content = std::fs::read_to_string(&output_path).unwrap();
        assert!(content.starts_with(r#"{"type":"FeatureCollection""#));
        assert!(content.ends_with("]}"));

        std::fs::remove_file(output_path).ok();
    }
}
