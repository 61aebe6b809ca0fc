//! Lecture des fichiers de zone GeoJSON

use std::path::Path;

use geo::Geometry;
use geojson::{feature::Id, GeoJson};
use tracing::{info, warn};

use crate::types::{RawZoneFeature, ZoneLevel, ZoneSource, WGS84_EPSG};
use crate::ZonageError;

/// Lit un fichier de zone (FeatureCollection, Feature ou Geometry)
///
/// Le membre `crs` est lu s'il est présent ; sinon le fichier est considéré
/// en WGS84 (EPSG:4326).
pub fn read_zone_file(path: &Path, level: ZoneLevel) -> Result<ZoneSource, ZonageError> {
    let content = std::fs::read_to_string(path)?;
    parse(&content, level, &path.display().to_string())
}

/// Parse le contenu GeoJSON d'une zone
pub fn parse(content: &str, level: ZoneLevel, origin: &str) -> Result<ZoneSource, ZonageError> {
    let geojson: GeoJson = content
        .parse()
        .map_err(|e: geojson::Error| ZonageError::invalid_geojson(origin, e.to_string()))?;

    let (crs, features) = match geojson {
        GeoJson::FeatureCollection(fc) => {
            let crs = crs_member(fc.foreign_members.as_ref());
            let features = fc
                .features
                .into_iter()
                .enumerate()
                .map(|(i, f)| convert_feature(f, i, origin))
                .collect();
            (crs, features)
        }
        GeoJson::Feature(f) => {
            let crs = crs_member(f.foreign_members.as_ref());
            (crs, vec![convert_feature(f, 0, origin)])
        }
        GeoJson::Geometry(g) => {
            let crs = crs_member(g.foreign_members.as_ref());
            let geometry = convert_geometry(g, "0", origin);
            (
                crs,
                vec![RawZoneFeature {
                    id: "0".to_string(),
                    geometry,
                }],
            )
        }
    };

    let epsg = match crs {
        Some(name) => {
            parse_epsg(&name).ok_or_else(|| ZonageError::unsupported_crs(origin, name))?
        }
        None => WGS84_EPSG,
    };

    info!(
        file = origin,
        zone = %level,
        features = features.len(),
        epsg = epsg,
        "Zone file loaded"
    );

    Ok(ZoneSource {
        level,
        epsg,
        origin: origin.to_string(),
        features,
    })
}

/// Extrait un code EPSG d'un nom de CRS GeoJSON
///
/// Formats reconnus : `urn:ogc:def:crs:EPSG::2154`, `EPSG:2154`,
/// `urn:ogc:def:crs:OGC:1.3:CRS84` (équivalent à 4326).
pub fn parse_epsg(name: &str) -> Option<u32> {
    let upper = name.trim().to_uppercase();
    if upper.ends_with("CRS84") {
        return Some(WGS84_EPSG);
    }
    if !upper.contains("EPSG") {
        return None;
    }
    upper.rsplit(':').next()?.trim().parse().ok()
}

/// Nom du CRS déclaré par le membre `crs`, quel que soit l'objet racine
fn crs_member(members: Option<&geojson::JsonObject>) -> Option<String> {
    members?
        .get("crs")?
        .get("properties")?
        .get("name")?
        .as_str()
        .map(str::to_string)
}

fn convert_feature(feature: geojson::Feature, index: usize, origin: &str) -> RawZoneFeature {
    let id = match &feature.id {
        Some(Id::String(s)) => s.clone(),
        Some(Id::Number(n)) => n.to_string(),
        None => index.to_string(),
    };

    let geometry = feature
        .geometry
        .and_then(|g| convert_geometry(g, &id, origin));

    RawZoneFeature { id, geometry }
}

/// Convertit vers `geo`, une géométrie inconvertible est traitée comme nulle
fn convert_geometry(geometry: geojson::Geometry, id: &str, origin: &str) -> Option<Geometry> {
    match Geometry::<f64>::try_from(geometry) {
        Ok(g) => Some(g),
        Err(e) => {
            warn!(file = origin, feature = id, error = %e, "Unconvertible geometry, treated as null");
            None
        }
    }
}
