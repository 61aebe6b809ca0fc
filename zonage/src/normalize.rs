//! Normalisation des géométries de zone
//!
//! Simplification à la tolérance de la zone (Visvalingam-Whyatt, variante
//! qui préserve la topologie), puis nettoyage : géométries nulles et non
//! polygonales écartées, multipolygones éclatés en polygones simples.
//!
//! La tolérance `t` est une distance en degrés ; VW travaille sur l'aire des
//! triangles, le seuil retenu est donc `t²`. C'est plus doux qu'un
//! Douglas-Peucker à distance `t` : les contours gardent plus de sommets,
//! mais aucun anneau ne se croise après simplification. `geo` n'offre pas de
//! Douglas-Peucker qui préserve la topologie.

use geo::{Area, Geometry, Polygon, SimplifyVwPreserve};
use tracing::{debug, info};

use crate::types::{NormalizeStats, RawZoneFeature, Zone, ZonePolygon, ZoneSource, WGS84_EPSG};
use crate::ZonageError;

/// Normalise le contenu d'un fichier de zone
///
/// # Errors
///
/// Retourne `ZonageError::UnsupportedCrs` si la source n'est pas en WGS84 :
/// une jointure entre systèmes différents donnerait des résultats faux.
pub fn normalize_zone(source: &ZoneSource, tolerance: f64) -> Result<Zone, ZonageError> {
    if source.epsg != WGS84_EPSG {
        return Err(ZonageError::unsupported_crs(
            source.origin.clone(),
            format!("EPSG:{} (expected EPSG:{})", source.epsg, WGS84_EPSG),
        ));
    }

    let (polygons, stats) = normalize(&source.features, tolerance);

    info!(
        zone = %source.level,
        tolerance = tolerance,
        read = stats.features_read,
        null = stats.null_dropped,
        non_polygon = stats.non_polygon_dropped,
        degenerate = stats.degenerate_dropped,
        polygons = stats.polygons_emitted,
        "Zone normalized"
    );

    Ok(Zone {
        level: source.level,
        tolerance,
        polygons,
        stats,
    })
}

/// Simplifie et nettoie une collection de features
///
/// La sortie ne contient que des polygones simples non dégénérés.
/// Appliquer deux fois la normalisation ne change plus rien.
pub fn normalize(features: &[RawZoneFeature], tolerance: f64) -> (Vec<ZonePolygon>, NormalizeStats) {
    let mut stats = NormalizeStats {
        features_read: features.len(),
        ..Default::default()
    };
    let mut polygons = Vec::new();

    for feature in features {
        let parts: Vec<Polygon> = match &feature.geometry {
            None => {
                stats.null_dropped += 1;
                continue;
            }
            Some(Geometry::Polygon(p)) => vec![simplify(p, tolerance)],
            Some(Geometry::MultiPolygon(mp)) => mp.0.iter().map(|p| simplify(p, tolerance)).collect(),
            Some(other) => {
                debug!(feature = %feature.id, kind = geometry_kind(other), "Non-polygon geometry dropped");
                stats.non_polygon_dropped += 1;
                continue;
            }
        };

        let multi_part = matches!(feature.geometry, Some(Geometry::MultiPolygon(_)));
        for (i, polygon) in parts.into_iter().enumerate() {
            if is_degenerate(&polygon) {
                stats.degenerate_dropped += 1;
                continue;
            }
            let id = if multi_part {
                format!("{}#{}", feature.id, i)
            } else {
                feature.id.clone()
            };
            polygons.push(ZonePolygon { id, polygon });
        }
    }

    stats.polygons_emitted = polygons.len();
    (polygons, stats)
}

/// Tolérance en degrés → seuil d'aire des triangles VW (degrés²)
fn simplify(polygon: &Polygon, tolerance: f64) -> Polygon {
    if tolerance <= 0.0 {
        return polygon.clone();
    }
    polygon.simplify_vw_preserve(&(tolerance * tolerance))
}

fn is_degenerate(polygon: &Polygon) -> bool {
    polygon.exterior().0.len() < 4 || polygon.unsigned_area() == 0.0
}

fn geometry_kind(geometry: &Geometry) -> &'static str {
    match geometry {
        Geometry::Point(_) => "Point",
        Geometry::Line(_) => "Line",
        Geometry::LineString(_) => "LineString",
        Geometry::Polygon(_) => "Polygon",
        Geometry::MultiPoint(_) => "MultiPoint",
        Geometry::MultiLineString(_) => "MultiLineString",
        Geometry::MultiPolygon(_) => "MultiPolygon",
        Geometry::GeometryCollection(_) => "GeometryCollection",
        Geometry::Rect(_) => "Rect",
        Geometry::Triangle(_) => "Triangle",
    }
}
