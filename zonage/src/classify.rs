//! Jointure spatiale communes → zones
//!
//! Prédicat « strictement à l'intérieur » : un point posé sur une limite
//! n'appartient pas à la zone. Un R-tree sur les emprises des polygones
//! filtre les candidats avant le test exact.

use geo::{BoundingRect, Contains, Point, Polygon};
use rstar::{RTree, RTreeObject, AABB};
use tracing::debug;

use crate::precedence::ResolvedZones;
use crate::types::{Commune, ResolvedZone, ZoneLevel, ZoneMatches};

/// Emprise d'un polygone dans l'index
#[derive(Debug, Clone)]
struct PolygonEnvelope {
    aabb: AABB<[f64; 2]>,
    index: usize,
}

impl RTreeObject for PolygonEnvelope {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.aabb
    }
}

/// Index spatial d'une zone résolue
pub struct ZoneIndex {
    level: ZoneLevel,
    polygons: Vec<Polygon>,
    tree: RTree<PolygonEnvelope>,
}

impl ZoneIndex {
    pub fn build(zone: &ResolvedZone) -> Self {
        let polygons: Vec<Polygon> = zone.geometry.0.clone();

        let envelopes: Vec<PolygonEnvelope> = polygons
            .iter()
            .enumerate()
            .filter_map(|(index, polygon)| {
                let rect = polygon.bounding_rect()?;
                Some(PolygonEnvelope {
                    aabb: AABB::from_corners(
                        [rect.min().x, rect.min().y],
                        [rect.max().x, rect.max().y],
                    ),
                    index,
                })
            })
            .collect();

        Self {
            level: zone.level,
            polygons,
            tree: RTree::bulk_load(envelopes),
        }
    }

    pub fn level(&self) -> ZoneLevel {
        self.level
    }

    pub fn is_empty(&self) -> bool {
        self.polygons.is_empty()
    }

    /// Le point est-il strictement à l'intérieur d'un polygone de la zone ?
    pub fn contains(&self, point: &Point) -> bool {
        let probe = AABB::from_point([point.x(), point.y()]);
        self.tree
            .locate_in_envelope_intersecting(&probe)
            .any(|candidate| self.polygons[candidate.index].contains(point))
    }
}

/// Communes strictement à l'intérieur d'une zone
///
/// Les communes sans position sont ignorées ; une zone vide donne un
/// résultat vide.
pub fn spatial_join(communes: &[Commune], index: &ZoneIndex) -> ZoneMatches {
    let keys = if index.is_empty() {
        Vec::new()
    } else {
        communes
            .iter()
            .filter(|c| c.location.is_some_and(|p| index.contains(&p)))
            .map(Commune::key)
            .collect()
    };

    debug!(zone = %index.level(), matches = keys.len(), "Spatial join done");

    ZoneMatches {
        level: index.level(),
        keys,
    }
}

/// Jointure sur les trois zones résolues, par ordre de priorité
pub fn classify(communes: &[Commune], zones: &ResolvedZones) -> Vec<ZoneMatches> {
    zones
        .iter()
        .map(|zone| spatial_join(communes, &ZoneIndex::build(zone)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PostalCode;
    use geo::{polygon, MultiPolygon};

    fn commune(name: &str, location: Option<(f64, f64)>) -> Commune {
        Commune {
            name: name.to_string(),
            postal_code: PostalCode::normalize("42000"),
            location: location.map(|(x, y)| Point::new(x, y)),
        }
    }

    fn resolved(level: ZoneLevel, polygons: Vec<Polygon>) -> ResolvedZone {
        ResolvedZone {
            level,
            geometry: MultiPolygon::new(polygons),
        }
    }

    fn unit_square(x: f64, y: f64) -> Polygon {
        polygon![
            (x: x, y: y),
            (x: x + 1.0, y: y),
            (x: x + 1.0, y: y + 1.0),
            (x: x, y: y + 1.0),
            (x: x, y: y),
        ]
    }

    #[test]
    fn test_within_is_strict() {
        let zone = resolved(ZoneLevel::Zone1, vec![unit_square(0.0, 0.0)]);
        let index = ZoneIndex::build(&zone);

        assert!(index.contains(&Point::new(0.5, 0.5)));
        assert!(!index.contains(&Point::new(1.0, 0.5)), "boundary is excluded");
        assert!(!index.contains(&Point::new(0.0, 0.0)), "vertex is excluded");
        assert!(!index.contains(&Point::new(2.0, 2.0)));
    }

    #[test]
    fn test_join_with_several_polygons() {
        let zone = resolved(
            ZoneLevel::Zone2,
            vec![unit_square(0.0, 0.0), unit_square(10.0, 10.0)],
        );
        let communes = vec![
            commune("A", Some((0.5, 0.5))),
            commune("B", Some((10.5, 10.5))),
            commune("C", Some((5.0, 5.0))),
            commune("D", None),
        ];

        let matches = spatial_join(&communes, &ZoneIndex::build(&zone));
        assert_eq!(matches.level, ZoneLevel::Zone2);
        let names: Vec<&str> = matches.keys.iter().map(|k| k.name.as_str()).collect();
        assert_eq!(names, vec!["A", "B"]);
    }

    #[test]
    fn test_empty_zone_yields_no_match() {
        let zone = resolved(ZoneLevel::Zone3, vec![]);
        let communes = vec![commune("A", Some((0.5, 0.5)))];

        let matches = spatial_join(&communes, &ZoneIndex::build(&zone));
        assert!(matches.keys.is_empty());
    }

    #[test]
    fn test_polygon_with_hole() {
        let with_hole = geo::Polygon::new(
            unit_square(0.0, 0.0).exterior().clone(),
            vec![geo::LineString::from(vec![
                (0.25, 0.25),
                (0.75, 0.25),
                (0.75, 0.75),
                (0.25, 0.75),
                (0.25, 0.25),
            ])],
        );
        let index = ZoneIndex::build(&resolved(ZoneLevel::Zone2, vec![with_hole]));

        assert!(index.contains(&Point::new(0.1, 0.1)));
        assert!(!index.contains(&Point::new(0.5, 0.5)));
    }
}
