//! Reprojection des fichiers de zone vers le WGS84
//!
//! La reprojection passe par PROJ et n'est disponible qu'avec le feature
//! `reproject`. Sans lui, une zone hors EPSG:4326 arrête le passage.

use anyhow::Result;
use zonage::types::{ZoneSource, WGS84_EPSG};

/// Ramène une source de zone en EPSG:4326
///
/// # Errors
///
/// Échoue si le système source n'est pas reprojetable : joindre des
/// systèmes différents donnerait une classification fausse.
pub fn to_wgs84(source: ZoneSource) -> Result<ZoneSource> {
    if source.epsg == WGS84_EPSG {
        return Ok(source);
    }
    reproject_source(source)
}

#[cfg(feature = "reproject")]
fn reproject_source(source: ZoneSource) -> Result<ZoneSource> {
    let reprojector = Reprojector::new(source.epsg, WGS84_EPSG)?;
    let features = source
        .features
        .into_iter()
        .map(|mut feature| {
            feature.geometry = feature
                .geometry
                .map(|g| reprojector.transform_geometry(&g))
                .transpose()?;
            Ok(feature)
        })
        .collect::<Result<Vec<_>>>()?;

    info!(
        file = %source.origin,
        from = source.epsg,
        to = WGS84_EPSG,
        features = features.len(),
        "Zone reprojected"
    );

    Ok(ZoneSource {
        epsg: WGS84_EPSG,
        features,
        ..source
    })
}

#[cfg(not(feature = "reproject"))]
fn reproject_source(source: ZoneSource) -> Result<ZoneSource> {
    anyhow::bail!(
        "{} is in EPSG:{} and must be reprojected to EPSG:{}, which requires the 'reproject' feature. \
         Build with: cargo build --features reproject",
        source.origin,
        source.epsg,
        WGS84_EPSG
    )
}

#[cfg(feature = "reproject")]
use anyhow::Context;
#[cfg(feature = "reproject")]
use geo::{Coord, Geometry, LineString, MultiPolygon, Polygon};
#[cfg(feature = "reproject")]
use proj::Proj;
#[cfg(feature = "reproject")]
use tracing::info;

/// Reprojection de géométries entre deux systèmes de coordonnées
#[cfg(feature = "reproject")]
pub struct Reprojector {
    proj: Proj,
}

#[cfg(feature = "reproject")]
impl Reprojector {
    /// Crée un reprojector entre deux EPSG
    pub fn new(source_epsg: u32, target_epsg: u32) -> Result<Self> {
        let source = format!("EPSG:{}", source_epsg);
        let target = format!("EPSG:{}", target_epsg);

        // new_known_crs normalise l'ordre des axes en (lon, lat)
        let proj = Proj::new_known_crs(&source, &target, None).context(format!(
            "Failed to create projection from {} to {}",
            source, target
        ))?;

        Ok(Self { proj })
    }

    /// Transforme une géométrie
    ///
    /// Seules les surfaces sont reprojetées : les autres types seront de
    /// toute façon écartés par la normalisation.
    pub fn transform_geometry(&self, geom: &Geometry) -> Result<Geometry> {
        match geom {
            Geometry::Polygon(p) => Ok(Geometry::Polygon(self.transform_polygon(p)?)),
            Geometry::MultiPolygon(mp) => {
                let polys: Result<Vec<Polygon>> =
                    mp.0.iter().map(|p| self.transform_polygon(p)).collect();
                Ok(Geometry::MultiPolygon(MultiPolygon::new(polys?)))
            }
            _ => Ok(geom.clone()),
        }
    }

    /// Transforme une LineString (conversion par lot)
    fn transform_linestring(&self, ls: &LineString) -> Result<LineString> {
        let mut coords: Vec<(f64, f64)> = ls.0.iter().map(|c| (c.x, c.y)).collect();

        self.proj
            .convert_array(&mut coords)
            .context("Batch coordinate transformation failed")?;

        Ok(LineString::new(
            coords.into_iter().map(|(x, y)| Coord { x, y }).collect(),
        ))
    }

    fn transform_polygon(&self, p: &Polygon) -> Result<Polygon> {
        let exterior = self.transform_linestring(p.exterior())?;
        let interiors: Result<Vec<LineString>> = p
            .interiors()
            .iter()
            .map(|ls| self.transform_linestring(ls))
            .collect();
        Ok(Polygon::new(exterior, interiors?))
    }
}
