//! Résolution des priorités entre zones
//!
//! Zone 1 est conservée telle quelle, Zone 2′ = Zone 2 − Zone 1 et
//! Zone 3′ = Zone 3 − Zone 2 (la Zone 2 normalisée d'origine, pas Zone 2′).

use geo::{BooleanOps, MultiPolygon};
use tracing::{debug, info};

use crate::types::{ResolvedZone, Zone, ZoneLevel, ZonePolygon};
use crate::ZonageError;

/// Les trois zones normalisées, rangées par priorité
#[derive(Debug, Clone)]
pub struct ZoneSet {
    pub zone1: Zone,
    pub zone2: Zone,
    pub zone3: Zone,
}

impl ZoneSet {
    /// Range des zones fournies dans un ordre quelconque
    ///
    /// # Errors
    ///
    /// Chaque niveau doit apparaître exactement une fois.
    pub fn from_zones(zones: Vec<Zone>) -> Result<Self, ZonageError> {
        let mut slots: [Option<Zone>; 3] = [None, None, None];

        for zone in zones {
            let slot = &mut slots[usize::from(zone.level.rank() - 1)];
            if slot.is_some() {
                return Err(ZonageError::DuplicateZone(zone.level));
            }
            *slot = Some(zone);
        }

        let [zone1, zone2, zone3] = slots;
        Ok(Self {
            zone1: zone1.ok_or(ZonageError::MissingZone(ZoneLevel::Zone1))?,
            zone2: zone2.ok_or(ZonageError::MissingZone(ZoneLevel::Zone2))?,
            zone3: zone3.ok_or(ZonageError::MissingZone(ZoneLevel::Zone3))?,
        })
    }

    pub fn get(&self, level: ZoneLevel) -> &Zone {
        match level {
            ZoneLevel::Zone1 => &self.zone1,
            ZoneLevel::Zone2 => &self.zone2,
            ZoneLevel::Zone3 => &self.zone3,
        }
    }
}

/// Zones rendues disjointes par soustraction
#[derive(Debug, Clone)]
pub struct ResolvedZones {
    pub zone1: ResolvedZone,
    pub zone2: ResolvedZone,
    pub zone3: ResolvedZone,
}

impl ResolvedZones {
    pub fn get(&self, level: ZoneLevel) -> &ResolvedZone {
        match level {
            ZoneLevel::Zone1 => &self.zone1,
            ZoneLevel::Zone2 => &self.zone2,
            ZoneLevel::Zone3 => &self.zone3,
        }
    }

    /// Zones par ordre de priorité
    pub fn iter(&self) -> impl Iterator<Item = &ResolvedZone> {
        [&self.zone1, &self.zone2, &self.zone3].into_iter()
    }
}

/// Calcule les zones disjointes
pub fn resolve(zones: &ZoneSet) -> ResolvedZones {
    let zone1 = dissolve(&zones.zone1.polygons);
    let zone2 = dissolve(&zones.zone2.polygons);
    let zone3 = dissolve(&zones.zone3.polygons);

    let zone2_resolved = subtract(&zone2, &zone1);
    let zone3_resolved = subtract(&zone3, &zone2);

    let resolved = ResolvedZones {
        zone1: ResolvedZone {
            level: ZoneLevel::Zone1,
            geometry: zone1,
        },
        zone2: ResolvedZone {
            level: ZoneLevel::Zone2,
            geometry: zone2_resolved,
        },
        zone3: ResolvedZone {
            level: ZoneLevel::Zone3,
            geometry: zone3_resolved,
        },
    };

    for zone in resolved.iter() {
        if zone.is_empty() {
            info!(zone = %zone.level, "Resolved zone is empty, no commune can match it");
        } else {
            debug!(zone = %zone.level, polygons = zone.geometry.0.len(), "Zone resolved");
        }
    }

    resolved
}

/// Fusionne les polygones d'une zone en un multipolygone valide
///
/// Les polygones d'un même fichier peuvent se chevaucher ; les opérations
/// booléennes exigent une entrée sans recouvrement.
pub fn dissolve(polygons: &[ZonePolygon]) -> MultiPolygon {
    let mut parts = polygons.iter();
    let Some(first) = parts.next() else {
        return MultiPolygon::new(Vec::new());
    };

    parts.fold(MultiPolygon::new(vec![first.polygon.clone()]), |acc, zp| {
        acc.union(&MultiPolygon::new(vec![zp.polygon.clone()]))
    })
}

/// Différence géométrique, l'opérande vide est court-circuitée
pub fn subtract(minuend: &MultiPolygon, subtrahend: &MultiPolygon) -> MultiPolygon {
    if minuend.0.is_empty() {
        return MultiPolygon::new(Vec::new());
    }
    if subtrahend.0.is_empty() {
        return minuend.clone();
    }
    minuend.difference(subtrahend)
}
