//! Agrégation des jointures sur la table complète des communes

use std::collections::{HashMap, HashSet};

use tracing::{info, warn};

use crate::types::{
    AggregateStats, ClassifiedCommune, Classification, Commune, CommuneKey, ZoneAssignment,
    ZoneLevel, ZoneMatches,
};

/// Fusionne les résultats par zone sur la table des communes
///
/// Jointure gauche sur la clé composite : chaque commune d'entrée produit
/// exactement une ligne, `Hors zone` à défaut de correspondance. La sortie
/// est triée par département, code postal puis nom.
pub fn aggregate(communes: &[Commune], matches: &[ZoneMatches]) -> Classification {
    let mut stats = AggregateStats::default();

    // Concaténation des sous-ensembles, la zone la plus prioritaire l'emporte
    let mut assigned: HashMap<&CommuneKey, ZoneLevel> = HashMap::new();
    for zone_matches in matches {
        for key in &zone_matches.keys {
            let previous = assigned.get(key).copied();
            match previous {
                Some(existing) if existing == zone_matches.level => {}
                Some(existing) => {
                    stats.cross_zone_overlaps += 1;
                    warn!(
                        commune = %key,
                        kept = %existing.min(zone_matches.level),
                        dropped = %existing.max(zone_matches.level),
                        "Commune matched by several zones"
                    );
                    assigned.insert(key, existing.min(zone_matches.level));
                }
                None => {
                    assigned.insert(key, zone_matches.level);
                }
            }
        }
    }

    let mut seen: HashSet<CommuneKey> = HashSet::with_capacity(communes.len());
    let mut rows: Vec<ClassifiedCommune> = Vec::with_capacity(communes.len());

    for commune in communes {
        let key = commune.key();
        if commune.location.is_none() {
            stats.missing_location += 1;
        }

        let zone = assigned
            .get(&key)
            .map(|&level| ZoneAssignment::from(level))
            .unwrap_or(ZoneAssignment::Unclassified);

        if !seen.insert(key) {
            stats.duplicate_keys += 1;
        }

        rows.push(ClassifiedCommune {
            name: commune.name.clone(),
            postal_code: commune.postal_code.clone(),
            department: commune.department(),
            location: commune.location,
            zone,
        });
    }

    if stats.duplicate_keys > 0 {
        warn!(
            duplicates = stats.duplicate_keys,
            "Duplicate commune keys: rows sharing a key share the same zone"
        );
    }

    rows.sort_by(|a, b| {
        a.department
            .cmp(&b.department)
            .then_with(|| a.postal_code.cmp(&b.postal_code))
            .then_with(|| a.name.cmp(&b.name))
    });

    debug_assert_eq!(rows.len(), communes.len());

    let classification = Classification { rows, stats };
    info!(
        communes = classification.len(),
        zone1 = classification.count(ZoneAssignment::Zone1),
        zone2 = classification.count(ZoneAssignment::Zone2),
        zone3 = classification.count(ZoneAssignment::Zone3),
        unclassified = classification.count(ZoneAssignment::Unclassified),
        "Classification aggregated"
    );

    classification
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PostalCode;
    use geo::Point;

    fn commune(name: &str, cp: &str, located: bool) -> Commune {
        Commune {
            name: name.to_string(),
            postal_code: PostalCode::normalize(cp),
            location: located.then(|| Point::new(4.0, 45.0)),
        }
    }

    fn matches(level: ZoneLevel, communes: &[&Commune]) -> ZoneMatches {
        ZoneMatches {
            level,
            keys: communes.iter().map(|c| c.key()).collect(),
        }
    }

    #[test]
    fn test_every_commune_gets_one_row() {
        let a = commune("Annecy", "74000", true);
        let b = commune("Bourg-en-Bresse", "1000", true);
        let c = commune("Chambéry", "73000", true);
        let d = commune("Sans position", "42000", false);
        let communes = vec![a.clone(), b.clone(), c.clone(), d.clone()];

        let result = aggregate(
            &communes,
            &[
                matches(ZoneLevel::Zone1, &[&a]),
                matches(ZoneLevel::Zone2, &[&b]),
                matches(ZoneLevel::Zone3, &[]),
            ],
        );

        assert_eq!(result.len(), communes.len());
        assert_eq!(result.find(&a.key()).unwrap().zone, ZoneAssignment::Zone1);
        assert_eq!(result.find(&b.key()).unwrap().zone, ZoneAssignment::Zone2);
        assert_eq!(result.find(&c.key()).unwrap().zone, ZoneAssignment::Unclassified);
        assert_eq!(result.find(&d.key()).unwrap().zone, ZoneAssignment::Unclassified);
        assert_eq!(result.stats.missing_location, 1);
        assert_eq!(result.stats.cross_zone_overlaps, 0);
    }

    #[test]
    fn test_sorted_by_department_then_code() {
        let communes = vec![
            commune("Zeta", "74000", true),
            commune("Alpha", "42100", true),
            commune("Beta", "42000", true),
            commune("Gamma", "1000", true),
        ];
        let result = aggregate(&communes, &[]);

        let order: Vec<&str> = result.rows.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(order, vec!["Gamma", "Beta", "Alpha", "Zeta"]);
        assert_eq!(result.rows[0].department, "01");
    }

    #[test]
    fn test_higher_priority_wins_on_overlap() {
        let a = commune("Annecy", "74000", true);
        let result = aggregate(
            std::slice::from_ref(&a),
            &[
                matches(ZoneLevel::Zone3, &[&a]),
                matches(ZoneLevel::Zone1, &[&a]),
            ],
        );

        assert_eq!(result.len(), 1);
        assert_eq!(result.rows[0].zone, ZoneAssignment::Zone1);
        assert_eq!(result.stats.cross_zone_overlaps, 1);
    }

    #[test]
    fn test_duplicate_keys_are_kept() {
        let a = commune("Saint-Martin", "38000", true);
        let communes = vec![a.clone(), a.clone()];
        let result = aggregate(&communes, &[matches(ZoneLevel::Zone2, &[&a])]);

        assert_eq!(result.len(), 2);
        assert_eq!(result.count(ZoneAssignment::Zone2), 2);
        assert_eq!(result.stats.duplicate_keys, 1);
    }

    #[test]
    fn test_options_are_sorted_labels() {
        let communes = vec![commune("Lyon", "69001", true), commune("Ain", "1000", true)];
        let result = aggregate(&communes, &[]);
        assert_eq!(result.options(), vec!["Ain (01000)", "Lyon (69001)"]);
    }
}
