//! Rapport de classification avec dégradation gracieuse
//!
//! Les anomalies de données (géométries écartées, communes sans position,
//! zones vides) ne bloquent pas le passage : elles sont comptées ici.

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Serialize;

use zonage::{PipelineOutput, ZoneAssignment, ZoneLevel};

/// Statut global du passage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RunStatus {
    /// Aucune anomalie
    Success,
    /// Classification complète, avec des anomalies de données
    Degraded,
}

/// Anomalie non bloquante
#[derive(Debug, Clone, Serialize)]
pub struct ReportWarning {
    /// Zone ou table concernée
    pub scope: String,
    pub message: String,
}

/// Statistiques par zone
#[derive(Debug, Clone, Default, Serialize)]
pub struct ZoneStats {
    /// Tolérance de simplification (degrés)
    pub tolerance: f64,
    pub features_read: usize,
    pub null_dropped: usize,
    pub non_polygon_dropped: usize,
    pub degenerate_dropped: usize,
    /// Polygones simples après normalisation
    pub polygons: usize,
    /// Polygones après résolution des priorités
    pub resolved_polygons: usize,
    /// Communes affectées à la zone
    pub communes: usize,
}

/// Rapport complet d'un passage
#[derive(Debug, Clone, Serialize)]
pub struct ClassificationReport {
    pub duration_secs: f64,
    pub status: RunStatus,

    /// Nombre de communes en entrée (= lignes exportées)
    pub communes_total: usize,
    /// Communes par libellé de zone, `Hors zone` compris
    pub by_label: BTreeMap<String, usize>,
    pub missing_location: usize,
    pub duplicate_keys: usize,
    pub cross_zone_overlaps: usize,

    /// Statistiques par zone (`Zone 1`, `Zone 2`, `Zone 3`)
    pub zones: BTreeMap<String, ZoneStats>,

    pub warnings: Vec<ReportWarning>,
}

impl Default for ClassificationReport {
    fn default() -> Self {
        Self {
            duration_secs: 0.0,
            status: RunStatus::Success,
            communes_total: 0,
            by_label: BTreeMap::new(),
            missing_location: 0,
            duplicate_keys: 0,
            cross_zone_overlaps: 0,
            zones: BTreeMap::new(),
            warnings: Vec::new(),
        }
    }
}

impl ClassificationReport {
    /// Construit le rapport à partir du résultat du pipeline
    pub fn from_output(output: &PipelineOutput) -> Self {
        let classification = &output.classification;
        let mut report = Self {
            communes_total: classification.len(),
            missing_location: classification.stats.missing_location,
            duplicate_keys: classification.stats.duplicate_keys,
            cross_zone_overlaps: classification.stats.cross_zone_overlaps,
            ..Default::default()
        };

        for assignment in ZoneAssignment::ALL {
            report
                .by_label
                .insert(assignment.label().to_string(), classification.count(assignment));
        }

        for level in ZoneLevel::ALL {
            let zone = output.zones.get(level);
            let resolved = output.resolved.get(level);
            report.zones.insert(
                level.label().to_string(),
                ZoneStats {
                    tolerance: zone.tolerance,
                    features_read: zone.stats.features_read,
                    null_dropped: zone.stats.null_dropped,
                    non_polygon_dropped: zone.stats.non_polygon_dropped,
                    degenerate_dropped: zone.stats.degenerate_dropped,
                    polygons: zone.stats.polygons_emitted,
                    resolved_polygons: resolved.geometry.0.len(),
                    communes: classification.count(level.into()),
                },
            );

            let dropped = zone.stats.null_dropped
                + zone.stats.non_polygon_dropped
                + zone.stats.degenerate_dropped;
            if dropped > 0 {
                report.record_warning(
                    level.label(),
                    format!("{} geometries dropped during normalization", dropped),
                );
            }
            if resolved.is_empty() {
                report.record_warning(level.label(), "resolved zone is empty");
            }
        }

        if report.missing_location > 0 {
            report.record_warning(
                "communes",
                format!(
                    "{} communes without valid coordinates (Hors zone)",
                    report.missing_location
                ),
            );
        }
        if report.duplicate_keys > 0 {
            report.record_warning(
                "communes",
                format!("{} rows share a name and postal code", report.duplicate_keys),
            );
        }
        if report.cross_zone_overlaps > 0 {
            report.record_warning(
                "communes",
                format!(
                    "{} communes matched by several zones (highest priority kept)",
                    report.cross_zone_overlaps
                ),
            );
        }

        report.set_duration(output.duration);
        report.finalize();
        report
    }

    /// Enregistre une anomalie
    pub fn record_warning(&mut self, scope: &str, message: impl Into<String>) {
        self.warnings.push(ReportWarning {
            scope: scope.to_string(),
            message: message.into(),
        });
    }

    pub fn set_duration(&mut self, duration: Duration) {
        self.duration_secs = duration.as_secs_f64();
    }

    /// Détermine le statut final
    pub fn finalize(&mut self) {
        self.status = if self.warnings.is_empty() {
            RunStatus::Success
        } else {
            RunStatus::Degraded
        };
    }

    /// Nombre de communes affectées à une zone
    pub fn classified_total(&self) -> usize {
        self.communes_total - self.count(ZoneAssignment::Unclassified)
    }

    pub fn count(&self, assignment: ZoneAssignment) -> usize {
        self.by_label.get(assignment.label()).copied().unwrap_or(0)
    }

    /// Affiche le rapport sur la console
    pub fn display(&self) {
        println!("\n{}", "=".repeat(60));
        println!("CLASSIFICATION REPORT");
        println!("{}", "=".repeat(60));

        println!("\nStatus: {:?}", self.status);
        println!("Duration: {:.2}s", self.duration_secs);

        println!("\n--- SUMMARY ---");
        println!("Communes: {} total, {} classified", self.communes_total, self.classified_total());
        for assignment in ZoneAssignment::ALL {
            println!("  {}: {}", assignment.label(), self.count(assignment));
        }

        println!("\n--- BY ZONE ---");
        for (label, stats) in &self.zones {
            println!(
                "  {}: tolerance {}, {} features, {} polygons, {} after precedence",
                label, stats.tolerance, stats.features_read, stats.polygons, stats.resolved_polygons
            );
        }

        if !self.warnings.is_empty() {
            println!("\n--- WARNINGS ({}) ---", self.warnings.len());
            for w in self.warnings.iter().take(10) {
                println!("  [{}] {}", w.scope, w.message);
            }
            if self.warnings.len() > 10 {
                println!("  ... and {} more", self.warnings.len() - 10);
            }
        }

        println!("\n{}", "=".repeat(60));
    }

    /// Sauvegarde le rapport en JSON
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)
            .context(format!("Failed to write report: {}", path.display()))?;
        Ok(())
    }

    /// Affichage compact pour le résumé
    pub fn summary(&self) -> String {
        format!(
            "{} communes: {} Zone 1, {} Zone 2, {} Zone 3, {} Hors zone",
            self.communes_total,
            self.count(ZoneAssignment::Zone1),
            self.count(ZoneAssignment::Zone2),
            self.count(ZoneAssignment::Zone3),
            self.count(ZoneAssignment::Unclassified)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_default() {
        let report = ClassificationReport::default();
        assert_eq!(report.status, RunStatus::Success);
        assert_eq!(report.communes_total, 0);
        assert_eq!(report.classified_total(), 0);
    }

    #[test]
    fn test_finalize_degraded() {
        let mut report = ClassificationReport::default();
        report.record_warning("Zone 3", "resolved zone is empty");
        report.finalize();
        assert_eq!(report.status, RunStatus::Degraded);
    }

    #[test]
    fn test_summary_and_totals() {
        let mut report = ClassificationReport {
            communes_total: 10,
            ..Default::default()
        };
        report.by_label.insert("Zone 1".to_string(), 2);
        report.by_label.insert("Zone 2".to_string(), 3);
        report.by_label.insert("Hors zone".to_string(), 5);

        assert_eq!(report.classified_total(), 5);
        let summary = report.summary();
        assert!(summary.contains("10 communes"));
        assert!(summary.contains("0 Zone 3"));
        assert!(summary.contains("5 Hors zone"));
    }

    #[test]
    fn test_save_to_file() {
        let report = ClassificationReport::default();
        let path = std::env::temp_dir().join(format!("zonage_report_{}.json", std::process::id()));

        report.save_to_file(&path).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("\"status\": \"Success\""));

        std::fs::remove_file(path).ok();
    }
}
