//! Contexte d'exécution du pipeline de classification
//!
//! Toutes les données d'un passage sont portées explicitement par
//! `Pipeline` ; aucune étape ne lit d'état global.

use std::time::{Duration, Instant};

use tracing::info;

use crate::aggregate::aggregate;
use crate::classify::classify;
use crate::precedence::{resolve, ResolvedZones, ZoneSet};
use crate::types::{Classification, Commune, ZoneMatches};

/// Entrées d'un passage : zones normalisées et communes chargées
#[derive(Debug, Clone)]
pub struct Pipeline {
    pub zones: ZoneSet,
    pub communes: Vec<Commune>,
}

/// Résultat immuable d'un passage
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub zones: ZoneSet,
    pub resolved: ResolvedZones,
    pub matches: Vec<ZoneMatches>,
    pub classification: Classification,
    pub duration: Duration,
}

impl Pipeline {
    pub fn new(zones: ZoneSet, communes: Vec<Commune>) -> Self {
        Self { zones, communes }
    }

    /// Résout les priorités, joint puis agrège
    pub fn run(self) -> PipelineOutput {
        let start = Instant::now();

        let resolved = resolve(&self.zones);
        let matches = classify(&self.communes, &resolved);
        let classification = aggregate(&self.communes, &matches);

        let duration = start.elapsed();
        info!(
            communes = classification.len(),
            duration_ms = duration.as_millis() as u64,
            "Pipeline done"
        );

        PipelineOutput {
            zones: self.zones,
            resolved,
            matches,
            classification,
            duration,
        }
    }
}
