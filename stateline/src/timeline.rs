//! Orchestration of diffing, key-state extraction, and enrichment into one
//! ordered timeline per test run.

use std::sync::Arc;

use crate::config::EngineConfig;
use crate::diff::{compute_diff, extract_changes};
use crate::enrich::{EnrichOptions, Enricher};
use crate::errors::{EngineError, EngineResult};
use crate::key_state::extract_key_state;
use crate::types::{Snapshot, Timeline, TimelineEntry};

/// Builds a timeline from raw snapshots using a fixed set of enrichers.
pub struct TimelineBuilder {
    config: EngineConfig,
    enrichers: Vec<Arc<dyn Enricher>>,
}

impl TimelineBuilder {
    pub fn new(config: EngineConfig, enrichers: Vec<Arc<dyn Enricher>>) -> Self {
        Self { config, enrichers }
    }

    /// Build one timeline from an ordered snapshot sequence.
    ///
    /// Empty input yields an empty timeline, never an error. Enrichers run
    /// per snapshot in registration order; colliding field names silently
    /// overwrite earlier values. A failing enricher aborts the whole build;
    /// there is no per-enricher isolation.
    pub fn build(&self, snapshots: &[Snapshot], test_name: &str) -> EngineResult<Timeline> {
        let mut entries = Vec::with_capacity(snapshots.len());
        let mut previous: Option<&Snapshot> = None;

        for (index, snapshot) in snapshots.iter().enumerate() {
            let sequence = index + 1;
            let diff = compute_diff(&snapshot.state, previous.map(|prev| &prev.state));
            let changes = diff.as_ref().map(extract_changes);
            let duration_since_previous_ms =
                previous.map(|prev| (snapshot.timestamp - prev.timestamp).num_milliseconds());

            let opts = EnrichOptions::new(snapshot.timestamp, self.config.staleness_threshold());
            let mut enrichments = crate::types::State::new();
            for enricher in &self.enrichers {
                let fields = enricher.enrich(&snapshot.state, &opts).map_err(|source| {
                    EngineError::Enricher {
                        name: enricher.name().to_string(),
                        sequence,
                        message: source.to_string(),
                    }
                })?;
                // Later enrichers win on collision.
                enrichments.extend(fields);
            }

            entries.push(TimelineEntry {
                sequence,
                event: snapshot.event.clone(),
                timestamp: snapshot.timestamp,
                key_state: extract_key_state(&snapshot.state, &self.config.highlight_fields),
                changes,
                duration_since_previous_ms,
                enrichments,
            });
            previous = Some(snapshot);
        }

        let duration_ms = match (snapshots.first(), snapshots.last()) {
            (Some(first), Some(last)) if snapshots.len() > 1 => {
                (last.timestamp - first.timestamp).num_milliseconds()
            }
            _ => 0,
        };

        log::debug!(
            "built timeline '{}' with {} entries over {}ms",
            test_name,
            entries.len(),
            duration_ms
        );
        Ok(Timeline {
            test: test_name.to_string(),
            duration_ms,
            entries,
        })
    }
}
