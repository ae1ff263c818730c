//! Leaderboard aggregation across every stored profile.

use std::sync::Arc;

use crate::interaction::InteractionGate;
use crate::logging::{LogSink, Severity};
use crate::persistence::{ProfileCodec, ProfileStore, ProgressData, Score};

/// Builds per-level leaderboards from independently loaded profile copies.
#[derive(Clone)]
pub struct ScoreAggregator {
    store: ProfileStore,
    codec: ProfileCodec,
    gate: InteractionGate,
    sink: Arc<dyn LogSink>,
}

impl ScoreAggregator {
    pub fn new(
        store: ProfileStore,
        codec: ProfileCodec,
        gate: InteractionGate,
        sink: Arc<dyn LogSink>,
    ) -> Self {
        Self {
            store,
            codec,
            gate,
            sink,
        }
    }

    /// Scores for `level_id` from every readable profile, ordered by best
    /// time, highest first.
    ///
    /// Profiles that fail to read or decode are skipped. Ties keep profile
    /// name order.
    pub async fn ranked_scores(&self, level_id: i32) -> Vec<Score> {
        let profiles = self.load_all_profiles().await;
        if profiles.is_empty() {
            self.sink
                .send("Could not get all profiles", Severity::Error);
            return Vec::new();
        }

        let mut scores: Vec<Score> = profiles
            .iter()
            .flat_map(|profile| {
                profile
                    .progress_metrics
                    .iter()
                    .filter(move |metric| metric.level_id == level_id)
                    .map(move |metric| Score::from_metric(&profile.profile_name, metric))
            })
            .collect();

        scores.sort_by(|a, b| b.best_time.total_cmp(&a.best_time));
        scores
    }

    /// Read one profile without making it active anywhere.
    pub fn load_profile(&self, profile_name: &str) -> Option<ProgressData> {
        let text = self.store.read_profile_text(profile_name)?;
        self.codec.from_stored(&text)
    }

    /// Decode every profile in the data directory.
    pub async fn load_all_profiles(&self) -> Vec<ProgressData> {
        if !self.gate.is_open() {
            self.sink.send(
                "Waiting for user interaction before file access",
                Severity::Warning,
            );
            self.gate.wait().await;
        }

        self.store
            .list_profile_names()
            .iter()
            .filter_map(|name| self.load_profile(name))
            .collect()
    }
}
