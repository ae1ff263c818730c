//! Persistence data types.
//!
//! # Data Model Overview
//!
//! One JSON document per profile:
//!
//! ```json
//! {
//!   "profileName": "Ada",
//!   "progressMetrics": [
//!     { "levelId": 1, "bestTime": 31.5, "lastTime": 40.25 }
//!   ]
//! }
//! ```
//!
//! Times are "lower is better": `bestTime` is a running minimum and
//! `lastTime` is whatever was submitted most recently.

use serde::{Deserialize, Serialize};

// ============================================================================
// Profile Types
// ============================================================================

/// A named player progress record, persisted as a whole.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressData {
    /// Unique identifier and file-naming key. Never changes after creation.
    pub profile_name: String,

    /// Per-level metrics. Each `level_id` appears at most once.
    #[serde(default)]
    pub progress_metrics: Vec<ProgressMetric>,
}

/// Best and most recent time for one level.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressMetric {
    pub level_id: i32,
    pub best_time: f64,
    pub last_time: f64,
}

impl ProgressData {
    /// A fresh profile with no recorded levels.
    pub fn new(profile_name: impl Into<String>) -> Self {
        Self {
            profile_name: profile_name.into(),
            progress_metrics: Vec::new(),
        }
    }

    /// Find the metric for a level.
    pub fn metric(&self, level_id: i32) -> Option<&ProgressMetric> {
        self.progress_metrics.iter().find(|m| m.level_id == level_id)
    }

    /// Record a submitted time for a level and return the updated metric.
    ///
    /// Inserts a new metric on first submission; otherwise overwrites
    /// `last_time` and lowers `best_time` if `time` beats it.
    pub fn record_time(&mut self, level_id: i32, time: f64) -> ProgressMetric {
        match self
            .progress_metrics
            .iter_mut()
            .find(|m| m.level_id == level_id)
        {
            Some(metric) => {
                metric.last_time = time;
                if metric.best_time > time {
                    metric.best_time = time;
                }
                *metric
            }
            None => {
                let metric = ProgressMetric {
                    level_id,
                    best_time: time,
                    last_time: time,
                };
                self.progress_metrics.push(metric);
                metric
            }
        }
    }
}

// ============================================================================
// Leaderboard Types
// ============================================================================

/// One leaderboard row. Produced by aggregation only, never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Score {
    pub player_name: String,
    pub last_time: f64,
    pub best_time: f64,
}

impl Score {
    pub fn from_metric(player_name: &str, metric: &ProgressMetric) -> Self {
        Self {
            player_name: player_name.to_string(),
            last_time: metric.last_time,
            best_time: metric.best_time,
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
