//! Subscription plan tiers and the data retention they grant

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Organization subscription level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlanTier {
    Free,
    Pro,
    Team,
    Enterprise,
}

impl PlanTier {
    /// How far back report data is kept for this tier
    pub fn retention(&self) -> Duration {
        match self {
            PlanTier::Free => Duration::days(1),
            PlanTier::Pro => Duration::days(7),
            PlanTier::Team => Duration::days(28),
            PlanTier::Enterprise => Duration::days(90),
        }
    }

    pub fn is_restricted(&self) -> bool {
        matches!(self, PlanTier::Free)
    }

    /// Whether a range requested to start at `start` reaches further back than this
    /// tier retains data. `start` is the requested bound, not the bucket-aligned one.
    pub fn exceeds_retention(&self, start: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        start < now - self.retention()
    }
}
