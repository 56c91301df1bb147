//! # Cross-Platform Abstractions
//!
//! Unified time primitives and defaults for web and desktop targets.

use std::time::Duration;

#[cfg(not(target_family = "wasm"))]
pub use std::time::Instant;
#[cfg(target_family = "wasm")]
pub use web_time::Instant;

#[cfg(not(target_family = "wasm"))]
use tokio::time::sleep as tokio_sleep;
#[cfg(target_family = "wasm")]
use wasmtimer::tokio::sleep as wasm_sleep;

/// Cross-platform time utilities
pub mod time {
    use super::*;
    use chrono::{DateTime, Utc};

    /// Wall-clock time used to resolve relative date ranges
    pub fn now() -> DateTime<Utc> {
        Utc::now()
    }

    /// Sleep for the specified duration
    pub async fn sleep(duration: Duration) {
        #[cfg(not(target_family = "wasm"))]
        tokio_sleep(duration).await;
        #[cfg(target_family = "wasm")]
        wasm_sleep(duration).await;
    }
}

/// Default timings and limits
pub mod config {
    use super::*;

    /// How long the refresh button shows its spinner after a manual refresh
    pub const DEFAULT_REFRESH_INDICATOR_DELAY: Duration = Duration::from_millis(1000);

    /// Delay before a `db` URL parameter is pushed into the database selector
    pub const DEFAULT_DATABASE_SELECTOR_DELAY: Duration = Duration::from_millis(100);

    /// Delay before a `chart` URL parameter focuses its chart
    pub const DEFAULT_CHART_FOCUS_DELAY: Duration = Duration::from_millis(200);

    /// Age after which a cached query is refetched on the next read
    pub const DEFAULT_STALE_TIME: Duration = Duration::from_secs(60);

    /// Default cache size limit
    pub const DEFAULT_MAX_CACHE_SIZE: usize = 1000;

    /// Default unused entry threshold
    pub const DEFAULT_UNUSED_THRESHOLD: Duration = Duration::from_secs(300);

    /// How often the report root bounds the cache
    pub const DEFAULT_MAINTENANCE_INTERVAL: Duration = Duration::from_secs(60);
}

pub use config::*;
pub use time::{now, sleep};
