//! `[watch]` section configuration.

use super::defaults;
use educe::Educe;
use serde::{Deserialize, Serialize};

/// `[watch]` section in postwatch.toml - live synchronization settings.
///
/// # Example
/// ```toml
/// [watch]
/// enable = true
/// reconcile_secs = 300   # full rescan every 5 minutes, 0 = never
/// ```
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct WatchConfig {
    /// Follow filesystem events after the initial scan.
    #[serde(default = "defaults::r#true")]
    #[educe(Default = true)]
    pub enable: bool,

    /// Interval between full rescans of the posts directory.
    #[serde(default = "defaults::watch::reconcile_secs")]
    #[educe(Default = defaults::watch::reconcile_secs())]
    pub reconcile_secs: u64,
}
