//! Configuration for import runs

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Tuning knobs for a project import.
///
/// Carried by value inside the run context; never read from ambient globals.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportSettings {
    /// Objects requested per page from the platform API.
    pub page_size: u64,
    /// Pages processed before a run suspends and reschedules itself. This is
    /// the step budget that keeps a single invocation bounded.
    pub max_pages_per_run: u32,
    /// Fallback delay when the platform rate-limits us without a
    /// `retry_after` hint.
    pub rate_limit_delay_secs: u64,
    /// Delay before retrying after a transient fetch failure.
    pub transient_delay_secs: u64,
    /// Attempts the task layer makes per import job before marking it failed.
    pub max_task_attempts: u32,
    /// TTL applied to dedup-cache and page-cursor keys so abandoned runs do
    /// not leak state forever.
    pub state_ttl_secs: u64,
    /// Local user substituted for authors that cannot be resolved to a local
    /// identity.
    pub fallback_user_id: i64,
}

impl Default for ImportSettings {
    fn default() -> Self {
        Self {
            page_size: 100,
            max_pages_per_run: 50,
            rate_limit_delay_secs: 900,
            transient_delay_secs: 15,
            max_task_attempts: 3,
            state_ttl_secs: 24 * 60 * 60,
            fallback_user_id: 1,
        }
    }
}

impl ImportSettings {
    pub fn rate_limit_delay(&self) -> Duration {
        Duration::from_secs(self.rate_limit_delay_secs)
    }

    pub fn transient_delay(&self) -> Duration {
        Duration::from_secs(self.transient_delay_secs)
    }

    pub fn state_ttl(&self) -> Duration {
        Duration::from_secs(self.state_ttl_secs)
    }
}
