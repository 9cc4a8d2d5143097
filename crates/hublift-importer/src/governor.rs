//! Rate-limit governor: throttling signals become whole-run reschedules.

use hublift_core::{FetchError, ImportSettings, RescheduleReason};
use std::time::Duration;
use tracing::warn;

/// Instruction to hand the remaining run back to the scheduler after `delay`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reschedule {
    pub delay: Duration,
    pub reason: RescheduleReason,
}

/// Converts typed fetch failures into reschedule instructions covering the
/// entire remaining driver run. Never touches dedup-cache or page-cursor
/// state: a rescheduled run resumes forward, it does not restart.
#[derive(Debug, Clone, Copy)]
pub struct RateLimitGovernor {
    rate_limit_delay: Duration,
    transient_delay: Duration,
}

impl RateLimitGovernor {
    pub fn new(settings: &ImportSettings) -> Self {
        Self {
            rate_limit_delay: settings.rate_limit_delay(),
            transient_delay: settings.transient_delay(),
        }
    }

    /// `None` means the failure is fatal and must propagate as an error.
    pub fn evaluate(&self, err: &FetchError) -> Option<Reschedule> {
        match err {
            FetchError::RateLimited { retry_after } => {
                let delay = retry_after.unwrap_or(self.rate_limit_delay);
                warn!("Platform rate limit hit, rescheduling run in {:?}", delay);
                Some(Reschedule {
                    delay,
                    reason: RescheduleReason::RateLimited,
                })
            }
            FetchError::Transient(details) => {
                warn!(
                    "Transient fetch failure ({}), rescheduling run in {:?}",
                    details, self.transient_delay
                );
                Some(Reschedule {
                    delay: self.transient_delay,
                    reason: RescheduleReason::TransientFetch,
                })
            }
            FetchError::Fatal(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn governor() -> RateLimitGovernor {
        RateLimitGovernor::new(&ImportSettings::default())
    }

    #[test]
    fn rate_limited_uses_server_delay_when_given() {
        let reschedule = governor()
            .evaluate(&FetchError::RateLimited {
                retry_after: Some(Duration::from_secs(120)),
            })
            .unwrap();
        assert_eq!(reschedule.delay, Duration::from_secs(120));
        assert_eq!(reschedule.reason, RescheduleReason::RateLimited);
    }

    #[test]
    fn rate_limited_falls_back_to_default_delay() {
        let settings = ImportSettings::default();
        let reschedule = governor()
            .evaluate(&FetchError::RateLimited { retry_after: None })
            .unwrap();
        assert_eq!(reschedule.delay, settings.rate_limit_delay());
    }

    #[test]
    fn transient_failures_get_the_shorter_delay() {
        let settings = ImportSettings::default();
        let reschedule = governor()
            .evaluate(&FetchError::Transient("connection reset".to_string()))
            .unwrap();
        assert_eq!(reschedule.delay, settings.transient_delay());
        assert_eq!(reschedule.reason, RescheduleReason::TransientFetch);
        assert!(reschedule.delay < settings.rate_limit_delay());
    }

    #[test]
    fn fatal_failures_are_not_rescheduled() {
        assert!(governor()
            .evaluate(&FetchError::Fatal("bad credentials".to_string()))
            .is_none());
    }
}
