use chrono::{DateTime, Utc};

use crate::event::AgentStatus;

pub mod fetcher;
pub mod stringifier;

pub use fetcher::WeatherFetcher;
pub use stringifier::WeatherStringifier;

/// Fallback liveness window when no period is configured.
pub const DEFAULT_EXPECTED_UPDATE_PERIOD_DAYS: i64 = 10;

/// Common surface of the two agents: a liveness signal derived from the
/// host-tracked event/error history. An agent is healthy iff it produced an
/// event within its expected period and no error was logged since.
pub trait Agent {
    fn expected_update_period_days(&self) -> i64 {
        DEFAULT_EXPECTED_UPDATE_PERIOD_DAYS
    }

    fn is_working(&self, status: &AgentStatus, now: DateTime<Utc>) -> bool {
        status.event_within_days(self.expected_update_period_days(), now)
            && !status.recent_errors()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    struct DefaultPeriodAgent;
    impl Agent for DefaultPeriodAgent {}

    #[test]
    fn agent_without_events_is_not_working() {
        let now = Utc::now();
        assert!(!DefaultPeriodAgent.is_working(&AgentStatus::default(), now));
    }

    #[test]
    fn fresh_event_makes_the_agent_healthy() {
        let now = Utc::now();
        let mut status = AgentStatus::default();
        status.record_event(now - Duration::days(1));
        assert!(DefaultPeriodAgent.is_working(&status, now));
    }

    #[test]
    fn liveness_degrades_once_the_period_elapses() {
        let now = Utc::now();
        let mut status = AgentStatus::default();
        status.record_event(now - Duration::days(11));
        assert!(!DefaultPeriodAgent.is_working(&status, now));
    }

    #[test]
    fn an_error_after_the_last_event_marks_the_agent_unhealthy() {
        let now = Utc::now();
        let mut status = AgentStatus::default();
        status.record_event(now - Duration::hours(2));
        status.record_error(now - Duration::hours(1));
        assert!(!DefaultPeriodAgent.is_working(&status, now));
    }
}
