use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One event on the host's bus. Agents only ever read or produce the
/// payload; the timestamp is what liveness reporting keys off.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub payload: Value,
    pub created_at: DateTime<Utc>,
}

impl Event {
    pub fn new(payload: Value) -> Self {
        Self {
            payload,
            created_at: Utc::now(),
        }
    }
}

/// Where agents hand their outgoing payloads. Delivery, persistence and
/// retry all belong to the host; agents never see past the sink.
#[async_trait]
pub trait EventSink: Send {
    async fn emit(&mut self, payload: Value) -> anyhow::Result<()>;
}

/// In-memory sink used by the CLI and by tests.
#[derive(Debug, Default)]
pub struct EventBuffer {
    pub events: Vec<Event>,
}

#[async_trait]
impl EventSink for EventBuffer {
    async fn emit(&mut self, payload: Value) -> anyhow::Result<()> {
        self.events.push(Event::new(payload));
        Ok(())
    }
}

/// Host-tracked history for one configured agent instance: when it last
/// produced an event and when an error was last logged for it.
#[derive(Debug, Clone, Copy, Default)]
pub struct AgentStatus {
    pub last_event_at: Option<DateTime<Utc>>,
    pub last_error_at: Option<DateTime<Utc>>,
}

impl AgentStatus {
    pub fn record_event(&mut self, at: DateTime<Utc>) {
        self.last_event_at = Some(at);
    }

    pub fn record_error(&mut self, at: DateTime<Utc>) {
        self.last_error_at = Some(at);
    }

    pub fn event_within_days(&self, days: i64, now: DateTime<Utc>) -> bool {
        self.last_event_at
            .is_some_and(|at| now - at <= Duration::days(days))
    }

    /// True iff an error was logged after the most recent event.
    pub fn recent_errors(&self) -> bool {
        match (self.last_error_at, self.last_event_at) {
            (Some(error_at), Some(event_at)) => error_at > event_at,
            (Some(_), None) => true,
            (None, _) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn buffer_collects_emitted_payloads() {
        let mut buffer = EventBuffer::default();
        buffer.emit(json!({"a": 1})).await.unwrap();
        buffer.emit(json!({"b": 2})).await.unwrap();

        assert_eq!(buffer.events.len(), 2);
        assert_eq!(buffer.events[0].payload, json!({"a": 1}));
    }

    #[test]
    fn event_freshness_is_bounded_by_days() {
        let now = Utc::now();
        let mut status = AgentStatus::default();
        assert!(!status.event_within_days(10, now));

        status.record_event(now - Duration::days(3));
        assert!(status.event_within_days(10, now));
        assert!(!status.event_within_days(2, now));
    }

    #[test]
    fn errors_after_the_last_event_count_as_recent() {
        let now = Utc::now();
        let mut status = AgentStatus::default();
        assert!(!status.recent_errors());

        status.record_error(now);
        assert!(status.recent_errors());

        status.record_event(now + Duration::seconds(1));
        assert!(!status.recent_errors());
    }
}
