use std::collections::{BTreeMap, VecDeque};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::quote::QuoteId;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuditCategory {
    Catalog,
    Pricing,
    Quote,
    Bridge,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuditOutcome {
    Success,
    Degraded,
    Failed,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEvent {
    pub event_id: String,
    pub quote_id: Option<QuoteId>,
    pub event_type: String,
    pub category: AuditCategory,
    pub actor: String,
    pub outcome: AuditOutcome,
    pub metadata: BTreeMap<String, String>,
    pub occurred_at: DateTime<Utc>,
}

impl AuditEvent {
    pub fn new(
        quote_id: Option<QuoteId>,
        event_type: impl Into<String>,
        category: AuditCategory,
        actor: impl Into<String>,
        outcome: AuditOutcome,
    ) -> Self {
        Self {
            event_id: Uuid::new_v4().to_string(),
            quote_id,
            event_type: event_type.into(),
            category,
            actor: actor.into(),
            outcome,
            metadata: BTreeMap::new(),
            occurred_at: Utc::now(),
        }
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

pub trait AuditSink: Send + Sync {
    fn emit(&self, event: AuditEvent);
}

#[derive(Clone, Copy, Debug, Default)]
pub struct NoopAuditSink;

impl AuditSink for NoopAuditSink {
    fn emit(&self, _event: AuditEvent) {}
}

/// Keeps the most recent events in memory. Unbounded unless built with
/// [`InMemoryAuditSink::with_capacity`].
#[derive(Clone, Default)]
pub struct InMemoryAuditSink {
    events: Arc<Mutex<VecDeque<AuditEvent>>>,
    capacity: Option<usize>,
}

impl InMemoryAuditSink {
    pub fn with_capacity(capacity: usize) -> Self {
        Self { events: Arc::default(), capacity: Some(capacity.max(1)) }
    }

    pub fn events(&self) -> Vec<AuditEvent> {
        match self.events.lock() {
            Ok(events) => events.iter().cloned().collect(),
            Err(poisoned) => poisoned.into_inner().iter().cloned().collect(),
        }
    }

    pub fn events_of_type(&self, event_type: &str) -> Vec<AuditEvent> {
        self.events().into_iter().filter(|event| event.event_type == event_type).collect()
    }
}

impl AuditSink for InMemoryAuditSink {
    fn emit(&self, event: AuditEvent) {
        let mut events = match self.events.lock() {
            Ok(events) => events,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Some(capacity) = self.capacity {
            while events.len() >= capacity {
                events.pop_front();
            }
        }
        events.push_back(event);
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        audit::{AuditCategory, AuditEvent, AuditOutcome, AuditSink, InMemoryAuditSink},
        domain::quote::QuoteId,
    };

    #[test]
    fn in_memory_sink_records_events_with_metadata() {
        let sink = InMemoryAuditSink::default();
        sink.emit(
            AuditEvent::new(
                Some(QuoteId(42)),
                "bridge.failed",
                AuditCategory::Bridge,
                "quote-crm-bridge",
                AuditOutcome::Failed,
            )
            .with_metadata("stage", "proposal"),
        );

        let events = sink.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].quote_id, Some(QuoteId(42)));
        assert_eq!(events[0].metadata.get("stage").map(String::as_str), Some("proposal"));
        assert_eq!(sink.events_of_type("bridge.failed").len(), 1);
    }

    #[test]
    fn bounded_sink_drops_oldest_events() {
        let sink = InMemoryAuditSink::with_capacity(2);
        for id in 1..=3 {
            sink.emit(AuditEvent::new(
                Some(QuoteId(id)),
                "quote.created",
                AuditCategory::Quote,
                "quote-lifecycle",
                AuditOutcome::Success,
            ));
        }

        let ids = sink.events().into_iter().filter_map(|event| event.quote_id).collect::<Vec<_>>();
        assert_eq!(ids, vec![QuoteId(2), QuoteId(3)]);
    }
}
