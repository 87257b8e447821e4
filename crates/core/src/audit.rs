//! Append-only trail of what a wizard session did and why.
//!
//! Every state transition, lookup round-trip, and submission attempt
//! is recorded against the session that performed it, so a desk
//! supervisor can reconstruct how an interaction was captured.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditCategory {
    /// Step navigation and type selection.
    Flow,
    /// Customer, contact, site, and equipment lookups.
    Lookup,
    /// Server-derived accessory recalculation.
    Derivation,
    /// Final payload submission.
    Submission,
    /// Session lifecycle and everything else.
    System,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditOutcome {
    Success,
    /// The wizard refused the action locally.
    Rejected,
    /// The backend call failed.
    Failed,
    /// A response arrived for a request that no longer matches the
    /// wizard's state and was thrown away.
    Discarded,
}

/// Identity attached to every event a session emits.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuditContext {
    pub session_id: String,
    pub correlation_id: String,
    pub actor: String,
}

impl AuditContext {
    pub fn new(actor: impl Into<String>) -> Self {
        Self::with_correlation(Uuid::new_v4().to_string(), actor)
    }

    /// Ties the trail to a request id issued elsewhere, so the events
    /// can be joined against the front end's own logs.
    pub fn with_correlation(correlation_id: impl Into<String>, actor: impl Into<String>) -> Self {
        Self {
            session_id: Uuid::new_v4().to_string(),
            correlation_id: correlation_id.into(),
            actor: actor.into(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEvent {
    pub event_id: Uuid,
    pub session_id: String,
    pub correlation_id: String,
    pub actor: String,
    pub category: AuditCategory,
    pub event_type: String,
    pub outcome: AuditOutcome,
    pub metadata: BTreeMap<String, String>,
    pub occurred_at: DateTime<Utc>,
}

impl AuditEvent {
    pub fn new(
        context: &AuditContext,
        category: AuditCategory,
        event_type: impl Into<String>,
        outcome: AuditOutcome,
    ) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            session_id: context.session_id.clone(),
            correlation_id: context.correlation_id.clone(),
            actor: context.actor.clone(),
            category,
            event_type: event_type.into(),
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
    fn record(&self, event: AuditEvent);
}

/// Sink that keeps events in memory, for tests and for the smoke
/// harness to assert against.
#[derive(Clone, Default)]
pub struct InMemoryAuditSink {
    events: Arc<Mutex<Vec<AuditEvent>>>,
}

impl InMemoryAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<AuditEvent> {
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

impl AuditSink for InMemoryAuditSink {
    fn record(&self, event: AuditEvent) {
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(event);
    }
}

/// Sink that drops everything, for callers that do not keep a trail.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopAuditSink;

impl AuditSink for NoopAuditSink {
    fn record(&self, _event: AuditEvent) {}
}
