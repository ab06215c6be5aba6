// /////////////////////////////////////////////////////////////////////////////
// Streamy
// Copyright (c) 2026 Streamy Contributors
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Structured domain events emitted by the façade: one event per
//! pipeline-lifecycle transition, published through an injected
//! `EventPublisher` so callers can wire logging, metrics, or nothing at all.

use serde_json::Value;
use std::collections::HashMap;

/// A single structured event. `correlation_id` ties every event from one
/// verify/apply call together for log and event stitching.
#[derive(Debug, Clone)]
pub struct DomainEvent {
    pub event_type: &'static str,
    pub correlation_id: String,
    pub payload: HashMap<String, Value>,
}

impl DomainEvent {
    pub fn new(event_type: &'static str, correlation_id: impl Into<String>) -> Self {
        Self {
            event_type,
            correlation_id: correlation_id.into(),
            payload: HashMap::new(),
        }
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.payload.insert(key.into(), value.into());
        self
    }
}

/// Sink for domain events. Must be safe to invoke concurrently from worker
/// tasks; implementations that need ordering should buffer internally.
pub trait EventPublisher: Send + Sync {
    fn publish(&self, event: DomainEvent);
}

/// Publisher that drops every event, used where no sink is configured.
pub struct NullEventPublisher;

impl EventPublisher for NullEventPublisher {
    fn publish(&self, _event: DomainEvent) {}
}

/// Publisher that records events in memory, used by tests to assert on the
/// event sequence emitted by a call.
#[derive(Default)]
pub struct RecordingEventPublisher {
    events: parking_lot::Mutex<Vec<DomainEvent>>,
}

impl RecordingEventPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<DomainEvent> {
        self.events.lock().clone()
    }
}

impl EventPublisher for RecordingEventPublisher {
    fn publish(&self, event: DomainEvent) {
        self.events.lock().push(event);
    }
}
