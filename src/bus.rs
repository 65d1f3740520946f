//! Outbound side of the host event bus.

#[cfg(any(test, feature = "testing"))]
use portable_atomic_util::Arc;
use serde::Serialize;
use serde_json::Value;
#[cfg(any(test, feature = "testing"))]
use spin::Mutex;

use crate::element::{Dataset, ViewId};
use crate::error::HookError;

pub const INTERACTION_EVENT: &str = "tucan-interaction";
pub const VISIBILITY_CHANGE_EVENT: &str = "tucan-visibility-change";

/// Payload of [`INTERACTION_EVENT`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct InteractionPayload {
    #[serde(rename = "type")]
    pub kind: String,
    pub data: Dataset,
}

/// Payload of [`VISIBILITY_CHANGE_EVENT`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct VisibilityPayload {
    pub id: ViewId,
    pub visible: bool,
}

/// An event pushed from a hook to the server. Fire-and-forget.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OutboundEvent {
    Interaction(InteractionPayload),
    VisibilityChange(VisibilityPayload),
}

impl OutboundEvent {
    pub fn data_point_click(data: Dataset) -> Self {
        Self::Interaction(InteractionPayload {
            kind: "data-point-click".to_owned(),
            data,
        })
    }

    pub fn became_visible(id: ViewId) -> Self {
        Self::VisibilityChange(VisibilityPayload { id, visible: true })
    }

    /// Event name on the host bus.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Interaction(_) => INTERACTION_EVENT,
            Self::VisibilityChange(_) => VISIBILITY_CHANGE_EVENT,
        }
    }

    /// JSON payload on the host bus.
    pub fn payload(&self) -> Value {
        let payload = match self {
            Self::Interaction(payload) => serde_json::to_value(payload),
            Self::VisibilityChange(payload) => serde_json::to_value(payload),
        };
        // Both payloads are plain string/bool maps.
        payload.unwrap_or(Value::Null)
    }
}

/// The host's end of the bus.
///
/// Implement this over the socket that carries events back to the server.
pub trait HostBus {
    /// Push an event to the server.
    fn push_event(&self, event: OutboundEvent);

    /// The host error channel. Receives errors the runtime does not recover.
    fn report_error(&self, view: &ViewId, error: &HookError);
}

#[cfg(any(test, feature = "testing"))]
/// Test bus that captures everything pushed through it.
///
/// Only available with the `testing` feature.
///
/// # Example
///
/// ```rust
/// use oxide_hooks::{Dataset, HostBus, OutboundEvent, TestHostBus};
///
/// let bus = TestHostBus::new();
/// let boxed = bus.boxed();
///
/// boxed.push_event(OutboundEvent::data_point_click(Dataset::new()));
///
/// assert_eq!(bus.events().len(), 1);
/// assert!(bus.errors().is_empty());
/// ```
#[derive(Clone)]
pub struct TestHostBus {
    events: Arc<Mutex<Vec<OutboundEvent>>>,
    errors: Arc<Mutex<Vec<(ViewId, String)>>>,
}

#[cfg(any(test, feature = "testing"))]
impl Default for TestHostBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(any(test, feature = "testing"))]
impl TestHostBus {
    pub fn new() -> Self {
        Self {
            events: Arc::new(Mutex::new(Vec::new())),
            errors: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// A boxed handle sharing this bus's capture storage.
    pub fn boxed(&self) -> Box<dyn HostBus> {
        Box::new(self.clone())
    }

    /// Events pushed so far, oldest first.
    pub fn events(&self) -> Vec<OutboundEvent> {
        self.events.lock().clone()
    }

    /// Events pushed under `name`.
    pub fn events_named(&self, name: &str) -> Vec<OutboundEvent> {
        self.events
            .lock()
            .iter()
            .filter(|event| event.name() == name)
            .cloned()
            .collect()
    }

    /// Reported errors as `(view, rendered message)` pairs.
    pub fn errors(&self) -> Vec<(ViewId, String)> {
        self.errors.lock().clone()
    }
}

#[cfg(any(test, feature = "testing"))]
impl HostBus for TestHostBus {
    fn push_event(&self, event: OutboundEvent) {
        self.events.lock().push(event);
    }

    fn report_error(&self, view: &ViewId, error: &HookError) {
        self.errors.lock().push((view.clone(), error.to_string()));
    }
}
