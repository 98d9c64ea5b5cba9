//! Lifecycle event envelope.
//!
//! Events are immutable once constructed and exist only to be published;
//! nothing in this subsystem persists them. The serialized envelope is a
//! stable external interface:
//!
//! ```json
//! {
//!   "event_type": "action_complete",
//!   "schema_version": 1,
//!   "timestamp": "2026-08-07T12:00:00Z",
//!   "payload": {
//!     "integration_id": "acme",
//!     "action_id": "pull_data",
//!     "config_data": {"interval_minutes": 15},
//!     "result": {"records": 120}
//!   }
//! }
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use junction_core::{ActionId, IntegrationId};

/// Version of the serialized envelope.
pub const SCHEMA_VERSION: u32 = 1;

/// Discriminant of a lifecycle event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    /// An action handler is about to run.
    ActionStarted,
    /// An action handler returned successfully.
    ActionComplete,
    /// An action handler failed.
    ActionFailed,
    /// A webhook handler is about to run.
    WebhookStarted,
    /// A webhook handler returned successfully.
    WebhookComplete,
    /// A webhook handler failed.
    WebhookFailed,
    /// Handler-authored progress log.
    CustomLog,
}

/// Event payload: the subject and a snapshot of the configuration in effect.
///
/// Exactly one of `action_id` / `webhook_id` is set, matching the event
/// type. `result` is present on Complete (and CustomLog detail rides it);
/// `error` is present on Failed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventPayload {
    /// The integration this execution belongs to.
    pub integration_id: IntegrationId,
    /// Set for action events.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action_id: Option<ActionId>,
    /// Set for webhook events.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub webhook_id: Option<String>,
    /// Snapshot of the configuration in effect for this execution.
    pub config_data: Value,
    /// Handler result (Complete) or custom log detail (CustomLog).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    /// Error string (Failed).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// One structured lifecycle event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemEvent {
    /// Event discriminant.
    pub event_type: EventType,
    /// Envelope schema version.
    pub schema_version: u32,
    /// When the event was constructed.
    pub timestamp: DateTime<Utc>,
    /// Subject and data.
    pub payload: EventPayload,
}

impl SystemEvent {
    fn new(event_type: EventType, payload: EventPayload) -> Self {
        Self {
            event_type,
            schema_version: SCHEMA_VERSION,
            timestamp: Utc::now(),
            payload,
        }
    }

    fn action_payload(
        integration_id: IntegrationId,
        action_id: ActionId,
        config_data: Value,
    ) -> EventPayload {
        EventPayload {
            integration_id,
            action_id: Some(action_id),
            webhook_id: None,
            config_data,
            result: None,
            error: None,
        }
    }

    fn webhook_payload(
        integration_id: IntegrationId,
        webhook_id: String,
        config_data: Value,
    ) -> EventPayload {
        EventPayload {
            integration_id,
            action_id: None,
            webhook_id: Some(webhook_id),
            config_data,
            result: None,
            error: None,
        }
    }

    /// An action handler is about to run.
    pub fn action_started(
        integration_id: IntegrationId,
        action_id: ActionId,
        config_data: Value,
    ) -> Self {
        Self::new(
            EventType::ActionStarted,
            Self::action_payload(integration_id, action_id, config_data),
        )
    }

    /// An action handler returned `result`.
    pub fn action_complete(
        integration_id: IntegrationId,
        action_id: ActionId,
        config_data: Value,
        result: Value,
    ) -> Self {
        let mut payload = Self::action_payload(integration_id, action_id, config_data);
        payload.result = Some(result);
        Self::new(EventType::ActionComplete, payload)
    }

    /// An action handler failed with `error`.
    pub fn action_failed(
        integration_id: IntegrationId,
        action_id: ActionId,
        config_data: Value,
        error: impl Into<String>,
    ) -> Self {
        let mut payload = Self::action_payload(integration_id, action_id, config_data);
        payload.error = Some(error.into());
        Self::new(EventType::ActionFailed, payload)
    }

    /// A webhook handler is about to run.
    pub fn webhook_started(
        integration_id: IntegrationId,
        webhook_id: impl Into<String>,
        config_data: Value,
    ) -> Self {
        Self::new(
            EventType::WebhookStarted,
            Self::webhook_payload(integration_id, webhook_id.into(), config_data),
        )
    }

    /// A webhook handler returned `result`.
    pub fn webhook_complete(
        integration_id: IntegrationId,
        webhook_id: impl Into<String>,
        config_data: Value,
        result: Value,
    ) -> Self {
        let mut payload = Self::webhook_payload(integration_id, webhook_id.into(), config_data);
        payload.result = Some(result);
        Self::new(EventType::WebhookComplete, payload)
    }

    /// A webhook handler failed with `error`.
    pub fn webhook_failed(
        integration_id: IntegrationId,
        webhook_id: impl Into<String>,
        config_data: Value,
        error: impl Into<String>,
    ) -> Self {
        let mut payload = Self::webhook_payload(integration_id, webhook_id.into(), config_data);
        payload.error = Some(error.into());
        Self::new(EventType::WebhookFailed, payload)
    }

    /// Handler-authored progress log; `detail` rides the result field.
    pub fn custom_log(
        integration_id: IntegrationId,
        action_id: Option<ActionId>,
        config_data: Value,
        detail: Value,
    ) -> Self {
        let mut payload = EventPayload {
            integration_id,
            action_id,
            webhook_id: None,
            config_data,
            result: None,
            error: None,
        };
        payload.result = Some(detail);
        Self::new(EventType::CustomLog, payload)
    }

    /// The integration this event belongs to.
    pub fn integration_id(&self) -> &IntegrationId {
        &self.payload.integration_id
    }

    /// Returns `true` for Failed events.
    pub fn is_failure(&self) -> bool {
        matches!(
            self.event_type,
            EventType::ActionFailed | EventType::WebhookFailed
        )
    }
}
