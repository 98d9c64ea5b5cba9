//! Classified execution errors.
//!
//! The runner never leaks a raw transport error: every failure path maps to
//! one of these variants, each carrying enough context (integration id,
//! action id, underlying message) to diagnose. [`ExecuteError::kind`] gives
//! the outer transport layer its status-code mapping without string
//! matching.

use junction_core::{ActionId, HandlerError, IntegrationId};

/// Coarse classification of an execution failure, for status-code mapping
/// at the transport boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The named integration, configuration or action does not exist
    /// (4xx-equivalent, no retry).
    NotFound,
    /// The request is well-addressed but not executable: disabled
    /// integration or configuration failing validation (4xx-equivalent).
    Invalid,
    /// Infrastructure was unreachable after bounded retries
    /// (5xx-equivalent).
    Unavailable,
    /// The handler ran and failed (5xx-equivalent; retry is the vendor
    /// handler's business, not the runner's).
    Execution,
}

/// Error type for [`ActionRunner::execute`](crate::ActionRunner::execute).
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ExecuteError {
    /// The control plane (or cache store) could not be reached, so the
    /// configuration in effect is unknown.
    #[error("configuration unavailable for integration `{integration_id}`: {reason}")]
    ConfigUnavailable {
        /// The integration whose configuration was needed.
        integration_id: IntegrationId,
        /// Underlying failure, flattened for transport.
        reason: String,
    },

    /// The integration does not exist.
    #[error("integration `{0}` not found")]
    IntegrationNotFound(IntegrationId),

    /// The integration exists but is disabled.
    #[error("integration `{0}` is disabled")]
    IntegrationDisabled(IntegrationId),

    /// The integration carries no configuration for this action.
    #[error("no configuration for action `{action_id}` on integration `{integration_id}`")]
    ConfigurationNotFound {
        /// The integration consulted.
        integration_id: IntegrationId,
        /// The unconfigured action.
        action_id: ActionId,
    },

    /// No handler is registered for this action id.
    #[error("action `{action_id}` is not supported")]
    ActionNotSupported {
        /// The unknown action id.
        action_id: ActionId,
    },

    /// The merged configuration failed validation; the handler never ran.
    #[error("invalid configuration for action `{action_id}`: {reason}")]
    InvalidConfiguration {
        /// The action whose configuration was rejected.
        action_id: ActionId,
        /// Why validation rejected it.
        reason: String,
    },

    /// The handler ran and failed.
    #[error("action `{action_id}` on integration `{integration_id}` failed")]
    Execution {
        /// The integration executed against.
        integration_id: IntegrationId,
        /// The failing action.
        action_id: ActionId,
        /// The handler's own error.
        #[source]
        source: HandlerError,
    },
}

impl ExecuteError {
    /// Classify this error for status-code mapping.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::IntegrationNotFound(_)
            | Self::ConfigurationNotFound { .. }
            | Self::ActionNotSupported { .. } => ErrorKind::NotFound,
            Self::IntegrationDisabled(_) | Self::InvalidConfiguration { .. } => ErrorKind::Invalid,
            Self::ConfigUnavailable { .. } => ErrorKind::Unavailable,
            Self::Execution { .. } => ErrorKind::Execution,
        }
    }
}
