//! Validated identifier newtypes.
//!
//! Integration, action and source ids all end up embedded in cache-store
//! keys, broker payloads and control-plane URLs, so they are validated once
//! at the edge and carried as typed values everywhere else.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Maximum length for any identifier.
const MAX_ID_LENGTH: usize = 128;

/// Error raised when an identifier fails validation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdError {
    /// The identifier was empty.
    #[error("identifier must not be empty")]
    Empty,

    /// The identifier contained invalid characters or exceeded the length cap.
    #[error("invalid identifier `{id}`: {reason}")]
    Invalid {
        /// The rejected identifier.
        id: String,
        /// Why it was rejected.
        reason: String,
    },
}

fn validate(id: String, allow_dot: bool) -> Result<String, IdError> {
    if id.is_empty() {
        return Err(IdError::Empty);
    }

    if id.len() > MAX_ID_LENGTH {
        return Err(IdError::Invalid {
            id,
            reason: format!("exceeds maximum length of {MAX_ID_LENGTH} characters"),
        });
    }

    // Dots are reserved as the key-scheme separator, so only SourceId —
    // which sits in the final key position — may carry them.
    let ok = id
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_' || (allow_dot && c == '.'));
    if !ok {
        return Err(IdError::Invalid {
            id,
            reason: "contains invalid characters (only alphanumeric, hyphens, underscores allowed)"
                .to_string(),
        });
    }

    Ok(id)
}

macro_rules! string_id {
    ($(#[$doc:meta])* $name:ident, allow_dot: $allow_dot:expr) => {
        $(#[$doc])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Creates a new validated identifier.
            pub fn new(id: impl Into<String>) -> Result<Self, IdError> {
                validate(id.into(), $allow_dot).map(Self)
            }

            /// Returns the identifier as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Converts to an owned string.
            pub fn into_string(self) -> String {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl TryFrom<String> for $name {
            type Error = IdError;

            fn try_from(s: String) -> Result<Self, Self::Error> {
                Self::new(s)
            }
        }

        impl TryFrom<&str> for $name {
            type Error = IdError;

            fn try_from(s: &str) -> Result<Self, Self::Error> {
                Self::new(s)
            }
        }
    };
}

string_id! {
    /// Identifier of one configured integration.
    ///
    /// Assigned by the control plane; alphanumeric plus hyphens and
    /// underscores, at most 128 characters.
    IntegrationId, allow_dot: false
}

string_id! {
    /// Identifier of a named action exposed by an integration type
    /// (e.g. `pull_data`, `authenticate`).
    ActionId, allow_dot: false
}

string_id! {
    /// Sub-partition key within an (integration, action) pair, used when
    /// cursor state is tracked per upstream device or sensor.
    ///
    /// Also allows dots, since device serials commonly carry them.
    SourceId, allow_dot: true
}

/// Sentinel source id used when no per-source partitioning is needed.
pub const NO_SOURCE: &str = "no-source";

impl Default for SourceId {
    fn default() -> Self {
        Self(NO_SOURCE.to_string())
    }
}
