//! Error taxonomy for reconcile operations.

use thiserror::Error;

/// Failure of a single provider call.
///
/// `Api` means the provider rejected the request; the message is surfaced
/// verbatim and the call is never retried. `Transport` covers connection
/// and transfer failures, which the poll loop treats as inconclusive.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("{message}")]
    Api { message: String },

    #[error("transport error: {message}")]
    Transport { message: String },
}

impl ProviderError {
    pub fn api(message: impl Into<String>) -> Self {
        Self::Api {
            message: message.into(),
        }
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// Whether the poll loop may keep going after this error.
    pub fn is_retriable(&self) -> bool {
        matches!(self, Self::Transport { .. })
    }
}

/// Missing creation parameters, reported before any remote call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("application name is required")]
    NameRequired,

    #[error("template_name is required to create an application")]
    TemplateRequired,

    #[error("category_name is required to create an application")]
    CategoryRequired,

    #[error("data_center_name is required to create an application")]
    DataCenterRequired,

    #[error("migration_zone_name is required to create an application")]
    MigrationZoneRequired,

    #[error("flash_pool_name is required to create an application")]
    FlashPoolRequired,

    #[error("at least one NIC is required to create an application")]
    NicsRequired,
}

/// Terminal failure of a reconcile operation.
///
/// Poll timeouts are not errors; they come back as `completed = false`
/// in the outcome so callers can script on them without error handling.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Action target does not exist. Distinct from "already in the
    /// desired state", which is a successful no-op.
    #[error("application not found: {name}")]
    NotFound { name: String },

    #[error(transparent)]
    Provider(#[from] ProviderError),
}

/// Result type for reconcile operations.
pub type Result<T> = std::result::Result<T, Error>;
