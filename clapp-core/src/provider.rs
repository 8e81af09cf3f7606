//! Provider capability the reconciler runs against.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ProviderError;
use crate::types::{ActionHandle, ActionKind, Application, ApplicationSpec};

/// Status of an asynchronous provider action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionStatus {
    pub status: String,
}

impl ActionStatus {
    pub const COMPLETED: &'static str = "Completed";
    pub const FAILED: &'static str = "Failed";

    /// Whether no further state change will occur for this action.
    /// Both success and failure are terminal; callers look at the
    /// status string to tell them apart.
    pub fn is_terminal(&self) -> bool {
        self.status == Self::COMPLETED || self.status == Self::FAILED
    }
}

/// The mutate/lookup/poll surface of the Cloudistics API.
///
/// All mutating calls are asynchronous on the provider side and return an
/// [`ActionHandle`] to poll. Implementations map rejected requests to
/// [`ProviderError::Api`] and connection failures to
/// [`ProviderError::Transport`].
#[async_trait]
pub trait Provider: Send + Sync {
    async fn list_applications(&self) -> Result<Vec<Application>, ProviderError>;

    async fn get_application(&self, id: &str) -> Result<Application, ProviderError>;

    async fn create_application(
        &self,
        spec: &ApplicationSpec,
    ) -> Result<ActionHandle, ProviderError>;

    async fn delete_application(&self, id: &str) -> Result<ActionHandle, ProviderError>;

    async fn perform_action(
        &self,
        id: &str,
        action: ActionKind,
    ) -> Result<ActionHandle, ProviderError>;

    async fn action_status(&self, action_id: &str) -> Result<ActionStatus, ProviderError>;
}

/// Look up an application by name.
///
/// Names are not unique on the provider side; the first match in listing
/// order wins. This mirrors the platform's own tooling and is the
/// documented policy, not an oversight.
pub async fn find_by_name<P: Provider + ?Sized>(
    provider: &P,
    name: &str,
) -> Result<Option<Application>, ProviderError> {
    let applications = provider.list_applications().await?;
    Ok(applications.into_iter().find(|a| a.name == name))
}
