//! Reconciler for Cloudistics applications.
//!
//! Converges a named application toward a declared desired state or applies
//! a lifecycle action, safe to invoke repeatedly. Each invocation is a
//! strictly sequential run of blocking provider calls: lookup, optional
//! mutate, optional poll loop, final re-fetch. No state is shared between
//! invocations.

use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::poll::{wait_for_action, wait_for_running};
use crate::provider::{Provider, find_by_name};
use crate::types::{ActionKind, ApplicationSpec, Outcome, WaitPolicy};

/// Declarative reconciler over a [`Provider`].
///
/// In check mode every operation stops after the lookup and reports the
/// `changed` flag that a real run would produce, without issuing any
/// mutating call.
pub struct Reconciler<P> {
    provider: P,
    check_mode: bool,
}

impl<P: Provider> Reconciler<P> {
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            check_mode: false,
        }
    }

    pub fn with_check_mode(mut self, check_mode: bool) -> Self {
        self.check_mode = check_mode;
        self
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Ensure an application matching `spec.name` exists.
    ///
    /// An existing application is left untouched regardless of attribute
    /// differences; the provider has no update-in-place for these fields.
    /// After a create, the application is re-fetched by its assigned id
    /// rather than by name so a transient duplicate name cannot swap in
    /// the wrong record.
    pub async fn ensure_present(
        &self,
        spec: &ApplicationSpec,
        policy: &WaitPolicy,
    ) -> Result<Outcome> {
        spec.validate()?;

        let existing = find_by_name(&self.provider, &spec.name).await?;

        if self.check_mode {
            return Ok(Outcome {
                changed: existing.is_none(),
                application: existing,
                ..Outcome::default()
            });
        }

        if let Some(application) = existing {
            debug!(name = %spec.name, id = %application.id, "application already present");
            return Ok(Outcome {
                changed: false,
                application: Some(application),
                ..Outcome::default()
            });
        }

        info!(name = %spec.name, "creating application");
        let handle = self.provider.create_application(spec).await?;

        let mut outcome = Outcome {
            changed: true,
            ..Outcome::default()
        };

        if policy.wait {
            let poll = wait_for_action(&self.provider, &handle, policy).await?;
            outcome.completed = poll.completed;
            outcome.status = poll.status;
        }

        outcome.application = match handle.object_id.as_deref() {
            Some(id) => Some(self.provider.get_application(id).await?),
            None => find_by_name(&self.provider, &spec.name).await?,
        };

        Ok(outcome)
    }

    /// Ensure no application named `name` exists.
    ///
    /// The final lookup reports whatever the provider says after the
    /// delete; absence is not fabricated.
    pub async fn ensure_absent(&self, name: &str, policy: &WaitPolicy) -> Result<Outcome> {
        let existing = find_by_name(&self.provider, name).await?;

        if self.check_mode {
            return Ok(Outcome {
                changed: existing.is_some(),
                application: existing,
                ..Outcome::default()
            });
        }

        let Some(application) = existing else {
            debug!(name = %name, "application already absent");
            return Ok(Outcome::default());
        };

        info!(name = %name, id = %application.id, "deleting application");
        let handle = self.provider.delete_application(&application.id).await?;

        let mut outcome = Outcome {
            changed: true,
            ..Outcome::default()
        };

        if policy.wait {
            let poll = wait_for_action(&self.provider, &handle, policy).await?;
            outcome.completed = poll.completed;
            outcome.status = poll.status;
        }

        outcome.application = find_by_name(&self.provider, name).await?;

        Ok(outcome)
    }

    /// Apply a lifecycle action to the application named `name`.
    ///
    /// A missing target is an error; an application already in the
    /// action's expected status is a no-op with no further provider
    /// calls. For actions that imply a running end state, a second wait
    /// cycle polls the application itself after the action completes.
    pub async fn apply_action(
        &self,
        name: &str,
        action: ActionKind,
        policy: &WaitPolicy,
    ) -> Result<Outcome> {
        let Some(application) = find_by_name(&self.provider, name).await? else {
            return Err(Error::NotFound {
                name: name.to_string(),
            });
        };

        let needed = application.status != action.expected_status();

        if self.check_mode {
            return Ok(Outcome {
                changed: needed,
                application: Some(application),
                ..Outcome::default()
            });
        }

        if !needed {
            debug!(name = %name, action = %action, status = %application.status,
                   "application already in expected status");
            return Ok(Outcome {
                changed: false,
                application: Some(application),
                ..Outcome::default()
            });
        }

        info!(name = %name, id = %application.id, action = %action, "applying action");
        let handle = self.provider.perform_action(&application.id, action).await?;

        let mut outcome = Outcome {
            changed: true,
            ..Outcome::default()
        };

        if policy.wait {
            let poll = wait_for_action(&self.provider, &handle, policy).await?;
            outcome.completed = poll.completed;
            outcome.status = poll.status;

            if poll.completed && action.implies_running() {
                let run = wait_for_running(&self.provider, &application.id, policy).await?;
                outcome.completed = run.running;
            }
        }

        outcome.application = Some(self.provider.get_application(&application.id).await?);

        Ok(outcome)
    }
}
