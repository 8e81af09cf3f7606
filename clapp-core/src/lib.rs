//! clapp-core: declarative reconciliation for Cloudistics applications.
//!
//! The provider's API is asynchronous: every mutating call returns an
//! action handle to poll. This crate carries the control-flow on top of
//! that — look up by name, decide whether a change is needed, issue it,
//! poll to a terminal status under a timeout, and report an idempotent
//! outcome. Transport lives behind the [`Provider`] trait.

pub mod error;
pub mod poll;
pub mod provider;
pub mod reconcile;
pub mod types;

pub use error::{Error, ProviderError, Result, ValidationError};
pub use poll::{PollOutcome, RunOutcome, wait_for_action, wait_for_running};
pub use provider::{ActionStatus, Provider, find_by_name};
pub use reconcile::Reconciler;
pub use types::{
    ActionHandle, ActionKind, Application, ApplicationSpec, NicKind, NicSpec, Outcome, WaitPolicy,
};
