//! Polling of asynchronous provider actions.
//!
//! Busy-polling with a fixed interval up to a deadline. A timeout is not a
//! failure: the caller gets `completed = false` plus the last observed
//! status and decides what to do. Transport errors mid-poll are
//! inconclusive and polling continues; a rejected request aborts.

use tokio::time::{Instant, sleep};
use tracing::debug;

use crate::error::Error;
use crate::provider::Provider;
use crate::types::{ActionHandle, Application, STATUS_RUNNING, WaitPolicy};

/// Result of waiting on an action.
#[derive(Debug, Clone, PartialEq)]
pub struct PollOutcome {
    /// True iff a terminal status (`Completed` or `Failed`) was observed.
    pub completed: bool,
    /// Last status observed, None if no query ever succeeded.
    pub status: Option<String>,
}

/// Result of waiting for an application to reach the running state.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub running: bool,
    /// Last application record fetched during the wait.
    pub application: Option<Application>,
}

/// Poll an action until it reaches a terminal status or the policy's
/// timeout elapses.
pub async fn wait_for_action<P: Provider + ?Sized>(
    provider: &P,
    handle: &ActionHandle,
    policy: &WaitPolicy,
) -> Result<PollOutcome, Error> {
    let deadline = Instant::now() + policy.timeout;
    let mut last_status = None;

    loop {
        match provider.action_status(&handle.action_id).await {
            Ok(action) => {
                let terminal = action.is_terminal();
                debug!(action_id = %handle.action_id, status = %action.status, "polled action");
                last_status = Some(action.status);
                if terminal {
                    return Ok(PollOutcome {
                        completed: true,
                        status: last_status,
                    });
                }
            }
            Err(e) if e.is_retriable() => {
                debug!(action_id = %handle.action_id, error = %e, "transient error while polling, retrying");
            }
            Err(e) => return Err(Error::Provider(e)),
        }

        if Instant::now() >= deadline {
            return Ok(PollOutcome {
                completed: false,
                status: last_status,
            });
        }
        sleep(policy.interval).await;
    }
}

/// Poll an application until its status is `Running` or the policy's
/// timeout elapses. Used after actions that imply a running end state.
pub async fn wait_for_running<P: Provider + ?Sized>(
    provider: &P,
    id: &str,
    policy: &WaitPolicy,
) -> Result<RunOutcome, Error> {
    let deadline = Instant::now() + policy.timeout;
    let mut last = None;

    loop {
        match provider.get_application(id).await {
            Ok(application) => {
                let running = application.status == STATUS_RUNNING;
                debug!(id = %id, status = %application.status, "polled application state");
                last = Some(application);
                if running {
                    return Ok(RunOutcome {
                        running: true,
                        application: last,
                    });
                }
            }
            Err(e) if e.is_retriable() => {
                debug!(id = %id, error = %e, "transient error while polling, retrying");
            }
            Err(e) => return Err(Error::Provider(e)),
        }

        if Instant::now() >= deadline {
            return Ok(RunOutcome {
                running: false,
                application: last,
            });
        }
        sleep(policy.interval).await;
    }
}
