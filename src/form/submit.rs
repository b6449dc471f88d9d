//! Submission controller: attempt, validate, then submit or reject

use super::Form;
use crate::error::{FormError, FormResult};
use crate::state::FormMessage;
use crate::validation::{has_errors, MaybeAsync};
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};

/// How a submission ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SubmitOutcome {
    /// Validation found errors; the submit handler was not called
    Rejected,
    /// A deferred submit handler resolved; `is_submitting` was cleared
    Submitted,
    /// A synchronous submit handler returned; it owns `is_submitting`
    Handled,
    /// The form was torn down before the submit handler settled
    Abandoned,
}

enum SubmitPhase {
    Attempting,
    Validating,
    Submitting,
    Awaiting(BoxFuture<'static, anyhow::Result<()>>),
}

impl SubmitPhase {
    fn name(&self) -> &'static str {
        match self {
            SubmitPhase::Attempting => "attempting",
            SubmitPhase::Validating => "validating",
            SubmitPhase::Submitting => "submitting",
            SubmitPhase::Awaiting(_) => "awaiting",
        }
    }
}

impl Form {
    /// Validate the current values and, if there are no errors, submit them.
    ///
    /// Every attempt increments `submit_count` and marks all value leaves
    /// touched. A validator crash returns `Err` after `is_submitting` is
    /// cleared. Errors in the values are not an `Err`: they yield
    /// [`SubmitOutcome::Rejected`].
    pub async fn submit_form(&self) -> FormResult<SubmitOutcome> {
        let mut phase = SubmitPhase::Attempting;
        loop {
            tracing::debug!(phase = phase.name(), "submit phase");
            phase = match phase {
                SubmitPhase::Attempting => {
                    self.dispatch(FormMessage::SubmitAttempt);
                    SubmitPhase::Validating
                }
                SubmitPhase::Validating => {
                    let values = self.values();
                    let errors = match self.run_validation(&values).await {
                        Ok(errors) => errors,
                        Err(err) => {
                            self.dispatch(FormMessage::SubmitFailure);
                            return Err(err);
                        }
                    };
                    if has_errors(&errors) {
                        self.dispatch(FormMessage::SubmitFailure);
                        return Ok(SubmitOutcome::Rejected);
                    }
                    SubmitPhase::Submitting
                }
                SubmitPhase::Submitting => {
                    let handler = self.inner.on_submit.clone();
                    match handler.submit(self.values(), self.clone()) {
                        MaybeAsync::Ready(Ok(())) => return Ok(SubmitOutcome::Handled),
                        MaybeAsync::Ready(Err(err)) => return Err(FormError::SubmitRejected(err)),
                        MaybeAsync::Pending(pending) => SubmitPhase::Awaiting(pending),
                    }
                }
                SubmitPhase::Awaiting(pending) => {
                    let outcome = pending.await;
                    if !self.is_live() {
                        tracing::debug!(
                            succeeded = outcome.is_ok(),
                            "form torn down before submit settled"
                        );
                        return Ok(SubmitOutcome::Abandoned);
                    }
                    return match outcome {
                        Ok(()) => {
                            self.dispatch(FormMessage::SubmitSuccess);
                            Ok(SubmitOutcome::Submitted)
                        }
                        Err(err) => {
                            self.dispatch(FormMessage::SubmitFailure);
                            Err(FormError::SubmitRejected(err))
                        }
                    };
                }
            };
        }
    }
}
