use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing::debug;

use super::domain::{city_suggestions, ApplicationDraft, City};
use super::gate::{SubmissionError, SubmissionGate, SubmissionReceipt};
use super::scheduler::{AutoAdvanceScheduler, PendingTimer};
use super::step::{StepError, StepInput, WizardStep};
use crate::backend::ApplicationStore;
use crate::config::FunnelConfig;
use crate::session::SessionContext;
use crate::workflows::FunnelRoute;

/// Where the wizard is in its one-shot lifecycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum WizardPhase {
    Collecting { step: WizardStep },
    Submitted { receipt: SubmissionReceipt },
}

/// Result of a navigation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    Moved { from: WizardStep, to: WizardStep },
    Unchanged(WizardStep),
    Submitted(SubmissionReceipt),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WizardError {
    #[error(transparent)]
    Step(#[from] StepError),
    #[error(transparent)]
    Submission(#[from] SubmissionError),
    #[error("the application has already been submitted")]
    Finished,
}

/// Five-step intake state machine.
///
/// Selections commit to the draft and arm the auto-advance timer; manual navigation
/// cancels the timer and moves immediately. Advancing past the last step hands the
/// draft to the [`SubmissionGate`]. A wizard is used for a single pass: create a new
/// one to start over.
pub struct IntakeWizard<S> {
    phase: WizardPhase,
    draft: ApplicationDraft,
    city_entry: Option<String>,
    scheduler: AutoAdvanceScheduler,
    gate: SubmissionGate<S>,
    quiet_period: Duration,
    last_error: Option<SubmissionError>,
}

impl<S> IntakeWizard<S>
where
    S: ApplicationStore + 'static,
{
    pub fn new(store: Arc<S>, session: SessionContext, quiet_period: Duration) -> Self {
        Self {
            phase: WizardPhase::Collecting {
                step: WizardStep::FIRST,
            },
            draft: ApplicationDraft::default(),
            city_entry: None,
            scheduler: AutoAdvanceScheduler::new(),
            gate: SubmissionGate::new(store, session),
            quiet_period,
            last_error: None,
        }
    }

    pub fn from_config(store: Arc<S>, session: SessionContext, config: &FunnelConfig) -> Self {
        Self::new(store, session, config.auto_advance_delay)
    }

    pub fn phase(&self) -> &WizardPhase {
        &self.phase
    }

    pub fn current_step(&self) -> Option<WizardStep> {
        match self.phase {
            WizardPhase::Collecting { step } => Some(step),
            WizardPhase::Submitted { .. } => None,
        }
    }

    pub fn draft(&self) -> &ApplicationDraft {
        &self.draft
    }

    /// Free text typed into the city field that has not been confirmed yet.
    pub fn city_entry(&self) -> Option<&str> {
        self.city_entry.as_deref()
    }

    pub fn pending_timer(&self) -> Option<&PendingTimer> {
        self.scheduler.pending()
    }

    /// The error from the most recent failed submission, cleared on success.
    pub fn last_error(&self) -> Option<&SubmissionError> {
        self.last_error.as_ref()
    }

    pub fn next_route(&self) -> Option<FunnelRoute> {
        match (&self.phase, &self.last_error) {
            (WizardPhase::Submitted { .. }, _) => Some(FunnelRoute::Kyc),
            (_, Some(SubmissionError::Unauthenticated)) => Some(FunnelRoute::Login),
            _ => None,
        }
    }

    /// Qualifying input: commit the answer for the current step and (re)arm auto-advance.
    pub fn select(&mut self, input: StepInput) -> Result<PendingTimer, WizardError> {
        let step = self.collecting_step()?;
        step.commit(&mut self.draft, input)?;
        if step == WizardStep::City {
            self.city_entry = None;
        }
        Ok(self.scheduler.arm(self.quiet_period, step))
    }

    /// Free-text city entry. Never arms the timer; cancels one left by an earlier selection.
    ///
    /// Typing replaces any city chosen from the suggestions, so the draft has no city until
    /// the text is confirmed or a suggestion is selected again.
    pub fn type_city(&mut self, text: &str) -> Result<Vec<&'static str>, WizardError> {
        self.require_step(WizardStep::City)?;
        self.scheduler.cancel();
        self.draft.city = None;
        self.city_entry = Some(text.to_string());
        Ok(city_suggestions(text))
    }

    /// Accept the typed city and move on without waiting for the timer.
    pub async fn confirm_city(&mut self) -> Result<Transition, WizardError> {
        self.require_step(WizardStep::City)?;
        let typed = self.city_entry.as_deref().ok_or(StepError::NoCityEntered)?;
        let city = match City::known(typed) {
            Some(city) => city,
            None => City::parse(typed).map_err(StepError::from)?,
        };
        StepInput::City(city).write_to(&mut self.draft);
        self.city_entry = None;
        self.advance().await
    }

    /// Manual forward navigation; submits from the last step.
    pub async fn advance(&mut self) -> Result<Transition, WizardError> {
        self.collecting_step()?;
        self.scheduler.cancel();
        self.step_forward().await
    }

    /// Manual backward navigation; a no-op on the first step.
    pub fn retreat(&mut self) -> Result<Transition, WizardError> {
        let step = self.collecting_step()?;
        self.scheduler.cancel();
        match step.previous() {
            Some(previous) => {
                self.phase = WizardPhase::Collecting { step: previous };
                debug!(from = ?step, to = ?previous, "wizard moved back");
                Ok(Transition::Moved {
                    from: step,
                    to: previous,
                })
            }
            None => Ok(Transition::Unchanged(step)),
        }
    }

    /// Wait for the pending auto-advance timer and apply it.
    ///
    /// Never resolves while no timer is armed, so it can sit in a `select!` next to the
    /// input stream. Cancel-safe up to the moment the timer fires.
    pub async fn run_auto_advance(&mut self) -> Result<Transition, WizardError> {
        let timer = self.scheduler.fired().await;
        let step = self.collecting_step()?;
        if step != timer.step {
            return Ok(Transition::Unchanged(step));
        }
        self.step_forward().await
    }

    async fn step_forward(&mut self) -> Result<Transition, WizardError> {
        let step = self.collecting_step()?;
        if let Some(next) = step.next() {
            self.phase = WizardPhase::Collecting { step: next };
            debug!(from = ?step, to = ?next, "wizard advanced");
            return Ok(Transition::Moved {
                from: step,
                to: next,
            });
        }

        // A write issued by an abandoned call may have landed since.
        if let Some(receipt) = self.gate.receipt() {
            return Ok(self.finish(receipt));
        }

        let error = match self.gate.submit(&self.draft).await {
            Ok(receipt) => return Ok(self.finish(receipt)),
            Err(error) => error,
        };
        if matches!(error, SubmissionError::AlreadySubmitted(_)) {
            if let Some(receipt) = self.gate.receipt() {
                return Ok(self.finish(receipt));
            }
        }
        self.last_error = Some(error.clone());
        Err(error.into())
    }

    fn finish(&mut self, receipt: SubmissionReceipt) -> Transition {
        self.last_error = None;
        self.phase = WizardPhase::Submitted {
            receipt: receipt.clone(),
        };
        debug!(application_id = %receipt.application_id, "wizard finished");
        Transition::Submitted(receipt)
    }

    fn collecting_step(&self) -> Result<WizardStep, WizardError> {
        self.current_step().ok_or(WizardError::Finished)
    }

    fn require_step(&self, expected: WizardStep) -> Result<(), WizardError> {
        let step = self.collecting_step()?;
        if step == expected {
            Ok(())
        } else {
            Err(StepError::WrongStep {
                expected: step,
                found: expected,
            }
            .into())
        }
    }
}

impl<S> Drop for IntakeWizard<S> {
    fn drop(&mut self) {
        self.scheduler.cancel();
    }
}
