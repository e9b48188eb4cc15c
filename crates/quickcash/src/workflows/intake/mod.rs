//! Five-step loan intake: answers, auto-advance, and the one-shot submission.

pub mod domain;
pub mod gate;
pub mod scheduler;
pub mod step;
pub mod wizard;

#[cfg(test)]
mod tests;

pub use domain::{
    city_suggestions, AgeGroup, ApplicationDraft, City, DraftField, EmploymentType, FieldError,
    IncomeBand, IncompleteDraft, LoanAmount, LoanApplicationDetails, KNOWN_CITIES,
    MAX_LOAN_AMOUNT, MIN_LOAN_AMOUNT,
};
pub use gate::{SubmissionError, SubmissionGate, SubmissionReceipt};
pub use scheduler::{AutoAdvanceScheduler, PendingTimer};
pub use step::{StepError, StepInput, WizardStep};
pub use wizard::{IntakeWizard, Transition, WizardError, WizardPhase};
