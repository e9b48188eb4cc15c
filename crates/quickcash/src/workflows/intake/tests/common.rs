use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;

use crate::backend::InMemoryBackend;
use crate::session::{SessionContext, SessionInfo, UserId};
use crate::workflows::intake::domain::{
    AgeGroup, ApplicationDraft, City, EmploymentType, IncomeBand, LoanAmount,
};
use crate::workflows::intake::step::StepInput;
use crate::workflows::intake::IntakeWizard;

pub(super) const QUIET: Duration = Duration::from_millis(1_000);

pub(super) fn user_id() -> UserId {
    UserId("user-7f3a".to_string())
}

pub(super) fn session() -> SessionInfo {
    SessionInfo {
        user_id: user_id(),
        email: Some("asha@example.in".to_string()),
        expires_at: Utc::now() + chrono::Duration::hours(1),
    }
}

/// Backend with the sample user signed in, plus a matching session context.
pub(super) fn signed_in_backend() -> (Arc<InMemoryBackend>, SessionContext) {
    let backend = Arc::new(InMemoryBackend::new());
    backend.sign_in(session());
    (backend, SessionContext::authenticated(session()))
}

/// Like [`signed_in_backend`], with every application write delayed by `latency`.
pub(super) fn slow_backend(latency: Duration) -> (Arc<InMemoryBackend>, SessionContext) {
    let backend = InMemoryBackend::new().with_write_latency(latency);
    backend.sign_in(session());
    (Arc::new(backend), SessionContext::authenticated(session()))
}

pub(super) fn wizard() -> (IntakeWizard<InMemoryBackend>, Arc<InMemoryBackend>) {
    let (backend, context) = signed_in_backend();
    (IntakeWizard::new(backend.clone(), context, QUIET), backend)
}

pub(super) fn pune() -> City {
    City::known("Pune").expect("Pune is listed")
}

/// The answers from the reference scenario, in step order.
pub(super) fn scenario_inputs() -> Vec<StepInput> {
    vec![
        StepInput::LoanAmount(LoanAmount::new(500_000).expect("in range")),
        StepInput::EmploymentType(EmploymentType::Salaried),
        StepInput::MonthlyIncome(IncomeBand::From40KTo60K),
        StepInput::AgeGroup(AgeGroup::From26To30),
        StepInput::City(pune()),
    ]
}

pub(super) fn complete_draft() -> ApplicationDraft {
    let mut draft = ApplicationDraft::default();
    for input in scenario_inputs() {
        input.write_to(&mut draft);
    }
    draft
}
