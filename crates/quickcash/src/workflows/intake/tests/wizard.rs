use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;

use super::common::*;
use crate::backend::{BackendError, InMemoryBackend, VerificationStatus};
use crate::session::SessionContext;
use crate::workflows::intake::domain::{DraftField, EmploymentType, LoanAmount};
use crate::workflows::intake::gate::SubmissionError;
use crate::workflows::intake::step::{StepError, StepInput, WizardStep};
use crate::workflows::intake::wizard::{IntakeWizard, Transition, WizardError, WizardPhase};
use crate::workflows::FunnelRoute;

/// Answer and manually advance through every step before the city.
async fn walk_to_city(wizard: &mut IntakeWizard<InMemoryBackend>) {
    for input in scenario_inputs().into_iter().take(4) {
        wizard.select(input).expect("valid answer");
        wizard.advance().await.expect("moves forward");
    }
    assert_eq!(wizard.current_step(), Some(WizardStep::City));
}

#[tokio::test(start_paused = true)]
async fn scenario_answers_auto_advance_to_submission() {
    let (mut wizard, backend) = wizard();

    let mut last = None;
    for input in scenario_inputs() {
        wizard.select(input).expect("valid answer");
        last = Some(wizard.run_auto_advance().await.expect("auto-advance"));
    }

    let receipt = match last {
        Some(Transition::Submitted(receipt)) => receipt,
        other => panic!("expected submission, got {other:?}"),
    };
    assert!(matches!(wizard.phase(), WizardPhase::Submitted { .. }));
    assert_eq!(wizard.next_route(), Some(FunnelRoute::Kyc));
    assert_eq!(backend.create_calls(), 1);

    let stored = backend.applications();
    assert_eq!(stored[0].id, receipt.application_id);
    assert_eq!(stored[0].details.loan_amount.rupees(), 500_000);
    assert_eq!(stored[0].details.monthly_income.label(), "₹40K - ₹60K");
    assert_eq!(stored[0].details.city.as_str(), "Pune");
    assert_eq!(
        backend.verification_status(&user_id()),
        Some(VerificationStatus::Pending)
    );
}

#[tokio::test(start_paused = true)]
async fn reselecting_restarts_the_quiet_period() {
    let (mut wizard, _backend) = wizard();
    let start = Instant::now();

    wizard
        .select(StepInput::LoanAmount(LoanAmount::new(50_000).expect("in range")))
        .expect("valid");
    tokio::time::sleep(Duration::from_millis(600)).await;
    wizard
        .select(StepInput::LoanAmount(LoanAmount::new(75_000).expect("in range")))
        .expect("valid");

    let transition = wizard.run_auto_advance().await.expect("advances");
    assert_eq!(
        transition,
        Transition::Moved {
            from: WizardStep::LoanAmount,
            to: WizardStep::EmploymentType
        }
    );
    assert_eq!(Instant::now() - start, Duration::from_millis(1_600));
    assert_eq!(wizard.draft().loan_amount.map(LoanAmount::rupees), Some(75_000));

    let second = tokio::time::timeout(QUIET * 5, wizard.run_auto_advance()).await;
    assert!(second.is_err(), "the step advanced twice");
    assert_eq!(wizard.current_step(), Some(WizardStep::EmploymentType));
}

#[tokio::test(start_paused = true)]
async fn manual_navigation_cancels_the_pending_timer() {
    let (mut wizard, _backend) = wizard();

    wizard
        .select(StepInput::LoanAmount(LoanAmount::new(20_000).expect("in range")))
        .expect("valid");
    wizard.advance().await.expect("advances");
    assert!(wizard.pending_timer().is_none());

    wizard
        .select(StepInput::EmploymentType(EmploymentType::Student))
        .expect("valid");
    assert_eq!(
        wizard.retreat().expect("moves back"),
        Transition::Moved {
            from: WizardStep::EmploymentType,
            to: WizardStep::LoanAmount
        }
    );
    assert!(wizard.pending_timer().is_none());

    let fired = tokio::time::timeout(QUIET * 3, wizard.run_auto_advance()).await;
    assert!(fired.is_err());
    assert_eq!(wizard.current_step(), Some(WizardStep::LoanAmount));
    assert_eq!(
        wizard.draft().employment_type,
        Some(EmploymentType::Student),
        "answers survive navigation"
    );
}

#[tokio::test]
async fn retreat_on_first_step_is_a_no_op() {
    let (mut wizard, _backend) = wizard();
    assert_eq!(
        wizard.retreat(),
        Ok(Transition::Unchanged(WizardStep::LoanAmount))
    );
}

#[tokio::test]
async fn answers_for_other_steps_are_rejected() {
    let (mut wizard, _backend) = wizard();
    let result = wizard.select(StepInput::City(pune()));
    assert_eq!(
        result,
        Err(WizardError::Step(StepError::WrongStep {
            expected: WizardStep::LoanAmount,
            found: WizardStep::City
        }))
    );
    assert!(wizard.pending_timer().is_none());
}

#[tokio::test(start_paused = true)]
async fn typing_a_city_never_auto_advances() {
    let (mut wizard, backend) = wizard();
    walk_to_city(&mut wizard).await;

    wizard.select(StepInput::City(pune())).expect("listed city");
    assert!(wizard.pending_timer().is_some());

    let suggestions = wizard.type_city("pu").expect("on city step");
    assert_eq!(suggestions, vec!["Pune"]);
    assert!(wizard.pending_timer().is_none());
    assert_eq!(wizard.city_entry(), Some("pu"));

    let fired = tokio::time::timeout(QUIET * 3, wizard.run_auto_advance()).await;
    assert!(fired.is_err());
    assert_eq!(backend.create_calls(), 0);
}

#[tokio::test]
async fn typing_a_city_replaces_the_selected_suggestion() {
    let (mut wizard, backend) = wizard();
    walk_to_city(&mut wizard).await;
    wizard.select(StepInput::City(pune())).expect("listed city");

    wizard.type_city("Shil").expect("on city step");
    assert_eq!(wizard.draft().city, None);

    match wizard.advance().await {
        Err(WizardError::Submission(SubmissionError::Incomplete(missing))) => {
            assert_eq!(missing.missing, vec![DraftField::City]);
        }
        other => panic!("expected a missing city, got {other:?}"),
    }
    assert_eq!(backend.create_calls(), 0);

    wizard.select(StepInput::City(pune())).expect("listed city");
    assert_eq!(wizard.city_entry(), None);
    assert!(matches!(
        wizard.advance().await,
        Ok(Transition::Submitted(_))
    ));
    assert_eq!(backend.applications()[0].details.city.as_str(), "Pune");
}

#[tokio::test]
async fn confirmed_free_text_city_is_submitted() {
    let (mut wizard, backend) = wizard();
    walk_to_city(&mut wizard).await;

    assert!(wizard.type_city("  Shillong ").expect("on city step").is_empty());
    let transition = wizard.confirm_city().await.expect("submits");

    assert!(matches!(transition, Transition::Submitted(_)));
    assert_eq!(backend.applications()[0].details.city.as_str(), "Shillong");
}

#[tokio::test]
async fn confirming_without_typed_city_fails() {
    let (mut wizard, _backend) = wizard();
    walk_to_city(&mut wizard).await;

    assert_eq!(
        wizard.confirm_city().await,
        Err(WizardError::Step(StepError::NoCityEntered))
    );
}

#[tokio::test]
async fn failed_submission_stays_on_last_step_and_can_retry() {
    let (mut wizard, backend) = wizard();
    walk_to_city(&mut wizard).await;
    wizard.select(StepInput::City(pune())).expect("listed city");
    backend.fail_next_create(BackendError::Unavailable("connection reset".to_string()));

    let failed = wizard.advance().await;
    assert_eq!(
        failed,
        Err(WizardError::Submission(
            SubmissionError::TransientBackendError("connection reset".to_string())
        ))
    );
    assert_eq!(wizard.current_step(), Some(WizardStep::City));
    assert!(wizard.last_error().is_some());
    assert_eq!(wizard.next_route(), None);

    let retried = wizard.advance().await.expect("retry succeeds");
    assert!(matches!(retried, Transition::Submitted(_)));
    assert!(wizard.last_error().is_none());
    assert_eq!(backend.create_calls(), 2);
    assert_eq!(backend.applications().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn write_from_an_abandoned_auto_advance_is_adopted() {
    let (backend, context) = slow_backend(Duration::from_millis(50));
    let mut wizard = IntakeWizard::new(backend.clone(), context, QUIET);
    walk_to_city(&mut wizard).await;
    wizard.select(StepInput::City(pune())).expect("listed city");

    let abandoned =
        tokio::time::timeout(QUIET + Duration::from_millis(10), wizard.run_auto_advance()).await;
    assert!(abandoned.is_err(), "the write was still in flight");
    assert_eq!(wizard.current_step(), Some(WizardStep::City));

    assert_eq!(
        wizard.advance().await,
        Err(WizardError::Submission(SubmissionError::InFlight))
    );

    tokio::time::sleep(Duration::from_millis(200)).await;
    let transition = wizard.advance().await.expect("adopts the landed write");

    let receipt = match transition {
        Transition::Submitted(receipt) => receipt,
        other => panic!("expected submission, got {other:?}"),
    };
    assert_eq!(backend.applications()[0].id, receipt.application_id);
    assert!(matches!(wizard.phase(), WizardPhase::Submitted { .. }));
    assert!(wizard.last_error().is_none());
    assert_eq!(wizard.next_route(), Some(FunnelRoute::Kyc));
    assert_eq!(backend.create_calls(), 1);
}

#[tokio::test]
async fn missing_session_routes_to_login() {
    let backend = Arc::new(InMemoryBackend::new());
    let mut wizard = IntakeWizard::new(backend.clone(), SessionContext::anonymous(), QUIET);
    walk_to_city(&mut wizard).await;
    wizard.select(StepInput::City(pune())).expect("listed city");

    assert_eq!(
        wizard.advance().await,
        Err(WizardError::Submission(SubmissionError::Unauthenticated))
    );
    assert_eq!(wizard.next_route(), Some(FunnelRoute::Login));
    assert_eq!(backend.create_calls(), 0);
}

#[tokio::test]
async fn incomplete_draft_is_reported_on_the_last_step() {
    let (mut wizard, backend) = wizard();
    for _ in 0..4 {
        wizard.advance().await.expect("moves without an answer");
    }

    match wizard.advance().await {
        Err(WizardError::Submission(SubmissionError::Incomplete(missing))) => {
            assert_eq!(missing.missing.len(), 5);
        }
        other => panic!("expected incomplete draft, got {other:?}"),
    }
    assert_eq!(backend.create_calls(), 0);
}

#[tokio::test]
async fn finished_wizard_ignores_further_input() {
    let (mut wizard, _backend) = wizard();
    walk_to_city(&mut wizard).await;
    wizard.select(StepInput::City(pune())).expect("listed city");
    wizard.advance().await.expect("submits");

    assert_eq!(wizard.current_step(), None);
    assert_eq!(wizard.retreat(), Err(WizardError::Finished));
    assert_eq!(
        wizard.select(StepInput::City(pune())),
        Err(WizardError::Finished)
    );
    assert_eq!(wizard.advance().await, Err(WizardError::Finished));
}
