use chrono::{Duration, Utc};
use metrics_exporter_prometheus::PrometheusHandle;
use quickcash::backend::{InMemoryBackend, LoanApplicationStatus, VerificationStatus};
use quickcash::session::{SessionInfo, UserId};
use quickcash::workflows::intake::{
    AgeGroup, City, EmploymentType, IncomeBand, LoanAmount, LoanApplicationDetails,
};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

pub(crate) fn demo_user() -> SessionInfo {
    SessionInfo {
        user_id: UserId("demo-applicant".to_string()),
        email: Some("applicant@quickcash.example".to_string()),
        expires_at: Utc::now() + Duration::hours(8),
    }
}

pub(crate) fn demo_details() -> Option<LoanApplicationDetails> {
    Some(LoanApplicationDetails {
        loan_amount: LoanAmount::new(500_000).ok()?,
        employment_type: EmploymentType::Salaried,
        monthly_income: IncomeBand::From40KTo60K,
        age_group: AgeGroup::From26To30,
        city: City::known("Pune")?,
    })
}

/// Backend with the demo applicant signed in and, when `with_application` is set, a
/// submitted application awaiting KYC.
pub(crate) fn demo_backend(with_application: bool) -> Arc<InMemoryBackend> {
    let backend = Arc::new(InMemoryBackend::new());
    let user = demo_user();
    backend.sign_in(user.clone());

    if with_application {
        if let Some(details) = demo_details() {
            backend.seed_application(
                &user.user_id,
                details,
                LoanApplicationStatus::Pending,
                Utc::now() - Duration::hours(1),
            );
            backend.set_verification_status(&user.user_id, VerificationStatus::Pending);
        }
    }
    backend
}
