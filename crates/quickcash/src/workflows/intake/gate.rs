use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use serde::Serialize;
use tracing::{info, warn};

use super::domain::{ApplicationDraft, IncompleteDraft, LoanApplicationDetails};
use crate::backend::{ApplicationId, ApplicationStore, BackendError, VerificationStatus};
use crate::session::{SessionContext, UserId};

/// Outcome of the single successful write for a draft.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubmissionReceipt {
    pub application_id: ApplicationId,
    pub user_id: UserId,
    /// False when the follow-up verification record could not be written.
    pub verification_initialized: bool,
}

/// Categorized failure of a submission attempt.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SubmissionError {
    #[error(transparent)]
    Incomplete(#[from] IncompleteDraft),
    #[error("sign in again to submit your application")]
    Unauthenticated,
    #[error("application was rejected: {0}")]
    ValidationRejected(String),
    #[error("could not reach the server, please retry: {0}")]
    TransientBackendError(String),
    #[error("a submission is already in progress")]
    InFlight,
    #[error("application {0} was already submitted")]
    AlreadySubmitted(ApplicationId),
}

impl From<BackendError> for SubmissionError {
    fn from(value: BackendError) -> Self {
        match value {
            BackendError::Unauthenticated => Self::Unauthenticated,
            BackendError::Rejected(reason) => Self::ValidationRejected(reason),
            BackendError::Unavailable(reason) => Self::TransientBackendError(reason),
        }
    }
}

#[derive(Debug, Clone)]
enum GateState {
    Idle,
    InFlight,
    Submitted(SubmissionReceipt),
}

fn lock(state: &Mutex<GateState>) -> MutexGuard<'_, GateState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Writes a completed draft to the store at most once.
///
/// Only one attempt may be in flight; a failed attempt re-opens the gate for a manual
/// retry, a successful one closes it for good. The write runs on its own task, so an
/// issued write always resolves and updates the gate even if the caller stops waiting.
pub struct SubmissionGate<S> {
    store: Arc<S>,
    session: SessionContext,
    state: Arc<Mutex<GateState>>,
}

impl<S> SubmissionGate<S>
where
    S: ApplicationStore + 'static,
{
    pub fn new(store: Arc<S>, session: SessionContext) -> Self {
        Self {
            store,
            session,
            state: Arc::new(Mutex::new(GateState::Idle)),
        }
    }

    pub fn is_in_flight(&self) -> bool {
        matches!(*lock(&self.state), GateState::InFlight)
    }

    pub fn receipt(&self) -> Option<SubmissionReceipt> {
        match &*lock(&self.state) {
            GateState::Submitted(receipt) => Some(receipt.clone()),
            _ => None,
        }
    }

    pub async fn submit(
        &self,
        draft: &ApplicationDraft,
    ) -> Result<SubmissionReceipt, SubmissionError> {
        let details = draft.complete()?;
        let session = self
            .session
            .active(Utc::now())
            .ok_or(SubmissionError::Unauthenticated)?;

        {
            let mut state = lock(&self.state);
            if let GateState::Submitted(receipt) = &*state {
                return Err(SubmissionError::AlreadySubmitted(
                    receipt.application_id.clone(),
                ));
            }
            if matches!(*state, GateState::InFlight) {
                return Err(SubmissionError::InFlight);
            }
            *state = GateState::InFlight;
        }

        info!(
            user_id = %session.user_id,
            amount = details.loan_amount.rupees(),
            "submitting application"
        );

        let write = tokio::spawn(write_application(
            self.store.clone(),
            self.state.clone(),
            session.user_id,
            details,
        ));

        match write.await {
            Ok(outcome) => outcome,
            Err(join_error) => {
                *lock(&self.state) = GateState::Idle;
                warn!(error = %join_error, "submission task ended abnormally");
                Err(SubmissionError::TransientBackendError(
                    "submission was interrupted".to_string(),
                ))
            }
        }
    }
}

async fn write_application<S>(
    store: Arc<S>,
    state: Arc<Mutex<GateState>>,
    user_id: UserId,
    details: LoanApplicationDetails,
) -> Result<SubmissionReceipt, SubmissionError>
where
    S: ApplicationStore + 'static,
{
    let application_id = match store.create_application(&user_id, &details).await {
        Ok(id) => id,
        Err(error) => {
            *lock(&state) = GateState::Idle;
            warn!(%user_id, %error, "application write failed");
            return Err(error.into());
        }
    };

    // Best effort: a failed follow-up write is not rolled back into the primary one.
    let verification_initialized = match store
        .upsert_verification_status(&user_id, VerificationStatus::Pending)
        .await
    {
        Ok(()) => true,
        Err(error) => {
            warn!(%user_id, %application_id, %error, "verification record not initialized");
            false
        }
    };

    let receipt = SubmissionReceipt {
        application_id,
        user_id,
        verification_initialized,
    };
    *lock(&state) = GateState::Submitted(receipt.clone());
    info!(application_id = %receipt.application_id, "application submitted");
    Ok(receipt)
}
