//! Contract with the hosted database-and-auth platform.
//!
//! The platform owns the schema and the transport; the funnel only needs the handful of
//! calls below. [`InMemoryBackend`] implements both traits for the demo service and tests.

mod memory;

use std::fmt;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::session::{SessionCallback, SessionInfo, SessionSubscription, UserId};
use crate::workflows::intake::LoanApplicationDetails;

pub use memory::InMemoryBackend;

/// Identifier of a stored loan application.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ApplicationId(pub String);

impl fmt::Display for ApplicationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Review state of a loan application, as set by the lending back office.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoanApplicationStatus {
    Pending,
    UnderReview,
    Approved,
    Rejected,
}

impl LoanApplicationStatus {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::UnderReview => "under_review",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }

    pub const fn headline(self) -> &'static str {
        match self {
            Self::Pending => "Your application is in queue for review",
            Self::UnderReview => "Your application is being reviewed by our team",
            Self::Approved => "Congratulations! Your loan has been approved",
            Self::Rejected => "Unfortunately, your application was not approved",
        }
    }
}

/// Identity-verification state tracked alongside each user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationStatus {
    Pending,
    Completed,
    UnderReview,
    Approved,
    Rejected,
}

impl VerificationStatus {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
            Self::UnderReview => "under_review",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }

    pub const fn headline(self) -> &'static str {
        match self {
            Self::Approved => "Your documents have been verified successfully",
            Self::UnderReview => "Your documents are being reviewed",
            _ => "Complete your KYC verification",
        }
    }
}

/// Stored application as returned by [`ApplicationStore::find_applications`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationSummary {
    pub id: ApplicationId,
    pub user_id: UserId,
    pub details: LoanApplicationDetails,
    pub status: LoanApplicationStatus,
    pub created_at: DateTime<Utc>,
}

/// Failure reported by the hosted platform.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BackendError {
    #[error("backend unavailable: {0}")]
    Unavailable(String),
    #[error("no authenticated session")]
    Unauthenticated,
    #[error("backend rejected the request: {0}")]
    Rejected(String),
}

/// Session half of the hosted platform.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    async fn get_session(&self) -> Result<Option<SessionInfo>, BackendError>;

    /// Register for login/logout notifications. Dropping the returned handle unregisters.
    fn on_session_change(&self, callback: SessionCallback) -> SessionSubscription;
}

/// Data half of the hosted platform.
///
/// `create_application` is not idempotent: each call may create a new row.
#[async_trait]
pub trait ApplicationStore: Send + Sync {
    /// Applications for `user_id`, newest first.
    async fn find_applications(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<ApplicationSummary>, BackendError>;

    async fn create_application(
        &self,
        user_id: &UserId,
        details: &LoanApplicationDetails,
    ) -> Result<ApplicationId, BackendError>;

    async fn upsert_verification_status(
        &self,
        user_id: &UserId,
        status: VerificationStatus,
    ) -> Result<(), BackendError>;

    async fn fetch_verification_status(
        &self,
        user_id: &UserId,
    ) -> Result<Option<VerificationStatus>, BackendError>;
}
