use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::backend::{
    ApplicationId, ApplicationSummary, LoanApplicationStatus, VerificationStatus,
};
use crate::workflows::intake::LoanApplicationDetails;
use crate::workflows::FunnelRoute;

/// What the status page offers the user next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NextAction {
    CompleteKyc,
    ProceedToDisbursal,
    ApplyAgain,
    Wait,
}

impl NextAction {
    pub fn decide(loan: LoanApplicationStatus, verification: Option<VerificationStatus>) -> Self {
        if verification == Some(VerificationStatus::Pending) {
            return Self::CompleteKyc;
        }
        match loan {
            LoanApplicationStatus::Approved => Self::ProceedToDisbursal,
            LoanApplicationStatus::Rejected => Self::ApplyAgain,
            LoanApplicationStatus::Pending | LoanApplicationStatus::UnderReview => Self::Wait,
        }
    }

    /// Page the action links to, if it leaves the status page.
    pub const fn route(self) -> Option<FunnelRoute> {
        match self {
            Self::CompleteKyc => Some(FunnelRoute::Kyc),
            Self::ApplyAgain => Some(FunnelRoute::Application),
            Self::ProceedToDisbursal | Self::Wait => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct LoanStatusView {
    pub application_id: ApplicationId,
    pub status: LoanApplicationStatus,
    pub label: &'static str,
    pub headline: &'static str,
    pub details: LoanApplicationDetails,
    pub loan_amount_display: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct VerificationView {
    pub status: VerificationStatus,
    pub label: &'static str,
    pub headline: &'static str,
}

/// Newest application with its verification record, ready to render.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct StatusView {
    pub loan: LoanStatusView,
    pub verification: Option<VerificationView>,
    pub next_action: NextAction,
    pub next_route: Option<&'static str>,
}

impl StatusView {
    pub fn new(summary: ApplicationSummary, verification: Option<VerificationStatus>) -> Self {
        let next_action = NextAction::decide(summary.status, verification);
        Self {
            loan: LoanStatusView {
                label: summary.status.label(),
                headline: summary.status.headline(),
                loan_amount_display: summary.details.loan_amount.to_string(),
                application_id: summary.id,
                status: summary.status,
                details: summary.details,
                created_at: summary.created_at,
            },
            verification: verification.map(|status| VerificationView {
                status,
                label: status.label(),
                headline: status.headline(),
            }),
            next_action,
            next_route: next_action.route().map(FunnelRoute::path),
        }
    }
}
