pub mod checkout;
pub mod intake;
pub mod kyc;
pub mod router;
pub mod status;

use serde::{Deserialize, Serialize};

pub use router::funnel_router;

/// Pages of the funnel a flow can hand the user to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FunnelRoute {
    Login,
    Application,
    Kyc,
    EligibleApps,
    PlatformFee,
    PaymentSuccess,
    Status,
}

impl FunnelRoute {
    pub const fn path(self) -> &'static str {
        match self {
            Self::Login => "/login",
            Self::Application => "/",
            Self::Kyc => "/kyc",
            Self::EligibleApps => "/eligible-apps",
            Self::PlatformFee => "/platform-fee",
            Self::PaymentSuccess => "/payment-success",
            Self::Status => "/status",
        }
    }
}
