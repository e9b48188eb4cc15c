//! Eligible-partners countdown and the one-time platform fee.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::time::{interval_at, Instant};
use tracing::info;

use super::FunnelRoute;
use crate::config::FunnelConfig;

const COUNTDOWN_TICK: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PartnerApp {
    pub name: &'static str,
    pub logo: &'static str,
    pub eligible: bool,
}

pub const PARTNER_APPS: [PartnerApp; 6] = [
    PartnerApp {
        name: "KreditBee",
        logo: "🐝",
        eligible: true,
    },
    PartnerApp {
        name: "MoneyTap",
        logo: "💰",
        eligible: true,
    },
    PartnerApp {
        name: "CASHe",
        logo: "💳",
        eligible: true,
    },
    PartnerApp {
        name: "PaySense",
        logo: "💸",
        eligible: true,
    },
    PartnerApp {
        name: "EarlySalary",
        logo: "⏰",
        eligible: true,
    },
    PartnerApp {
        name: "Fibe",
        logo: "🔥",
        eligible: true,
    },
];

/// Partners the applicant can be referred to.
pub fn eligible_partners() -> impl Iterator<Item = &'static PartnerApp> {
    PARTNER_APPS.iter().filter(|app| app.eligible)
}

/// One-second countdown shown under the partner list before moving to the fee page.
#[derive(Debug, Clone)]
pub struct EligibilityCountdown {
    remaining: u32,
    tick: Duration,
}

impl EligibilityCountdown {
    pub fn new(ticks: u32) -> Self {
        Self {
            remaining: ticks,
            tick: COUNTDOWN_TICK,
        }
    }

    pub fn from_config(config: &FunnelConfig) -> Self {
        Self::new(config.eligibility_countdown)
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    /// Apply one elapsed tick. Returns the next route once the count runs out.
    pub fn tick(&mut self) -> Option<FunnelRoute> {
        if self.remaining <= 1 {
            self.remaining = 0;
            return Some(FunnelRoute::PlatformFee);
        }
        self.remaining -= 1;
        None
    }

    /// Drive the countdown in real time. The first tick lands one period after the call.
    pub async fn run(&mut self) -> FunnelRoute {
        let mut ticks = interval_at(Instant::now() + self.tick, self.tick);
        loop {
            ticks.tick().await;
            if let Some(route) = self.tick() {
                return route;
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaymentReceipt {
    pub amount_inr: u32,
    pub paid_at: DateTime<Utc>,
    pub next: FunnelRoute,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CheckoutError {
    #[error("accept the terms and conditions to continue")]
    TermsNotAccepted,
    #[error("the platform fee has already been paid")]
    AlreadyPaid,
}

/// Platform fee page. Payment is simulated by a fixed processing delay.
#[derive(Debug)]
pub struct PlatformFeeCheckout {
    fee_inr: u32,
    processing_delay: Duration,
    terms_accepted: bool,
    receipt: Option<PaymentReceipt>,
}

impl PlatformFeeCheckout {
    pub fn new(fee_inr: u32, processing_delay: Duration) -> Self {
        Self {
            fee_inr,
            processing_delay,
            terms_accepted: false,
            receipt: None,
        }
    }

    pub fn from_config(config: &FunnelConfig) -> Self {
        Self::new(config.platform_fee_inr, config.fee_processing_delay)
    }

    pub fn fee_inr(&self) -> u32 {
        self.fee_inr
    }

    pub fn set_terms_accepted(&mut self, accepted: bool) {
        self.terms_accepted = accepted;
    }

    pub fn terms_accepted(&self) -> bool {
        self.terms_accepted
    }

    pub fn receipt(&self) -> Option<&PaymentReceipt> {
        self.receipt.as_ref()
    }

    pub async fn pay(&mut self) -> Result<PaymentReceipt, CheckoutError> {
        if self.receipt.is_some() {
            return Err(CheckoutError::AlreadyPaid);
        }
        if !self.terms_accepted {
            return Err(CheckoutError::TermsNotAccepted);
        }

        tokio::time::sleep(self.processing_delay).await;
        let receipt = PaymentReceipt {
            amount_inr: self.fee_inr,
            paid_at: Utc::now(),
            next: FunnelRoute::PaymentSuccess,
        };
        info!(amount_inr = receipt.amount_inr, "platform fee paid");
        self.receipt = Some(receipt.clone());
        Ok(receipt)
    }
}
