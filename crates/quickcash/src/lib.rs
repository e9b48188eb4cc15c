//! Core of the QuickCash loan-application funnel.
//!
//! The hosted backend owns persistence and authentication; this crate owns the
//! client-side flow on top of it: identity-number checks, the intake wizard with
//! its auto-advance timer and submission gate, the KYC form, the checkout steps,
//! and the resolver that picks the first page a user lands on.

pub mod backend;
pub mod config;
pub mod error;
pub mod identity;
pub mod session;
pub mod telemetry;
pub mod workflows;
