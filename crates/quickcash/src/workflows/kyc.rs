//! Two-field KYC form: PAN and Aadhaar captured in parallel, completed once both pass.

use std::fmt;
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, info};

use super::FunnelRoute;
use crate::config::FunnelConfig;
use crate::identity::{IdentityField, ValidationError};

/// Render state of one field after a keystroke.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldSnapshot {
    pub field: IdentityField,
    pub canonical: String,
    pub display: String,
    pub masked: String,
    pub error: Option<ValidationError>,
    pub message: Option<&'static str>,
}

impl FieldSnapshot {
    /// Reformat raw input and evaluate it. Empty input carries no error.
    pub fn capture(field: IdentityField, raw: &str) -> Self {
        let canonical = field.format(raw);
        Self::of_canonical(field, canonical)
    }

    fn of_canonical(field: IdentityField, canonical: String) -> Self {
        let error = if canonical.is_empty() {
            None
        } else {
            field.validate(&canonical).err()
        };
        Self {
            field,
            display: field.display(&canonical),
            masked: field.mask(&canonical),
            message: error.map(|error| field.message(error)),
            error,
            canonical,
        }
    }

    pub fn is_valid(&self) -> bool {
        !self.canonical.is_empty() && self.error.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum KycError {
    #[error("KYC details were already accepted")]
    AlreadyCompleted,
    #[error("{}: {}", .field.label(), .reason)]
    Invalid {
        field: IdentityField,
        reason: ValidationError,
    },
    #[error("both PAN and Aadhaar must be valid before continuing")]
    Incomplete,
}

/// A validated PAN/Aadhaar pair in canonical form.
///
/// `Debug` prints the masked values so the pair can appear in logs.
#[derive(Clone, PartialEq, Eq)]
pub struct IdentityDocuments {
    pan: String,
    aadhaar: String,
}

impl IdentityDocuments {
    pub fn new(pan: &str, aadhaar: &str) -> Result<Self, KycError> {
        let pan = canonical_valid(IdentityField::Pan, pan)?;
        let aadhaar = canonical_valid(IdentityField::Aadhaar, aadhaar)?;
        Ok(Self { pan, aadhaar })
    }

    pub fn pan(&self) -> &str {
        &self.pan
    }

    pub fn aadhaar(&self) -> &str {
        &self.aadhaar
    }

    pub fn masked_pan(&self) -> String {
        IdentityField::Pan.mask(&self.pan)
    }

    pub fn masked_aadhaar(&self) -> String {
        IdentityField::Aadhaar.mask(&self.aadhaar)
    }
}

impl fmt::Debug for IdentityDocuments {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IdentityDocuments")
            .field("pan", &self.masked_pan())
            .field("aadhaar", &self.masked_aadhaar())
            .finish()
    }
}

fn canonical_valid(field: IdentityField, raw: &str) -> Result<String, KycError> {
    let canonical = field.format(raw);
    field
        .validate(&canonical)
        .map_err(|reason| KycError::Invalid { field, reason })?;
    Ok(canonical)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum KycPhase {
    Collecting,
    Completed,
}

/// The KYC page state. One-shot: once both fields validate, input is refused.
#[derive(Debug)]
pub struct KycForm {
    pan: String,
    aadhaar: String,
    phase: KycPhase,
    completion_delay: Duration,
}

impl KycForm {
    pub fn new(completion_delay: Duration) -> Self {
        Self {
            pan: String::new(),
            aadhaar: String::new(),
            phase: KycPhase::Collecting,
            completion_delay,
        }
    }

    pub fn from_config(config: &FunnelConfig) -> Self {
        Self::new(config.kyc_completion_delay)
    }

    pub fn phase(&self) -> KycPhase {
        self.phase
    }

    pub fn is_complete(&self) -> bool {
        self.phase == KycPhase::Completed
    }

    pub fn input_pan(&mut self, raw: &str) -> Result<FieldSnapshot, KycError> {
        self.input(IdentityField::Pan, raw)
    }

    pub fn input_aadhaar(&mut self, raw: &str) -> Result<FieldSnapshot, KycError> {
        self.input(IdentityField::Aadhaar, raw)
    }

    /// Replace the field with the reformatted keystroke value.
    pub fn input(&mut self, field: IdentityField, raw: &str) -> Result<FieldSnapshot, KycError> {
        if self.is_complete() {
            return Err(KycError::AlreadyCompleted);
        }

        let snapshot = FieldSnapshot::capture(field, raw);
        match field {
            IdentityField::Pan => self.pan.clone_from(&snapshot.canonical),
            IdentityField::Aadhaar => self.aadhaar.clone_from(&snapshot.canonical),
        }
        debug!(?field, valid = snapshot.is_valid(), "kyc field updated");

        if self.snapshot(IdentityField::Pan).is_valid()
            && self.snapshot(IdentityField::Aadhaar).is_valid()
        {
            self.phase = KycPhase::Completed;
            info!(documents = ?self.documents(), "kyc details completed");
        }
        Ok(snapshot)
    }

    pub fn snapshot(&self, field: IdentityField) -> FieldSnapshot {
        let canonical = match field {
            IdentityField::Pan => self.pan.clone(),
            IdentityField::Aadhaar => self.aadhaar.clone(),
        };
        FieldSnapshot::of_canonical(field, canonical)
    }

    pub fn documents(&self) -> Option<IdentityDocuments> {
        IdentityDocuments::new(&self.pan, &self.aadhaar).ok()
    }

    /// Wait out the completion delay, then hand over to the eligible-partners page.
    pub async fn proceed(&self) -> Result<FunnelRoute, KycError> {
        if !self.is_complete() {
            return Err(KycError::Incomplete);
        }
        tokio::time::sleep(self.completion_delay).await;
        Ok(FunnelRoute::EligibleApps)
    }
}

impl Default for KycForm {
    fn default() -> Self {
        Self::from_config(&FunnelConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use tokio::time::Instant;

    use super::*;

    #[test]
    fn keystrokes_are_reformatted_and_masked() {
        let mut form = KycForm::default();

        let partial = form.input_pan("abcde12").expect("collecting");
        assert_eq!(partial.canonical, "ABCDE12");
        assert_eq!(partial.error, Some(ValidationError::WrongLength { expected: 10, found: 7 }));

        let pan = form.input_pan("abcde-1234-f").expect("collecting");
        assert_eq!(pan.canonical, "ABCDE1234F");
        assert_eq!(pan.display, "ABCDE 1234 F");
        assert!(pan.is_valid());
        assert!(!pan.masked.contains("CDE123"));
        assert!(!form.is_complete());
    }

    #[test]
    fn empty_field_has_no_error() {
        let snapshot = FieldSnapshot::capture(IdentityField::Aadhaar, "--");
        assert_eq!(snapshot.canonical, "");
        assert_eq!(snapshot.error, None);
        assert!(!snapshot.is_valid());
    }

    #[test]
    fn aadhaar_leading_digit_gets_its_own_message() {
        let snapshot = FieldSnapshot::capture(IdentityField::Aadhaar, "1234 5678 9012");
        assert_eq!(snapshot.error, Some(ValidationError::InvalidLeadingDigit));
        assert_eq!(snapshot.message, Some("Aadhaar number must start with 2-9"));
    }

    #[test]
    fn both_valid_fields_complete_the_form() {
        let mut form = KycForm::default();
        form.input_aadhaar("2345 6789 0123").expect("collecting");
        assert_eq!(form.phase(), KycPhase::Collecting);
        form.input_pan("ABCDE1234F").expect("collecting");

        assert_eq!(form.phase(), KycPhase::Completed);
        assert_eq!(form.input_pan("X"), Err(KycError::AlreadyCompleted));

        let documents = form.documents().expect("valid pair");
        assert_eq!(documents.pan(), "ABCDE1234F");
        assert_eq!(documents.aadhaar(), "234567890123");
    }

    #[test]
    fn documents_debug_never_prints_numbers() {
        let documents = IdentityDocuments::new("ABCDE1234F", "234567890123").expect("valid");
        let printed = format!("{documents:?}");
        assert!(!printed.contains("ABCDE1234F"));
        assert!(!printed.contains("23456789"));
        assert!(printed.contains("0123"));
    }

    #[test]
    fn documents_reject_invalid_fields() {
        assert_eq!(
            IdentityDocuments::new("ABCDE1234F", "034567890123"),
            Err(KycError::Invalid {
                field: IdentityField::Aadhaar,
                reason: ValidationError::InvalidLeadingDigit
            })
        );
    }

    #[tokio::test(start_paused = true)]
    async fn proceeds_after_completion_delay() {
        let mut form = KycForm::new(Duration::from_millis(800));
        assert_eq!(form.proceed().await, Err(KycError::Incomplete));

        form.input_pan("ABCDE1234F").expect("collecting");
        form.input_aadhaar("234567890123").expect("collecting");

        let start = Instant::now();
        assert_eq!(form.proceed().await, Ok(FunnelRoute::EligibleApps));
        assert_eq!(Instant::now() - start, Duration::from_millis(800));
    }
}
