//! Formatting, validation, and masking for the two KYC identity numbers.
//!
//! Every function here is pure. `format_*` turns raw keystrokes into the canonical,
//! separator-free value that is validated and stored; `display_*` and `mask_*` are
//! render-time transforms applied on top of a canonical value and never feed back
//! into it.

use serde::{Deserialize, Serialize};

pub const PAN_LEN: usize = 10;
pub const AADHAAR_LEN: usize = 12;

const AADHAAR_GROUP: usize = 4;
const AADHAAR_SEPARATOR: char = '-';

/// Why a canonical identity number was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[serde(rename_all = "snake_case")]
pub enum ValidationError {
    #[error("expected {expected} characters, found {found}")]
    WrongLength { expected: usize, found: usize },
    #[error("value does not match the required pattern")]
    InvalidPattern,
    #[error("value must start with a digit between 2 and 9")]
    InvalidLeadingDigit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentityField {
    Pan,
    Aadhaar,
}

impl IdentityField {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Pan => "PAN Number",
            Self::Aadhaar => "Aadhaar Number",
        }
    }

    /// Helper text shown next to the input.
    pub const fn hint(self) -> &'static str {
        match self {
            Self::Pan => "10-character alphanumeric PAN (e.g., ABCDE1234F)",
            Self::Aadhaar => "12-digit Aadhaar number (e.g., 2345-6789-0123)",
        }
    }

    /// User-facing message for a rejected value.
    pub fn message(self, error: ValidationError) -> &'static str {
        match (self, error) {
            (Self::Pan, _) => "PAN format should be ABCDE1234F (5 letters, 4 digits, 1 letter)",
            (Self::Aadhaar, ValidationError::InvalidLeadingDigit) => {
                "Aadhaar number must start with 2-9"
            }
            (Self::Aadhaar, _) => "Aadhaar must be exactly 12 digits",
        }
    }

    pub fn format(self, raw: &str) -> String {
        match self {
            Self::Pan => format_pan(raw),
            Self::Aadhaar => format_aadhaar(raw),
        }
    }

    pub fn validate(self, canonical: &str) -> Result<(), ValidationError> {
        match self {
            Self::Pan => validate_pan(canonical),
            Self::Aadhaar => validate_aadhaar(canonical),
        }
    }

    pub fn display(self, canonical: &str) -> String {
        match self {
            Self::Pan => display_pan(canonical),
            Self::Aadhaar => display_aadhaar(canonical),
        }
    }

    pub fn mask(self, canonical: &str) -> String {
        match self {
            Self::Pan => mask_pan(canonical),
            Self::Aadhaar => mask_aadhaar(canonical),
        }
    }
}

/// Strip everything but ASCII letters and digits, uppercase, and cap at ten characters.
pub fn format_pan(raw: &str) -> String {
    raw.chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|ch| ch.to_ascii_uppercase())
        .take(PAN_LEN)
        .collect()
}

/// Strip everything but ASCII digits and cap at twelve.
pub fn format_aadhaar(raw: &str) -> String {
    raw.chars()
        .filter(char::is_ascii_digit)
        .take(AADHAAR_LEN)
        .collect()
}

/// Accepts exactly `[A-Z]{5}[0-9]{4}[A-Z]`.
pub fn validate_pan(canonical: &str) -> Result<(), ValidationError> {
    let chars: Vec<char> = canonical.chars().collect();
    if chars.len() != PAN_LEN {
        return Err(ValidationError::WrongLength {
            expected: PAN_LEN,
            found: chars.len(),
        });
    }

    let matches = chars.iter().enumerate().all(|(index, ch)| match index {
        0..=4 | 9 => ch.is_ascii_uppercase(),
        _ => ch.is_ascii_digit(),
    });

    if matches {
        Ok(())
    } else {
        Err(ValidationError::InvalidPattern)
    }
}

/// Accepts exactly twelve digits whose first digit is 2 through 9.
pub fn validate_aadhaar(canonical: &str) -> Result<(), ValidationError> {
    let found = canonical.chars().count();
    if found != AADHAAR_LEN {
        return Err(ValidationError::WrongLength {
            expected: AADHAAR_LEN,
            found,
        });
    }

    if !canonical.chars().all(|ch| ch.is_ascii_digit()) {
        return Err(ValidationError::InvalidPattern);
    }

    match canonical.as_bytes()[0] {
        b'2'..=b'9' => Ok(()),
        _ => Err(ValidationError::InvalidLeadingDigit),
    }
}

/// `ABCDE1234F` renders as `ABCDE 1234 F`; partial input is grouped as far as it goes.
pub fn display_pan(canonical: &str) -> String {
    let chars: Vec<char> = canonical.chars().collect();
    let mut out = String::with_capacity(chars.len() + 2);
    for (index, ch) in chars.iter().enumerate() {
        if index == 5 || index == 9 {
            out.push(' ');
        }
        out.push(*ch);
    }
    out
}

/// Groups digits by four: `2345-6789-0123`.
pub fn display_aadhaar(canonical: &str) -> String {
    group(canonical, AADHAAR_GROUP, AADHAAR_SEPARATOR)
}

/// Reveal the first two and last two characters once more than four are present.
pub fn mask_pan(canonical: &str) -> String {
    MaskWindow {
        threshold: 4,
        prefix: 2,
        suffix: 2,
    }
    .apply(canonical)
}

/// Reveal only the last four digits once more than four are present, then group.
pub fn mask_aadhaar(canonical: &str) -> String {
    let masked = MaskWindow {
        threshold: 4,
        prefix: 0,
        suffix: 4,
    }
    .apply(canonical);
    group(&masked, AADHAAR_GROUP, AADHAAR_SEPARATOR)
}

#[derive(Debug, Clone, Copy)]
struct MaskWindow {
    threshold: usize,
    prefix: usize,
    suffix: usize,
}

impl MaskWindow {
    fn apply(self, value: &str) -> String {
        let len = value.chars().count();
        if len <= self.threshold {
            return value.to_string();
        }

        let hidden_until = len.saturating_sub(self.suffix);
        value
            .chars()
            .enumerate()
            .map(|(index, ch)| {
                if index < self.prefix || index >= hidden_until {
                    ch
                } else {
                    '*'
                }
            })
            .collect()
    }
}

fn group(value: &str, size: usize, separator: char) -> String {
    let mut out = String::with_capacity(value.len() + value.len() / size);
    for (index, ch) in value.chars().enumerate() {
        if index > 0 && index % size == 0 {
            out.push(separator);
        }
        out.push(ch);
    }
    out
}
