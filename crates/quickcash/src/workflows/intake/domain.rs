use std::fmt;

use serde::{Deserialize, Serialize};

pub const MIN_LOAN_AMOUNT: u32 = 1_000;
pub const MAX_LOAN_AMOUNT: u32 = 10_000_000;
const MAX_CITY_LEN: usize = 64;

/// Cities offered as suggestions on the last intake step.
pub const KNOWN_CITIES: [&str; 20] = [
    "Ahmedabad",
    "Bengaluru",
    "Bhopal",
    "Chandigarh",
    "Chennai",
    "Coimbatore",
    "Delhi",
    "Hyderabad",
    "Indore",
    "Jaipur",
    "Kochi",
    "Kolkata",
    "Lucknow",
    "Mumbai",
    "Nagpur",
    "Noida",
    "Patna",
    "Pune",
    "Surat",
    "Visakhapatnam",
];

/// Field-level rejection raised while parsing a single intake answer.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FieldError {
    #[error("loan amount must be between ₹{min} and ₹{max} (found {found})")]
    AmountOutOfRange { min: u32, max: u32, found: u64 },
    #[error("loan amount must be a whole number of rupees")]
    AmountNotNumeric,
    #[error("city cannot be empty")]
    EmptyCity,
    #[error("city name is longer than {max} characters")]
    CityTooLong { max: usize },
    #[error("'{label}' is not a recognised {field} option")]
    UnknownOption { field: DraftField, label: String },
}

/// Requested principal in whole rupees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct LoanAmount(u32);

impl LoanAmount {
    pub fn new(rupees: u32) -> Result<Self, FieldError> {
        if (MIN_LOAN_AMOUNT..=MAX_LOAN_AMOUNT).contains(&rupees) {
            Ok(Self(rupees))
        } else {
            Err(FieldError::AmountOutOfRange {
                min: MIN_LOAN_AMOUNT,
                max: MAX_LOAN_AMOUNT,
                found: u64::from(rupees),
            })
        }
    }

    /// Parse typed input such as `₹5,00,000` or `500000`.
    pub fn parse(raw: &str) -> Result<Self, FieldError> {
        let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
        if digits.is_empty() {
            return Err(FieldError::AmountNotNumeric);
        }
        let value: u64 = digits.parse().map_err(|_| FieldError::AmountOutOfRange {
            min: MIN_LOAN_AMOUNT,
            max: MAX_LOAN_AMOUNT,
            found: u64::MAX,
        })?;
        let rupees = u32::try_from(value).map_err(|_| FieldError::AmountOutOfRange {
            min: MIN_LOAN_AMOUNT,
            max: MAX_LOAN_AMOUNT,
            found: value,
        })?;
        Self::new(rupees)
    }

    pub const fn rupees(self) -> u32 {
        self.0
    }
}

impl TryFrom<u32> for LoanAmount {
    type Error = FieldError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<LoanAmount> for u32 {
    fn from(value: LoanAmount) -> Self {
        value.0
    }
}

impl fmt::Display for LoanAmount {
    /// Indian digit grouping: `₹5,00,000`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let digits = self.0.to_string();
        let (head, tail) = if digits.len() > 3 {
            digits.split_at(digits.len() - 3)
        } else {
            ("", digits.as_str())
        };

        let mut grouped = String::new();
        let head_chars: Vec<char> = head.chars().collect();
        for (index, ch) in head_chars.iter().enumerate() {
            if index > 0 && (head_chars.len() - index) % 2 == 0 {
                grouped.push(',');
            }
            grouped.push(*ch);
        }
        if !grouped.is_empty() {
            grouped.push(',');
        }
        grouped.push_str(tail);
        write!(f, "₹{grouped}")
    }
}

macro_rules! labelled_enum {
    (
        $(#[$meta:meta])*
        $name:ident, $field:expr, {
            $($variant:ident => $label:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(
                #[serde(rename = $label)]
                $variant,
            )+
        }

        impl $name {
            pub const ALL: &'static [Self] = &[$(Self::$variant),+];

            pub const fn label(self) -> &'static str {
                match self {
                    $(Self::$variant => $label,)+
                }
            }

            pub fn from_label(label: &str) -> Result<Self, FieldError> {
                let wanted = label.trim();
                Self::ALL
                    .iter()
                    .copied()
                    .find(|option| option.label().eq_ignore_ascii_case(wanted))
                    .ok_or_else(|| FieldError::UnknownOption {
                        field: $field,
                        label: wanted.to_string(),
                    })
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.label())
            }
        }
    };
}

labelled_enum!(
    /// How the applicant earns a living.
    EmploymentType, DraftField::EmploymentType, {
        Salaried => "Salaried",
        SelfEmployed => "Self-Employed",
        Student => "Student",
    }
);

labelled_enum!(
    /// Declared monthly take-home income.
    IncomeBand, DraftField::MonthlyIncome, {
        Below20K => "Below ₹20K",
        From20KTo40K => "₹20K - ₹40K",
        From40KTo60K => "₹40K - ₹60K",
        From60KTo80K => "₹60K - ₹80K",
        From80KTo1L => "₹80K - ₹1L",
        Above1L => "Above ₹1L",
    }
);

labelled_enum!(
    AgeGroup, DraftField::AgeGroup, {
        From18To21 => "18-21",
        From22To25 => "22-25",
        From26To30 => "26-30",
        From31To35 => "31-35",
        From36To40 => "36-40",
        From41To50 => "41-50",
        Above50 => "50+",
    }
);

/// Trimmed, non-empty city name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct City(String);

impl City {
    pub fn parse(raw: &str) -> Result<Self, FieldError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(FieldError::EmptyCity);
        }
        if trimmed.chars().count() > MAX_CITY_LEN {
            return Err(FieldError::CityTooLong { max: MAX_CITY_LEN });
        }
        Ok(Self(trimmed.to_string()))
    }

    /// The matching entry from [`KNOWN_CITIES`], using its canonical spelling.
    pub fn known(raw: &str) -> Option<Self> {
        let wanted = raw.trim();
        KNOWN_CITIES
            .iter()
            .find(|city| city.eq_ignore_ascii_case(wanted))
            .map(|city| Self((*city).to_string()))
    }

    pub fn is_known(&self) -> bool {
        KNOWN_CITIES
            .iter()
            .any(|city| city.eq_ignore_ascii_case(&self.0))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for City {
    type Error = FieldError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<City> for String {
    fn from(value: City) -> Self {
        value.0
    }
}

impl fmt::Display for City {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Known cities starting with the typed prefix, case-insensitively. Empty input yields nothing.
pub fn city_suggestions(typed: &str) -> Vec<&'static str> {
    let prefix = typed.trim().to_lowercase();
    if prefix.is_empty() {
        return Vec::new();
    }
    KNOWN_CITIES
        .iter()
        .copied()
        .filter(|city| city.to_lowercase().starts_with(&prefix))
        .collect()
}

/// The five answers collected by the intake wizard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DraftField {
    LoanAmount,
    EmploymentType,
    MonthlyIncome,
    AgeGroup,
    City,
}

impl DraftField {
    pub const fn label(self) -> &'static str {
        match self {
            Self::LoanAmount => "loan amount",
            Self::EmploymentType => "employment type",
            Self::MonthlyIncome => "monthly income",
            Self::AgeGroup => "age group",
            Self::City => "city",
        }
    }
}

impl fmt::Display for DraftField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Submission attempted before every answer was collected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("application is incomplete; missing {}", join_fields(.missing))]
pub struct IncompleteDraft {
    pub missing: Vec<DraftField>,
}

fn join_fields(fields: &[DraftField]) -> String {
    fields
        .iter()
        .map(|field| field.label())
        .collect::<Vec<_>>()
        .join(", ")
}

/// In-memory application record, filled one step at a time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationDraft {
    pub loan_amount: Option<LoanAmount>,
    pub employment_type: Option<EmploymentType>,
    pub monthly_income: Option<IncomeBand>,
    pub age_group: Option<AgeGroup>,
    pub city: Option<City>,
}

impl ApplicationDraft {
    pub fn is_set(&self, field: DraftField) -> bool {
        match field {
            DraftField::LoanAmount => self.loan_amount.is_some(),
            DraftField::EmploymentType => self.employment_type.is_some(),
            DraftField::MonthlyIncome => self.monthly_income.is_some(),
            DraftField::AgeGroup => self.age_group.is_some(),
            DraftField::City => self.city.is_some(),
        }
    }

    pub fn missing_fields(&self) -> Vec<DraftField> {
        [
            DraftField::LoanAmount,
            DraftField::EmploymentType,
            DraftField::MonthlyIncome,
            DraftField::AgeGroup,
            DraftField::City,
        ]
        .into_iter()
        .filter(|field| !self.is_set(*field))
        .collect()
    }

    pub fn is_complete(&self) -> bool {
        self.missing_fields().is_empty()
    }

    /// The write payload, available once every field is set.
    pub fn complete(&self) -> Result<LoanApplicationDetails, IncompleteDraft> {
        match (
            self.loan_amount,
            self.employment_type,
            self.monthly_income,
            self.age_group,
            self.city.as_ref(),
        ) {
            (
                Some(loan_amount),
                Some(employment_type),
                Some(monthly_income),
                Some(age_group),
                Some(city),
            ) => Ok(LoanApplicationDetails {
                loan_amount,
                employment_type,
                monthly_income,
                age_group,
                city: city.clone(),
            }),
            _ => Err(IncompleteDraft {
                missing: self.missing_fields(),
            }),
        }
    }
}

/// A complete set of intake answers as written to the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanApplicationDetails {
    pub loan_amount: LoanAmount,
    pub employment_type: EmploymentType,
    pub monthly_income: IncomeBand,
    pub age_group: AgeGroup,
    pub city: City,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loan_amount_bounds() {
        assert!(LoanAmount::new(MIN_LOAN_AMOUNT).is_ok());
        assert!(LoanAmount::new(MAX_LOAN_AMOUNT).is_ok());
        assert!(matches!(
            LoanAmount::new(999),
            Err(FieldError::AmountOutOfRange { found: 999, .. })
        ));
        assert!(LoanAmount::new(MAX_LOAN_AMOUNT + 1).is_err());
    }

    #[test]
    fn loan_amount_parses_grouped_input() {
        assert_eq!(
            LoanAmount::parse("₹5,00,000").map(LoanAmount::rupees),
            Ok(500_000)
        );
        assert_eq!(LoanAmount::parse("rupees"), Err(FieldError::AmountNotNumeric));
        assert!(matches!(
            LoanAmount::parse("99999999999"),
            Err(FieldError::AmountOutOfRange { .. })
        ));
    }

    #[test]
    fn loan_amount_displays_indian_grouping() {
        let render = |rupees| LoanAmount::new(rupees).expect("in range").to_string();
        assert_eq!(render(1_000), "₹1,000");
        assert_eq!(render(500_000), "₹5,00,000");
        assert_eq!(render(10_000_000), "₹1,00,00,000");
    }

    #[test]
    fn band_labels_round_trip_through_serde() {
        let json = serde_json::to_string(&IncomeBand::From40KTo60K).expect("serializes");
        assert_eq!(json, "\"₹40K - ₹60K\"");
        assert_eq!(
            AgeGroup::from_label("26-30").expect("known band"),
            AgeGroup::From26To30
        );
        assert_eq!(IncomeBand::ALL.len(), 6);
        assert_eq!(AgeGroup::ALL.len(), 7);
        assert!(matches!(
            EmploymentType::from_label("Retired"),
            Err(FieldError::UnknownOption {
                field: DraftField::EmploymentType,
                ..
            })
        ));
    }

    #[test]
    fn city_is_trimmed_and_non_empty() {
        assert_eq!(City::parse("  Pune ").expect("valid").as_str(), "Pune");
        assert_eq!(City::parse("   "), Err(FieldError::EmptyCity));
        assert_eq!(City::known("pune").expect("known").as_str(), "Pune");
        assert!(!City::parse("Shillong").expect("valid").is_known());
    }

    #[test]
    fn suggestions_match_prefix() {
        assert_eq!(city_suggestions("pu"), vec!["Pune"]);
        assert_eq!(city_suggestions("  "), Vec::<&str>::new());
        assert_eq!(city_suggestions("b"), vec!["Bengaluru", "Bhopal"]);
    }

    #[test]
    fn incomplete_draft_lists_missing_fields() {
        let draft = ApplicationDraft {
            loan_amount: Some(LoanAmount::new(50_000).expect("in range")),
            age_group: Some(AgeGroup::Above50),
            ..ApplicationDraft::default()
        };
        let error = draft.complete().expect_err("incomplete");
        assert_eq!(
            error.missing,
            vec![
                DraftField::EmploymentType,
                DraftField::MonthlyIncome,
                DraftField::City
            ]
        );
        assert_eq!(
            error.to_string(),
            "application is incomplete; missing employment type, monthly income, city"
        );
    }
}
