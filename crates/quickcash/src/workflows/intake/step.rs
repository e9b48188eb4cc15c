use serde::{Deserialize, Serialize};

use super::domain::{
    AgeGroup, ApplicationDraft, City, DraftField, EmploymentType, FieldError, IncomeBand,
    LoanAmount,
};

/// The five intake screens, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WizardStep {
    LoanAmount,
    EmploymentType,
    MonthlyIncome,
    AgeGroup,
    City,
}

impl WizardStep {
    pub const ORDERED: [Self; 5] = [
        Self::LoanAmount,
        Self::EmploymentType,
        Self::MonthlyIncome,
        Self::AgeGroup,
        Self::City,
    ];

    pub const FIRST: Self = Self::LoanAmount;
    pub const LAST: Self = Self::City;

    pub const fn index(self) -> usize {
        match self {
            Self::LoanAmount => 0,
            Self::EmploymentType => 1,
            Self::MonthlyIncome => 2,
            Self::AgeGroup => 3,
            Self::City => 4,
        }
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ORDERED.get(index).copied()
    }

    pub fn next(self) -> Option<Self> {
        Self::from_index(self.index() + 1)
    }

    pub fn previous(self) -> Option<Self> {
        self.index().checked_sub(1).and_then(Self::from_index)
    }

    pub const fn is_last(self) -> bool {
        matches!(self, Self::City)
    }

    pub const fn field(self) -> DraftField {
        match self {
            Self::LoanAmount => DraftField::LoanAmount,
            Self::EmploymentType => DraftField::EmploymentType,
            Self::MonthlyIncome => DraftField::MonthlyIncome,
            Self::AgeGroup => DraftField::AgeGroup,
            Self::City => DraftField::City,
        }
    }

    pub const fn prompt(self) -> &'static str {
        match self {
            Self::LoanAmount => "How much do you need?",
            Self::EmploymentType => "What do you do?",
            Self::MonthlyIncome => "What is your monthly income?",
            Self::AgeGroup => "How old are you?",
            Self::City => "Which city do you live in?",
        }
    }

    /// Check that `input` answers this step and is acceptable as a qualifying selection.
    pub fn validate(self, input: &StepInput) -> Result<(), StepError> {
        if input.step() != self {
            return Err(StepError::WrongStep {
                expected: self,
                found: input.step(),
            });
        }

        match input {
            StepInput::City(city) if !city.is_known() => {
                Err(StepError::UnlistedCity(city.as_str().to_string()))
            }
            _ => Ok(()),
        }
    }

    /// Validate `input` and write it into the matching draft field.
    pub fn commit(self, draft: &mut ApplicationDraft, input: StepInput) -> Result<(), StepError> {
        self.validate(&input)?;
        input.write_to(draft);
        Ok(())
    }

    pub fn is_answered(self, draft: &ApplicationDraft) -> bool {
        draft.is_set(self.field())
    }
}

/// A value selected on one of the intake screens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "step", content = "value", rename_all = "snake_case")]
pub enum StepInput {
    LoanAmount(LoanAmount),
    EmploymentType(EmploymentType),
    MonthlyIncome(IncomeBand),
    AgeGroup(AgeGroup),
    City(City),
}

impl StepInput {
    pub const fn step(&self) -> WizardStep {
        match self {
            Self::LoanAmount(_) => WizardStep::LoanAmount,
            Self::EmploymentType(_) => WizardStep::EmploymentType,
            Self::MonthlyIncome(_) => WizardStep::MonthlyIncome,
            Self::AgeGroup(_) => WizardStep::AgeGroup,
            Self::City(_) => WizardStep::City,
        }
    }

    pub(crate) fn write_to(self, draft: &mut ApplicationDraft) {
        match self {
            Self::LoanAmount(value) => draft.loan_amount = Some(value),
            Self::EmploymentType(value) => draft.employment_type = Some(value),
            Self::MonthlyIncome(value) => draft.monthly_income = Some(value),
            Self::AgeGroup(value) => draft.age_group = Some(value),
            Self::City(value) => draft.city = Some(value),
        }
    }
}

/// Local rejection of a step answer; recoverable by re-input.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StepError {
    #[error("answer for {found:?} given while on {expected:?}")]
    WrongStep {
        expected: WizardStep,
        found: WizardStep,
    },
    #[error("'{0}' is not in the suggestion list; confirm free-text cities explicitly")]
    UnlistedCity(String),
    #[error("no free-text city has been entered")]
    NoCityEntered,
    #[error(transparent)]
    Field(#[from] FieldError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordering_is_consistent() {
        for (index, step) in WizardStep::ORDERED.iter().enumerate() {
            assert_eq!(step.index(), index);
            assert_eq!(WizardStep::from_index(index), Some(*step));
        }
        assert_eq!(WizardStep::FIRST.previous(), None);
        assert_eq!(WizardStep::LAST.next(), None);
        assert_eq!(
            WizardStep::MonthlyIncome.next(),
            Some(WizardStep::AgeGroup)
        );
    }

    #[test]
    fn commit_rejects_answers_for_other_steps() {
        let mut draft = ApplicationDraft::default();
        let error = WizardStep::LoanAmount
            .commit(&mut draft, StepInput::AgeGroup(AgeGroup::From22To25))
            .expect_err("wrong step");
        assert_eq!(
            error,
            StepError::WrongStep {
                expected: WizardStep::LoanAmount,
                found: WizardStep::AgeGroup
            }
        );
        assert_eq!(draft, ApplicationDraft::default());
    }

    #[test]
    fn city_selection_must_come_from_suggestions() {
        let mut draft = ApplicationDraft::default();
        let unlisted = City::parse("Shillong").expect("valid city");
        assert!(matches!(
            WizardStep::City.commit(&mut draft, StepInput::City(unlisted)),
            Err(StepError::UnlistedCity(_))
        ));

        let listed = City::known("pune").expect("listed");
        WizardStep::City
            .commit(&mut draft, StepInput::City(listed))
            .expect("listed city accepted");
        assert!(WizardStep::City.is_answered(&draft));
    }

    #[test]
    fn inputs_serialize_tagged_by_step() {
        let input = StepInput::MonthlyIncome(IncomeBand::From40KTo60K);
        let json = serde_json::to_value(&input).expect("serializes");
        assert_eq!(
            json,
            serde_json::json!({ "step": "monthly_income", "value": "₹40K - ₹60K" })
        );
    }
}
