use crate::infra::{demo_backend, demo_user};
use clap::Args;
use quickcash::config::{AppConfig, FunnelConfig};
use quickcash::error::AppError;
use quickcash::identity::IdentityField;
use quickcash::session::SessionContext;
use quickcash::workflows::checkout::{
    eligible_partners, EligibilityCountdown, PlatformFeeCheckout,
};
use quickcash::workflows::intake::{
    AgeGroup, City, EmploymentType, IncomeBand, IntakeWizard, LoanAmount, StepInput, Transition,
};
use quickcash::workflows::kyc::{FieldSnapshot, KycForm};
use quickcash::workflows::status::SessionStatusResolver;
use std::time::Duration;

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Skip every configured delay (auto-advance, countdown, fee processing).
    #[arg(long)]
    pub(crate) fast: bool,
    /// Stop after the intake wizard submits.
    #[arg(long)]
    pub(crate) skip_checkout: bool,
}

#[derive(Args, Debug)]
pub(crate) struct KycArgs {
    /// PAN as typed, separators allowed
    #[arg(long)]
    pub(crate) pan: String,
    /// Aadhaar as typed, separators allowed
    #[arg(long)]
    pub(crate) aadhaar: String,
}

pub(crate) fn run_kyc_check(args: KycArgs) -> Result<(), AppError> {
    let pan = FieldSnapshot::capture(IdentityField::Pan, &args.pan);
    let aadhaar = FieldSnapshot::capture(IdentityField::Aadhaar, &args.aadhaar);

    println!("KYC check (numbers masked)");
    render_snapshot(&pan);
    render_snapshot(&aadhaar);
    if pan.is_valid() && aadhaar.is_valid() {
        println!("Both documents valid: ready for verification");
    } else {
        println!("Correct the fields above and retry");
    }
    Ok(())
}

fn render_snapshot(snapshot: &FieldSnapshot) {
    println!(
        "- {}: {} ({})",
        snapshot.field.label(),
        snapshot.masked,
        verdict(snapshot)
    );
}

/// Error message for a rejected value, the input hint for an empty one.
fn verdict(snapshot: &FieldSnapshot) -> &'static str {
    match snapshot.message {
        Some(message) => message,
        None if snapshot.is_valid() => "valid",
        None => snapshot.field.hint(),
    }
}

pub(crate) async fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?.funnel;
    if args.fast {
        config = FunnelConfig {
            auto_advance_delay: Duration::ZERO,
            kyc_completion_delay: Duration::ZERO,
            eligibility_countdown: 1,
            fee_processing_delay: Duration::ZERO,
            ..config
        };
    }

    println!("QuickCash funnel demo");
    let backend = demo_backend(false);
    let binding = SessionContext::attach(backend.as_ref()).await?;
    let session = binding.context().clone();
    let resolver = SessionStatusResolver::new(backend.clone(), backend.clone(), session.clone());

    let route = resolver.initial_route().await;
    println!(
        "- Signed in as {} -> landing on {}",
        demo_user().user_id,
        route.path()
    );

    println!("\nIntake wizard (auto-advance after {:?})", config.auto_advance_delay);
    let mut wizard = IntakeWizard::from_config(backend.clone(), session, &config);
    for answer in demo_answers() {
        let step = answer.step();
        println!("  {} {}", step.prompt(), describe(&answer));
        if let Err(err) = wizard.select(answer) {
            println!("  Answer rejected: {err}");
            return Ok(());
        }
        match wizard.run_auto_advance().await {
            Ok(Transition::Moved { to, .. }) => println!("    -> {:?}", to),
            Ok(Transition::Submitted(receipt)) => println!(
                "    -> submitted application {} (verification record initialized: {})",
                receipt.application_id, receipt.verification_initialized
            ),
            Ok(Transition::Unchanged(step)) => println!("    -> still on {:?}", step),
            Err(err) => {
                println!("  Submission failed: {err}");
                return Ok(());
            }
        }
    }

    match resolver.status_view().await {
        Ok(view) => {
            println!("\nStatus: {} ({})", view.loan.headline, view.loan.loan_amount_display);
            println!("  Next action: {:?}", view.next_action);
        }
        Err(err) => println!("\nStatus unavailable: {err}"),
    }

    if args.skip_checkout {
        return Ok(());
    }

    println!("\nKYC");
    let mut kyc = KycForm::from_config(&config);
    for (field, raw) in [
        (IdentityField::Pan, "abcde 1234 f"),
        (IdentityField::Aadhaar, "2345 6789 0123"),
    ] {
        match kyc.input(field, raw) {
            Ok(snapshot) => render_snapshot(&snapshot),
            Err(err) => println!("  {err}"),
        }
    }
    match kyc.proceed().await {
        Ok(route) => println!("  -> {}", route.path()),
        Err(err) => {
            println!("  {err}");
            return Ok(());
        }
    }

    println!("\nYou are eligible to apply with these trusted apps:");
    for partner in eligible_partners() {
        println!("  {} {}", partner.logo, partner.name);
    }
    let route = EligibilityCountdown::from_config(&config).run().await;
    println!("  -> {}", route.path());

    let mut checkout = PlatformFeeCheckout::from_config(&config);
    checkout.set_terms_accepted(true);
    match checkout.pay().await {
        Ok(receipt) => println!(
            "\nPlatform fee of ₹{} paid -> {}",
            receipt.amount_inr,
            receipt.next.path()
        ),
        Err(err) => println!("\nPayment failed: {err}"),
    }

    Ok(())
}

fn demo_answers() -> Vec<StepInput> {
    let mut answers = Vec::with_capacity(5);
    if let Ok(amount) = LoanAmount::new(500_000) {
        answers.push(StepInput::LoanAmount(amount));
    }
    answers.push(StepInput::EmploymentType(EmploymentType::Salaried));
    answers.push(StepInput::MonthlyIncome(IncomeBand::From40KTo60K));
    answers.push(StepInput::AgeGroup(AgeGroup::From26To30));
    if let Some(city) = City::known("Pune") {
        answers.push(StepInput::City(city));
    }
    answers
}

fn describe(answer: &StepInput) -> String {
    match answer {
        StepInput::LoanAmount(amount) => amount.to_string(),
        StepInput::EmploymentType(value) => value.to_string(),
        StepInput::MonthlyIncome(value) => value.to_string(),
        StepInput::AgeGroup(value) => value.to_string(),
        StepInput::City(value) => value.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quickcash::identity::ValidationError;

    #[test]
    fn demo_answers_cover_every_step() {
        let steps: Vec<_> = demo_answers().iter().map(StepInput::step).collect();
        assert_eq!(steps.len(), 5);
        assert!(steps.windows(2).all(|pair| pair[0].next() == Some(pair[1])));
    }

    #[test]
    fn verdict_points_empty_fields_at_the_expected_format() {
        let empty = FieldSnapshot::capture(IdentityField::Aadhaar, "");
        assert_eq!(verdict(&empty), IdentityField::Aadhaar.hint());

        let valid = FieldSnapshot::capture(IdentityField::Pan, "abcde1234f");
        assert_eq!(verdict(&valid), "valid");

        let short = FieldSnapshot::capture(IdentityField::Pan, "abc");
        assert_eq!(verdict(&short), IdentityField::Pan.message(ValidationError::InvalidPattern));
    }

    #[tokio::test(start_paused = true)]
    async fn fast_demo_completes() {
        let args = DemoArgs {
            fast: true,
            skip_checkout: false,
        };
        run_demo(args).await.expect("demo runs");
    }
}
