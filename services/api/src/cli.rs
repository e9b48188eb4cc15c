use crate::demo::{run_demo, run_kyc_check, DemoArgs, KycArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use quickcash::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "QuickCash Funnel",
    about = "Run and demonstrate the QuickCash loan funnel from the command line",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Play a scripted applicant through intake, KYC and checkout
    Demo(DemoArgs),
    /// Check a PAN/Aadhaar pair and print the masked result
    Kyc(KycArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
    /// Sign in a demo applicant with one submitted application
    #[arg(long)]
    pub(crate) seed_demo: bool,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Demo(args) => run_demo(args).await,
        Command::Kyc(args) => run_kyc_check(args),
    }
}
