use crate::client::{run_applications, run_jobs, run_transition, ClientArgs, TransitionArgs};
use crate::demo::{run_demo, DemoArgs};
use crate::sandbox;
use clap::{Args, Parser, Subcommand};
use hireflow::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "hireflow",
    about = "Track job applications from the command line, or serve a sandbox job board",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the in-memory job-board API (default command)
    Sandbox(SandboxArgs),
    /// Run an end-to-end hiring scenario against the sandbox or a live API
    Demo(DemoArgs),
    /// List the jobs visible to the signed-in account
    Jobs(ClientArgs),
    /// List applications with per-status counts and available actions
    Applications(ClientArgs),
    /// Move an application to a new status
    Transition(TransitionArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct SandboxArgs {
    /// Override the configured host for the sandbox server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the sandbox server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Sandbox(SandboxArgs::default()));

    match command {
        Command::Sandbox(args) => sandbox::run(args).await,
        Command::Demo(args) => run_demo(args).await,
        Command::Jobs(args) => run_jobs(args).await,
        Command::Applications(args) => run_applications(args).await,
        Command::Transition(args) => run_transition(args).await,
    }
}
