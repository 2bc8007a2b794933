use crate::console::{run_analyze, run_queue, run_score, AnalyzeArgs, QueueArgs, ScoreArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use triage_ai::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Emergency Call Triage",
    about = "Triage recorded emergency calls and rank them for dispatch operators",
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
    /// Analyze one recorded call and print its triage card
    Analyze(AnalyzeArgs),
    /// Analyze several calls and print the ranked operator queue
    Queue(QueueArgs),
    /// Score a typed transcript without audio
    Score(ScoreArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Analyze(args) => run_analyze(args),
        Command::Queue(args) => run_queue(args),
        Command::Score(args) => run_score(args),
    }
}
