mod cli;
mod console;
mod infra;
mod routes;
mod server;

use triage_ai::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
