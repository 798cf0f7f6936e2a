mod cli;
mod client;
mod demo;
pub mod sandbox;

use hireflow::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
