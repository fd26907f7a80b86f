mod cli;
mod demo;
mod import;
mod infra;
mod routes;
mod server;

use turnover::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
