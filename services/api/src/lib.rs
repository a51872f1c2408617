mod cli;
mod infra;
mod offline;
mod routes;
mod server;

use hostel_allot::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
