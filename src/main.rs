use anyhow::Result;
use sharecal::cli;

#[tokio::main]
async fn main() -> Result<()> {
    cli::run().await
}
