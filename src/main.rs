use anyhow::Result;
use gcal_proxy::cli;

#[tokio::main]
async fn main() -> Result<()> {
    cli::run().await
}
