use tinyrpg::prelude::*;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let addr = std::env::args()
        .nth(1)
        .unwrap_or_else(|| format!("0.0.0.0:{DEFAULT_PORT}"));

    let server = ServerBuilder::new().bind(&addr).build().await?;
    tracing::info!(%addr, "tinyrpg session authority listening");
    server.run().await?;
    Ok(())
}
