use tracing_subscriber::EnvFilter;

use driftspace_server::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "driftspace_server=debug,tower_http=info".into()),
        )
        .init();

    let config = Config::from_env()?;
    driftspace_server::run_server(config).await
}
