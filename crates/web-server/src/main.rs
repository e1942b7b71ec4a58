use tracing_subscriber::EnvFilter;

// Entry point for `cargo run -p web-server`: serves with the configuration
// found in the working directory and environment.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = configuration::load_config(None)?;
    web_server::run_server(&config).await
}
