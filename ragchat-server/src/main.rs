use ragchat_core::ProviderRegistry;
use ragchat_server::{ServerConfig, run_server};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let config = ServerConfig::from_env()?;
    run_server(config, ProviderRegistry::new()).await
}
