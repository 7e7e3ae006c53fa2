use document_chat::{
    api::{start_server, ApiState},
    config::AppConfig,
    llm::http_client,
    models::Vendor,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables
    dotenv::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = AppConfig::from_env();

    info!("🚀 Document Chat - API Server");
    info!("📍 Port: {}", config.port);
    info!(
        "🧠 Session defaults: {} / {} / {}",
        config.session_defaults.vendor,
        config.session_defaults.model,
        config.session_defaults.memory
    );

    for vendor in [Vendor::OpenAi, Vendor::Anthropic, Vendor::Gemini] {
        if config.api_key(vendor).is_none() {
            warn!("⚠️  {} API key not set in .env; sessions using it will fail", vendor);
        }
    }

    let port = config.port;
    let state = ApiState::new(config, http_client()?);

    info!("📡 Starting API server...");

    start_server(state, port).await?;

    Ok(())
}
