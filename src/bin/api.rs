use financial_doc_qa::{
    api::{start_server, ApiState},
    config::AppConfig,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables
    dotenv::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("financial_doc_qa=info,tower_http=info")),
        )
        .init();

    let config = AppConfig::from_env()?;
    let port = config.port;

    info!("Financial Document Q&A - API Server");
    info!(
        port,
        sheet_mode = ?config.sheet_mode,
        history_limit = config.history_limit,
        max_upload_bytes = config.max_upload_bytes,
        "Configuration loaded"
    );

    let state = ApiState::new(config);

    info!("Starting API server...");
    start_server(state, port).await?;

    Ok(())
}
