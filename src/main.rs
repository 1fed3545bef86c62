use std::sync::Arc;

use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use formease::config::{Config, LogFormat};
use formease::handlers::{create_router, mark_started};
use formease::middleware::logging::logging_middleware;
use formease::services::OllamaClient;
use formease::{db, AppState};

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "formease=debug,tower_http=debug,axum::rejection=trace".into());
    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Text => registry
            .with(tracing_subscriber::fmt::layer().with_target(false))
            .init(),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    mark_started();
    dotenvy::dotenv().ok();

    init_tracing(LogFormat::from_env());

    let config = Config::from_env()?;

    tracing::info!("Starting FormEase v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Max file size: {}MB", config.max_file_size_mb);
    tracing::info!(
        "OCR fallback below {} chars at {}x zoom ({})",
        config.ocr_min_chars,
        config.ocr_zoom,
        config.tesseract_path
    );

    let pool = db::create_pool(&config.database_url).await?;

    let inference = OllamaClient::from_config(&config)?;
    tracing::info!(
        "Inference endpoint: {} (model: {})",
        inference.endpoint(),
        config.inference_model
    );

    // PORT takes precedence for platform deployments.
    let port = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse::<u16>().ok())
        .unwrap_or(config.server_port);
    let addr = format!("{}:{}", config.server_host, port);

    let state = AppState::new(pool, config, Arc::new(inference));

    let app = create_router(state).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive())
            .layer(axum::middleware::from_fn(logging_middleware)),
    );

    tracing::info!("Server listening on {}", addr);

    let listener = TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
