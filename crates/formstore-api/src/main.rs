use anyhow::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use formstore_api::{routes, ApiState, Settings};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "formstore_api=debug,tower_http=debug,axum::rejection=trace".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load environment variables
    dotenv::dotenv().ok();

    // Get configuration
    let mut settings = Settings::load(None)?;
    if let Ok(db_url) = std::env::var("DATABASE_URL") {
        settings.database.url = db_url;
    }

    let state = ApiState::from_settings(&settings).await?;

    // Build router
    let app = routes::create_router_with_upload_limit(state, settings.server.max_upload_bytes);

    // Start server
    let addr = format!("{}:{}", settings.server.host, settings.server.port);
    tracing::info!("Form storage API running on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
