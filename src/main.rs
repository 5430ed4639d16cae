//! fedbridge binary entry point
//!
//! Ingests one inbox payload file into the configured store:
//!
//! ```text
//! fedbridge payload.json
//! ```

use fedbridge::{AppState, config, federation::InboxPayload};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Application entry point
///
/// # Setup
/// 1. Load configuration from file and environment
/// 2. Initialize tracing/logging
/// 3. Initialize AppState
/// 4. Read the payload and run it through the inbox
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Load configuration
    let config = config::AppConfig::load()?;

    // 2. Initialize tracing/logging
    let default_filter = format!("fedbridge={}", config.logging.level);
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filter.into());

    if config.logging.format == "json" {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().pretty())
            .init();
    }

    fedbridge::metrics::init_metrics();
    tracing::info!(database = %config.database.path.display(), "Configuration loaded");

    let payload_path = std::env::args()
        .nth(1)
        .ok_or("usage: fedbridge <payload.json>")?;

    // 3. Initialize application state
    let state = AppState::new(config).await?;

    // 4. Ingest payload
    let raw = tokio::fs::read_to_string(&payload_path).await?;
    let payload: InboxPayload = serde_json::from_str(&raw)?;
    tracing::info!(
        path = %payload_path,
        sender = %payload.sender,
        entities = payload.entities.len(),
        "Payload loaded"
    );

    match state.inbox().receive(&payload).await? {
        Some(report) => {
            for failure in report.failures() {
                if let Err(error) = &failure.result {
                    tracing::warn!(
                        kind = failure.kind,
                        guid = failure.guid.as_deref().unwrap_or("-"),
                        %error,
                        "Entity was not ingested"
                    );
                }
            }
        }
        None => tracing::warn!(sender = %payload.sender, "Sender could not be resolved"),
    }

    Ok(())
}
