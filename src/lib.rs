//! fedbridge - Federation ingestion core
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     Federation Layer                         │
//! │  - Inbox: sender resolution + entity dispatch               │
//! │  - Post / retraction ingestion                              │
//! │  - Outbound entity conversion                               │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      Data Layer                              │
//! │  - SQLite (sqlx): profiles, content                         │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - `federation`: Inbound and outbound entity handling
//! - `data`: Database layer
//! - `config`: Configuration management
//! - `error`: Error types
//! - `metrics`: Prometheus instruments

pub mod config;
pub mod data;
pub mod error;
pub mod federation;
pub mod metrics;

#[cfg(test)]
mod test_support;

use std::sync::Arc;

/// Application state shared by the inbox and outbound paths
#[derive(Clone)]
pub struct AppState {
    /// Application configuration
    pub config: Arc<config::AppConfig>,

    /// Database connection pool
    pub db: Arc<data::Database>,

    /// HTTP client for federation
    pub http_client: Arc<reqwest::Client>,
}

impl AppState {
    /// Initialize application state
    ///
    /// # Steps
    /// 1. Connect to SQLite database
    /// 2. Build HTTP client
    ///
    /// # Errors
    /// Returns error if any initialization step fails
    pub async fn new(config: config::AppConfig) -> Result<Self, error::AppError> {
        tracing::info!("Initializing application state...");

        let db = data::Database::connect(&config.database.path).await?;

        let http_client = reqwest::Client::builder()
            .user_agent(config.federation.user_agent.clone())
            .timeout(std::time::Duration::from_secs(
                config.federation.fetch_timeout_seconds,
            ))
            .build()
            .map_err(|e| error::AppError::Internal(e.into()))?;

        tracing::info!("Application state initialized successfully");

        Ok(Self {
            config: Arc::new(config),
            db: Arc::new(db),
            http_client: Arc::new(http_client),
        })
    }

    /// Inbox fetching unknown senders over HTTP
    pub fn inbox(&self) -> federation::Inbox<federation::HttpProfileFetcher> {
        federation::Inbox::new(
            self.db.clone(),
            federation::HttpProfileFetcher::new(self.http_client.clone()),
        )
    }

    /// Converter labelling outbound posts with the configured service label
    pub fn outbound(&self) -> federation::OutboundConverter {
        federation::OutboundConverter::new(self.config.federation.service_label.clone())
    }
}
