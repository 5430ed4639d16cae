//! Inbox pipeline
//!
//! Resolves the sender of a received payload, then hands its entities to
//! the dispatcher. Transport and signature checks happen before this.

use std::sync::Arc;

use serde::Deserialize;

use super::dispatcher::{BatchReport, EntityDispatcher};
use super::entities::ReceivedEntity;
use super::profile::{ProfileResolver, RemoteProfileFetcher};
use crate::data::Database;
use crate::error::AppError;

/// A received payload: who sent it and what it contains
#[derive(Debug, Clone, Deserialize)]
pub struct InboxPayload {
    /// Sender handle
    pub sender: String,
    /// Entries are decoded one by one; see [`ReceivedEntity`]
    #[serde(default)]
    pub entities: Vec<ReceivedEntity>,
}

/// Receives payloads for this node
pub struct Inbox<F> {
    resolver: ProfileResolver<F>,
    dispatcher: EntityDispatcher,
}

impl<F: RemoteProfileFetcher> Inbox<F> {
    pub fn new(db: Arc<Database>, fetcher: F) -> Self {
        Self {
            resolver: ProfileResolver::new(db.clone(), fetcher),
            dispatcher: EntityDispatcher::new(db),
        }
    }

    /// Process a payload
    ///
    /// # Returns
    /// `Ok(None)` if the sender cannot be resolved; nothing is processed
    /// in that case.
    ///
    /// # Errors
    /// Only sender resolution can fail; entity failures are reported in
    /// the [`BatchReport`].
    pub async fn receive(&self, payload: &InboxPayload) -> Result<Option<BatchReport>, AppError> {
        let Some(profile) = self.resolver.resolve(&payload.sender).await? else {
            tracing::warn!(
                handle = %payload.sender,
                entities = payload.entities.len(),
                "Dropping payload from unresolvable sender"
            );
            return Ok(None);
        };

        let report = self.dispatcher.process_received(&payload.entities, &profile).await;
        tracing::info!(
            handle = %profile.handle,
            processed = report.len(),
            failed = report.failure_count(),
            "Payload processed"
        );

        Ok(Some(report))
    }
}
