//! Inbound post ingestion

use std::sync::Arc;

use chrono::{Offset, Utc};

use super::entities::Post;
use super::text::{safe_text, safe_text_for_markdown};
use crate::data::{Content, ContentValues, Database, Profile, Visibility};
use crate::error::AppError;

/// What an ingest did to the store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostOutcome {
    Created,
    Updated,
}

/// Upserts local content from inbound posts
pub struct PostIngestor {
    db: Arc<Database>,
}

impl PostIngestor {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Create or update the content record for `post`, owned by `author`
    ///
    /// Re-ingesting the same post converges on a single record holding the
    /// latest values. Naive creation timestamps are read as UTC.
    pub async fn ingest(
        &self,
        post: &Post,
        author: &Profile,
    ) -> Result<(Content, PostOutcome), AppError> {
        let utc = Utc.fix();
        let values = ContentValues {
            author_id: author.id.clone(),
            text: safe_text_for_markdown(&post.raw_content),
            visibility: Visibility::from_public_flag(post.public),
            remote_created: post.created_at.map(|created| created.to_utc(utc)).transpose()?,
            service_label: post
                .provider_display_name
                .as_deref()
                .map(safe_text)
                .unwrap_or_default(),
        };
        let guid = safe_text(&post.guid);

        let (content, created) = self.db.upsert_content(&guid, &values).await?;
        let outcome = if created {
            tracing::info!(guid = %content.guid, handle = %author.handle, "Saved Content");
            PostOutcome::Created
        } else {
            tracing::info!(guid = %content.guid, handle = %author.handle, "Updated Content");
            PostOutcome::Updated
        };

        Ok((content, outcome))
    }
}
