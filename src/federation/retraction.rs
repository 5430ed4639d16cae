//! Inbound retraction handling
//!
//! A retraction deletes mirrored content only when every check passes:
//! the entity kind is a post, the content exists, it was not authored on
//! this node, and the retracting profile is its author.

use std::sync::Arc;

use super::entities::{POST_ENTITY_TYPE, Retraction};
use super::text::safe_text;
use crate::data::{Database, Profile};
use crate::error::AppError;

/// Why a retraction was not applied
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetractionSkip {
    /// Only posts can be retracted
    UnsupportedType(String),
    /// No content with the target guid
    NotFound,
    /// Content authored on this node
    LocalContent,
    /// Retracting profile does not own the content
    NotOwner,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetractionOutcome {
    Deleted,
    Ignored(RetractionSkip),
}

/// Applies inbound retractions to local content
pub struct RetractionIngestor {
    db: Arc<Database>,
}

impl RetractionIngestor {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Apply `retraction` on behalf of `profile`
    ///
    /// Policy rejections are returned as [`RetractionOutcome::Ignored`];
    /// only store failures are errors.
    pub async fn ingest(
        &self,
        retraction: &Retraction,
        profile: &Profile,
    ) -> Result<RetractionOutcome, AppError> {
        let entity_type = safe_text(&retraction.entity_type);
        if entity_type != POST_ENTITY_TYPE {
            tracing::debug!(entity_type = %entity_type, "Ignoring retraction of unsupported entity type");
            return Ok(RetractionOutcome::Ignored(RetractionSkip::UnsupportedType(
                entity_type,
            )));
        }

        let target_guid = safe_text(&retraction.target_guid);
        let Some(content) = self.db.get_content_by_guid(&target_guid).await? else {
            tracing::warn!(guid = %target_guid, "Retracted content cannot be found");
            return Ok(RetractionOutcome::Ignored(RetractionSkip::NotFound));
        };

        if content.is_local {
            tracing::warn!(
                guid = %content.guid,
                handle = %profile.handle,
                "Local content cannot be retracted by a remote retraction"
            );
            return Ok(RetractionOutcome::Ignored(RetractionSkip::LocalContent));
        }

        if content.author_id != profile.id {
            tracing::warn!(
                guid = %content.guid,
                handle = %profile.handle,
                "Content is not owned by the retracting profile"
            );
            return Ok(RetractionOutcome::Ignored(RetractionSkip::NotOwner));
        }

        self.db.delete_content(&content.id).await?;
        tracing::info!(guid = %content.guid, handle = %profile.handle, "Retraction done for content");

        Ok(RetractionOutcome::Deleted)
    }
}
