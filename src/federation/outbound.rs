//! Local content to outbound protocol entities
//!
//! Conversion failures never reach the delivery pipeline as errors: they
//! are logged here and the item is skipped.

use thiserror::Error;

use super::entities::{POST_ENTITY_TYPE, Post, Retraction};
use crate::data::{Content, Profile};
use crate::metrics::OUTBOUND_CONVERSIONS_TOTAL;

/// Origin label attached to outbound posts unless configured otherwise
pub const DEFAULT_SERVICE_LABEL: &str = "fedbridge";

/// Content that cannot be expressed as a protocol entity
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConversionFailure {
    #[error("content has an empty guid")]
    MissingGuid,

    #[error("author profile {0} has an empty handle")]
    MissingHandle(String),

    #[error("content {guid} is not authored by profile {profile_id}")]
    AuthorMismatch { guid: String, profile_id: String },
}

/// Builds outbound entities from stored content
#[derive(Debug, Clone)]
pub struct OutboundConverter {
    service_label: String,
}

impl Default for OutboundConverter {
    fn default() -> Self {
        Self::new(DEFAULT_SERVICE_LABEL)
    }
}

impl OutboundConverter {
    pub fn new(service_label: impl Into<String>) -> Self {
        Self {
            service_label: service_label.into(),
        }
    }

    pub fn service_label(&self) -> &str {
        &self.service_label
    }

    /// Convert `content`, written by `author`, into a public post
    pub fn to_post_entity(
        &self,
        content: &Content,
        author: &Profile,
    ) -> Result<Post, ConversionFailure> {
        let result = check_identity(content, author).and_then(|()| {
            if content.author_id != author.id {
                return Err(ConversionFailure::AuthorMismatch {
                    guid: content.guid.clone(),
                    profile_id: author.id.clone(),
                });
            }

            Ok(Post {
                raw_content: content.text.clone(),
                guid: content.guid.clone(),
                handle: author.handle.clone(),
                public: true,
                provider_display_name: Some(self.service_label.clone()),
                created_at: Some(content.effective_created().into()),
            })
        });

        record("post", content, result)
    }

    /// Convert a deletion of `content` by `author` into a retraction
    pub fn to_retraction_entity(
        &self,
        content: &Content,
        author: &Profile,
    ) -> Result<Retraction, ConversionFailure> {
        let result = check_identity(content, author).map(|()| Retraction {
            entity_type: POST_ENTITY_TYPE.to_string(),
            target_guid: content.guid.clone(),
            handle: author.handle.clone(),
        });

        record("retraction", content, result)
    }

    /// [`Self::to_post_entity`], with failures reduced to `None`
    pub fn make_federable_post(&self, content: &Content, author: &Profile) -> Option<Post> {
        self.to_post_entity(content, author).ok()
    }

    /// [`Self::to_retraction_entity`], with failures reduced to `None`
    pub fn make_federable_retraction(
        &self,
        content: &Content,
        author: &Profile,
    ) -> Option<Retraction> {
        self.to_retraction_entity(content, author).ok()
    }
}

fn check_identity(content: &Content, author: &Profile) -> Result<(), ConversionFailure> {
    if content.guid.is_empty() {
        return Err(ConversionFailure::MissingGuid);
    }
    if author.handle.is_empty() {
        return Err(ConversionFailure::MissingHandle(author.id.clone()));
    }
    Ok(())
}

fn record<T>(
    entity_type: &'static str,
    content: &Content,
    result: Result<T, ConversionFailure>,
) -> Result<T, ConversionFailure> {
    match &result {
        Ok(_) => {
            tracing::debug!(guid = %content.guid, entity_type, "Converted content for federation");
            OUTBOUND_CONVERSIONS_TOTAL
                .with_label_values(&[entity_type, "ok"])
                .inc();
        }
        Err(error) => {
            tracing::error!(
                guid = %content.guid,
                entity_type,
                error = %error,
                "Failed to convert content for federation"
            );
            OUTBOUND_CONVERSIONS_TOTAL
                .with_label_values(&[entity_type, "failed"])
                .inc();
        }
    }
    result
}
