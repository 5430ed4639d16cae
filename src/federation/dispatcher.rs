//! Inbound entity dispatch
//!
//! Routes a batch of entities to the post and retraction handlers.
//! Every entity is its own unit of work: a failure is logged, recorded in
//! the [`BatchReport`] and the batch moves on.

use std::sync::Arc;

use super::entities::{InboundEntity, ReceivedEntity};
use super::post::{PostIngestor, PostOutcome};
use super::retraction::{RetractionIngestor, RetractionOutcome};
use crate::data::{Database, Profile};
use crate::error::AppError;
use crate::metrics::ENTITIES_PROCESSED_TOTAL;

/// Result of handling one entity successfully
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Handled {
    Post(PostOutcome),
    Retraction(RetractionOutcome),
    /// Entity kind not handled by this node
    Skipped,
}

impl Handled {
    fn label(&self) -> &'static str {
        match self {
            Self::Post(PostOutcome::Created) => "created",
            Self::Post(PostOutcome::Updated) => "updated",
            Self::Retraction(RetractionOutcome::Deleted) => "deleted",
            Self::Retraction(RetractionOutcome::Ignored(_)) => "ignored",
            Self::Skipped => "skipped",
        }
    }
}

/// Outcome for a single entity of a batch
#[derive(Debug)]
pub struct EntityOutcome {
    pub kind: &'static str,
    pub guid: Option<String>,
    pub result: Result<Handled, AppError>,
}

/// Per-entity outcomes of a batch, in input order
#[derive(Debug, Default)]
pub struct BatchReport {
    pub outcomes: Vec<EntityOutcome>,
}

impl BatchReport {
    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    /// Entities whose handler returned an error
    pub fn failures(&self) -> impl Iterator<Item = &EntityOutcome> {
        self.outcomes.iter().filter(|outcome| outcome.result.is_err())
    }

    pub fn failure_count(&self) -> usize {
        self.failures().count()
    }
}

/// Routes inbound entities to their handlers
pub struct EntityDispatcher {
    posts: PostIngestor,
    retractions: RetractionIngestor,
}

impl EntityDispatcher {
    pub fn new(db: Arc<Database>) -> Self {
        Self {
            posts: PostIngestor::new(db.clone()),
            retractions: RetractionIngestor::new(db),
        }
    }

    /// Process `entities` sent by `profile`, in order
    ///
    /// Each entity is committed before the next one starts, so a later
    /// entity may rely on an earlier one (a post and its retraction in the
    /// same batch). Nothing escapes this call.
    pub async fn process(&self, entities: &[InboundEntity], profile: &Profile) -> BatchReport {
        let mut report = BatchReport::default();
        for entity in entities {
            report.outcomes.push(self.process_one(entity, profile).await);
        }
        report
    }

    /// Process entries of a received payload, in order
    ///
    /// Entries that did not decode are recorded as failures in their slot;
    /// the rest are handled as in [`process`](Self::process).
    pub async fn process_received(
        &self,
        entities: &[ReceivedEntity],
        profile: &Profile,
    ) -> BatchReport {
        let mut report = BatchReport::default();
        for entity in entities {
            let outcome = match entity {
                ReceivedEntity::Decoded(entity) => self.process_one(entity, profile).await,
                ReceivedEntity::Malformed { kind, guid, reason } => {
                    let error = AppError::Validation(format!("Malformed entity: {}", reason));
                    record_failure(kind, guid.as_deref(), &error);
                    EntityOutcome {
                        kind: *kind,
                        guid: guid.clone(),
                        result: Err(error),
                    }
                }
            };
            report.outcomes.push(outcome);
        }
        report
    }

    async fn process_one(&self, entity: &InboundEntity, profile: &Profile) -> EntityOutcome {
        let guid = entity.guid().map(str::to_string);
        tracing::info!(
            kind = entity.kind(),
            guid = guid.as_deref().unwrap_or("-"),
            handle = %profile.handle,
            "Processing entity"
        );

        let result = self.handle(entity, profile).await;
        match &result {
            Ok(handled) => {
                ENTITIES_PROCESSED_TOTAL
                    .with_label_values(&[entity.kind(), handled.label()])
                    .inc();
            }
            Err(error) => record_failure(entity.kind(), guid.as_deref(), error),
        }

        EntityOutcome {
            kind: entity.kind(),
            guid,
            result,
        }
    }

    async fn handle(&self, entity: &InboundEntity, profile: &Profile) -> Result<Handled, AppError> {
        match entity {
            InboundEntity::Post(post) => {
                let (_, outcome) = self.posts.ingest(post, profile).await?;
                Ok(Handled::Post(outcome))
            }
            InboundEntity::Retraction(retraction) => {
                let outcome = self.retractions.ingest(retraction, profile).await?;
                Ok(Handled::Retraction(outcome))
            }
            InboundEntity::Other => {
                tracing::trace!("Skipping unsupported entity kind");
                Ok(Handled::Skipped)
            }
        }
    }
}

fn record_failure(kind: &str, guid: Option<&str>, error: &AppError) {
    ENTITIES_PROCESSED_TOTAL
        .with_label_values(&[kind, "failed"])
        .inc();
    tracing::error!(
        kind = kind,
        guid = guid.unwrap_or("-"),
        error = %error,
        "Failed to handle entity"
    );
}
