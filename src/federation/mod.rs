//! Federation module
//!
//! Handles:
//! - Sender profile resolution (WebFinger fetch on first sight)
//! - Inbound entity dispatch (posts, retractions)
//! - Outbound entity conversion
//! - Safe text for remote input

mod dispatcher;
mod entities;
mod inbox;
mod outbound;
mod post;
mod profile;
mod retraction;
mod text;
mod webfinger;

pub use dispatcher::{BatchReport, EntityDispatcher, EntityOutcome, Handled};
pub use entities::{
    InboundEntity, POST_ENTITY_TYPE, Post, ReceivedEntity, RemoteTimestamp, Retraction,
};
pub use inbox::{Inbox, InboxPayload};
pub use outbound::{ConversionFailure, DEFAULT_SERVICE_LABEL, OutboundConverter};
pub use post::{PostIngestor, PostOutcome};
pub use profile::{ImageUrls, ProfileResolver, RemoteProfile, RemoteProfileFetcher};
pub use retraction::{RetractionIngestor, RetractionOutcome, RetractionSkip};
pub use text::{safe_text, safe_text_for_markdown};
pub use webfinger::{
    HttpProfileFetcher, WebFingerResponse, WebFingerResult, fetch_actor, parse_actor,
    resolve_webfinger,
};
