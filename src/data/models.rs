//! Data models
//!
//! Rust structs representing stored profiles and content.
//! All models use ULID for IDs and chrono for timestamps.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// =============================================================================
// ID Types
// =============================================================================

/// Entity ID wrapper (ULID format, 26 characters)
///
/// Example: "01ARZ3NDEKTSV4RRFFQ69G5FAV"
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(pub String);

impl EntityId {
    /// Generate a new ULID
    pub fn new() -> Self {
        Self(ulid::Ulid::new().to_string())
    }
}

impl Default for EntityId {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Visibility
// =============================================================================

/// Who may see a profile or a piece of content
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum Visibility {
    Public,
    Limited,
}

impl Visibility {
    /// Map a protocol-level "public" flag
    pub fn from_public_flag(public: bool) -> Self {
        if public { Self::Public } else { Self::Limited }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Public => "public",
            Self::Limited => "limited",
        }
    }
}

// =============================================================================
// Profile
// =============================================================================

/// Local record of an actor
///
/// Remote actors are materialized lazily the first time one of
/// their handles shows up in an inbound payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Profile {
    pub id: String,
    /// Federation-wide handle (user@domain), unique
    pub handle: String,
    pub name: String,
    pub guid: String,
    pub visibility: Visibility,
    /// Public key material (PEM)
    pub rsa_public_key: String,
    pub image_url_small: String,
    pub image_url_medium: String,
    pub image_url_large: String,
    pub location: String,
    pub email: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Content
// =============================================================================

/// A unit of federated content
///
/// Can be:
/// - Content authored on this node (is_local = true)
/// - Content mirrored from a remote node (is_local = false)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Content {
    pub id: String,
    /// Globally unique identifier, storage key for upsert/delete
    pub guid: String,
    /// Owning profile ID
    pub author_id: String,
    /// Markdown-safe text body
    pub text: String,
    pub visibility: Visibility,
    /// Creation time reported by the origin node
    pub remote_created: Option<DateTime<Utc>>,
    /// Display name of the originating service
    pub service_label: String,
    pub is_local: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Content {
    /// Authoritative creation time: the remote timestamp when known,
    /// otherwise the local storage time.
    pub fn effective_created(&self) -> DateTime<Utc> {
        self.remote_created.unwrap_or(self.created_at)
    }
}

/// Field values written by an inbound post upsert
#[derive(Debug, Clone)]
pub struct ContentValues {
    pub author_id: String,
    pub text: String,
    pub visibility: Visibility,
    pub remote_created: Option<DateTime<Utc>>,
    pub service_label: String,
}
