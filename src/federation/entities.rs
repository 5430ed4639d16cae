//! Protocol entities exchanged with remote nodes
//!
//! Inbound payloads are deserialized into [`InboundEntity`], a closed
//! variant over the kinds this node understands. Any other `"type"` lands
//! in [`InboundEntity::Other`] so newer protocol kinds never break a batch.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, FixedOffset, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Entity kind label for posts, also the only retractable kind
pub const POST_ENTITY_TYPE: &str = "Post";

/// Inbound protocol entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum InboundEntity {
    Post(Post),
    Retraction(Retraction),
    /// Any kind not handled yet
    #[serde(other)]
    Other,
}

impl InboundEntity {
    /// Identifier used when logging about this entity
    pub fn guid(&self) -> Option<&str> {
        match self {
            Self::Post(post) => Some(&post.guid),
            Self::Retraction(retraction) => Some(&retraction.target_guid),
            Self::Other => None,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Post(_) => "post",
            Self::Retraction(_) => "retraction",
            Self::Other => "other",
        }
    }
}

/// One entry of a received payload, decoded on its own
///
/// A payload entry that does not decode as an [`InboundEntity`] becomes
/// [`ReceivedEntity::Malformed`] instead of failing the whole payload.
#[derive(Debug, Clone, PartialEq)]
pub enum ReceivedEntity {
    Decoded(InboundEntity),
    Malformed {
        kind: &'static str,
        guid: Option<String>,
        reason: String,
    },
}

impl ReceivedEntity {
    pub fn from_value(value: serde_json::Value) -> Self {
        let kind = match value.get("type").and_then(serde_json::Value::as_str) {
            Some("Post") => "post",
            Some("Retraction") => "retraction",
            _ => "other",
        };
        let guid = ["guid", "target_guid"]
            .iter()
            .find_map(|field| value.get(*field).and_then(serde_json::Value::as_str))
            .map(str::to_string);

        match serde_json::from_value::<InboundEntity>(value) {
            Ok(entity) => Self::Decoded(entity),
            Err(error) => Self::Malformed {
                kind,
                guid,
                reason: error.to_string(),
            },
        }
    }
}

impl From<InboundEntity> for ReceivedEntity {
    fn from(entity: InboundEntity) -> Self {
        Self::Decoded(entity)
    }
}

impl<'de> Deserialize<'de> for ReceivedEntity {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        serde_json::Value::deserialize(deserializer).map(Self::from_value)
    }
}

/// A post, inbound or outbound
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub raw_content: String,
    pub guid: String,
    /// Author handle
    pub handle: String,
    #[serde(default)]
    pub public: bool,
    #[serde(default)]
    pub provider_display_name: Option<String>,
    #[serde(default)]
    pub created_at: Option<RemoteTimestamp>,
}

/// Request to delete previously federated content
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Retraction {
    /// Kind of the retracted entity, e.g. "Post"
    pub entity_type: String,
    pub target_guid: String,
    /// Handle of the retracting author
    pub handle: String,
}

// =============================================================================
// Timestamps
// =============================================================================

/// Timestamp as sent by a remote node, with or without a zone
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum RemoteTimestamp {
    Zoned(DateTime<FixedOffset>),
    Naive(NaiveDateTime),
}

const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

impl RemoteTimestamp {
    /// Normalize to UTC, reading a naive timestamp as local time in
    /// `assumed`.
    ///
    /// # Errors
    /// `AppError::Validation` if the shifted time falls outside the
    /// representable range.
    pub fn to_utc(&self, assumed: FixedOffset) -> Result<DateTime<Utc>, AppError> {
        match self {
            Self::Zoned(timestamp) => Ok(timestamp.with_timezone(&Utc)),
            Self::Naive(naive) => {
                let offset = chrono::Duration::seconds(i64::from(assumed.local_minus_utc()));
                naive
                    .checked_sub_signed(offset)
                    .map(|shifted| shifted.and_utc())
                    .ok_or_else(|| {
                        AppError::Validation(format!("Timestamp out of range: {}", naive))
                    })
            }
        }
    }
}

impl FromStr for RemoteTimestamp {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Ok(zoned) = DateTime::parse_from_rfc3339(s) {
            return Ok(Self::Zoned(zoned));
        }

        NAIVE_FORMATS
            .iter()
            .find_map(|format| NaiveDateTime::parse_from_str(s, format).ok())
            .map(Self::Naive)
            .ok_or_else(|| AppError::Validation(format!("Unparseable timestamp: {}", s)))
    }
}

impl TryFrom<String> for RemoteTimestamp {
    type Error = AppError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<RemoteTimestamp> for String {
    fn from(value: RemoteTimestamp) -> Self {
        value.to_string()
    }
}

impl From<DateTime<Utc>> for RemoteTimestamp {
    fn from(value: DateTime<Utc>) -> Self {
        Self::Zoned(value.fixed_offset())
    }
}

impl fmt::Display for RemoteTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Zoned(timestamp) => f.write_str(&timestamp.to_rfc3339()),
            Self::Naive(naive) => write!(f, "{}", naive.format("%Y-%m-%dT%H:%M:%S%.f")),
        }
    }
}
