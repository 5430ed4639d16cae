//! WebFinger-based remote profile fetching
//!
//! Discovers the actor document for a handle (`user@domain`) and turns it
//! into a [`RemoteProfile`].

use std::sync::Arc;

use reqwest::StatusCode;
use reqwest::header::ACCEPT;
use serde::{Deserialize, Serialize};

use super::profile::{ImageUrls, RemoteProfile, RemoteProfileFetcher};
use crate::error::AppError;

const ACTIVITY_JSON: &str = "application/activity+json";
const LD_JSON_PREFIX: &str = "application/ld+json";

/// WebFinger result
#[derive(Debug, Clone)]
pub struct WebFingerResult {
    /// Subject (acct:user@domain)
    pub subject: String,
    /// Actor document URI
    pub actor_uri: String,
    /// Profile page URL (optional)
    pub profile_url: Option<String>,
}

/// WebFinger JRD response
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WebFingerResponse {
    pub subject: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aliases: Option<Vec<String>>,
    #[serde(default)]
    pub links: Vec<WebFingerLink>,
}

/// WebFinger link
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WebFingerLink {
    pub rel: String,
    #[serde(rename = "type")]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub href: Option<String>,
}

impl WebFingerResponse {
    /// Pick the actor document link and the profile page, if any
    pub fn into_result(self) -> Option<WebFingerResult> {
        let is_actor_type = |link: &WebFingerLink| {
            link.link_type
                .as_deref()
                .is_some_and(|t| t == ACTIVITY_JSON || t.starts_with(LD_JSON_PREFIX))
        };

        let actor_uri = self
            .links
            .iter()
            .find(|link| link.rel == "self" && is_actor_type(link))
            .and_then(|link| link.href.clone())?;
        let profile_url = self
            .links
            .iter()
            .find(|link| link.rel == "http://webfinger.net/rel/profile-page")
            .and_then(|link| link.href.clone());

        Some(WebFingerResult {
            subject: self.subject,
            actor_uri,
            profile_url,
        })
    }
}

/// Split `user@domain` (optionally prefixed with `acct:`) into its parts
fn split_handle(handle: &str) -> Result<(&str, &str), AppError> {
    let address = handle.strip_prefix("acct:").unwrap_or(handle);
    match address.split_once('@') {
        Some((user, domain)) if !user.is_empty() && !domain.is_empty() => Ok((user, domain)),
        _ => Err(AppError::Validation(format!("Invalid handle: {}", handle))),
    }
}

fn is_gone(status: StatusCode) -> bool {
    status == StatusCode::NOT_FOUND || status == StatusCode::GONE
}

/// Resolve a handle to its actor document URI
///
/// # Returns
/// `Ok(None)` if the remote node does not know the handle.
pub async fn resolve_webfinger(
    handle: &str,
    http_client: &reqwest::Client,
) -> Result<Option<WebFingerResult>, AppError> {
    let (user, domain) = split_handle(handle)?;
    let resource = format!("acct:{}@{}", user, domain);
    let url = format!(
        "https://{}/.well-known/webfinger?resource={}",
        domain,
        urlencoding::encode(&resource)
    );

    let response = http_client
        .get(&url)
        .header(ACCEPT, "application/jrd+json, application/json")
        .send()
        .await?;

    if is_gone(response.status()) {
        tracing::debug!(handle = %handle, "WebFinger lookup found no such account");
        return Ok(None);
    }

    let jrd: WebFingerResponse = response.error_for_status()?.json().await?;
    let result = jrd.into_result();
    if result.is_none() {
        tracing::debug!(handle = %handle, "WebFinger response has no actor link");
    }
    Ok(result)
}

/// Fetch actor document
///
/// # Returns
/// `Ok(None)` if the document is gone.
pub async fn fetch_actor(
    actor_uri: &str,
    http_client: &reqwest::Client,
) -> Result<Option<serde_json::Value>, AppError> {
    let parsed = url::Url::parse(actor_uri)
        .map_err(|e| AppError::Federation(format!("Invalid actor URI {}: {}", actor_uri, e)))?;
    if parsed.scheme() != "https" && parsed.scheme() != "http" {
        return Err(AppError::Federation(format!(
            "Unsupported actor URI scheme: {}",
            parsed.scheme()
        )));
    }

    let response = http_client
        .get(parsed)
        .header(ACCEPT, ACTIVITY_JSON)
        .send()
        .await?;

    if is_gone(response.status()) {
        return Ok(None);
    }

    let actor = response.error_for_status()?.json().await?;
    Ok(Some(actor))
}

/// Extract profile data from an actor document
///
/// `handle` is the address the actor was discovered under.
pub fn parse_actor(actor: &serde_json::Value, handle: &str) -> Result<RemoteProfile, AppError> {
    let str_field = |key: &str| actor.get(key).and_then(serde_json::Value::as_str);

    let id = str_field("id")
        .ok_or_else(|| AppError::Federation("Actor document has no id".to_string()))?;

    let name = str_field("name")
        .filter(|name| !name.is_empty())
        .or_else(|| str_field("preferredUsername"))
        .unwrap_or_default();

    let public_key = actor
        .get("publicKey")
        .and_then(|key| key.get("publicKeyPem"))
        .and_then(serde_json::Value::as_str)
        .unwrap_or_default();

    let locked = actor
        .get("manuallyApprovesFollowers")
        .and_then(serde_json::Value::as_bool)
        .unwrap_or(false);

    let icon = actor.get("icon").and_then(icon_url).unwrap_or_default();

    Ok(RemoteProfile {
        name: name.to_string(),
        guid: id.to_string(),
        handle: handle.to_string(),
        public: !locked,
        public_key: public_key.to_string(),
        image_urls: ImageUrls {
            small: icon.clone(),
            medium: icon.clone(),
            large: icon,
        },
        location: String::new(),
        email: None,
    })
}

/// `icon` may be a URL, an Image object or a list of either
fn icon_url(icon: &serde_json::Value) -> Option<String> {
    match icon {
        serde_json::Value::String(url) => Some(url.clone()),
        serde_json::Value::Array(items) => items.iter().find_map(icon_url),
        serde_json::Value::Object(_) => icon.get("url").and_then(icon_url),
        _ => None,
    }
}

/// [`RemoteProfileFetcher`] backed by WebFinger and actor documents
#[derive(Clone)]
pub struct HttpProfileFetcher {
    http_client: Arc<reqwest::Client>,
}

impl HttpProfileFetcher {
    pub fn new(http_client: Arc<reqwest::Client>) -> Self {
        Self { http_client }
    }
}

impl RemoteProfileFetcher for HttpProfileFetcher {
    async fn fetch(&self, handle: &str) -> Result<Option<RemoteProfile>, AppError> {
        let Some(webfinger) = resolve_webfinger(handle, &self.http_client).await? else {
            return Ok(None);
        };
        tracing::debug!(
            handle = %handle,
            subject = %webfinger.subject,
            actor = %webfinger.actor_uri,
            "Resolved actor via WebFinger"
        );

        let Some(actor) = fetch_actor(&webfinger.actor_uri, &self.http_client).await? else {
            return Ok(None);
        };

        parse_actor(&actor, handle).map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn split_handle_accepts_plain_and_acct_forms() {
        assert_eq!(split_handle("alice@example.com").unwrap(), ("alice", "example.com"));
        assert_eq!(
            split_handle("acct:alice@example.com:8443").unwrap(),
            ("alice", "example.com:8443")
        );
        assert!(split_handle("alice").is_err());
        assert!(split_handle("@example.com").is_err());
    }

    #[test]
    fn webfinger_picks_activity_json_self_link() {
        let jrd: WebFingerResponse = serde_json::from_value(json!({
            "subject": "acct:alice@example.com",
            "links": [
                {
                    "rel": "http://webfinger.net/rel/profile-page",
                    "type": "text/html",
                    "href": "https://example.com/@alice"
                },
                { "rel": "self", "type": "text/html", "href": "https://example.com/wrong" },
                {
                    "rel": "self",
                    "type": "application/ld+json; profile=\"https://www.w3.org/ns/activitystreams\"",
                    "href": "https://example.com/users/alice"
                }
            ]
        }))
        .unwrap();

        let result = jrd.into_result().expect("actor link should be found");
        assert_eq!(result.actor_uri, "https://example.com/users/alice");
        assert_eq!(result.profile_url.as_deref(), Some("https://example.com/@alice"));
    }

    #[test]
    fn webfinger_without_actor_link_resolves_to_none() {
        let jrd: WebFingerResponse = serde_json::from_value(json!({
            "subject": "acct:alice@example.com"
        }))
        .unwrap();
        assert!(jrd.into_result().is_none());
    }

    #[test]
    fn parse_actor_extracts_profile_fields() {
        let actor = json!({
            "id": "https://example.com/users/alice",
            "type": "Person",
            "preferredUsername": "alice",
            "name": "Alice",
            "manuallyApprovesFollowers": false,
            "icon": { "type": "Image", "url": "https://example.com/alice.png" },
            "publicKey": {
                "id": "https://example.com/users/alice#main-key",
                "publicKeyPem": "-----BEGIN PUBLIC KEY-----\nabc\n-----END PUBLIC KEY-----"
            }
        });

        let profile = parse_actor(&actor, "alice@example.com").unwrap();

        assert_eq!(profile.name, "Alice");
        assert_eq!(profile.guid, "https://example.com/users/alice");
        assert_eq!(profile.handle, "alice@example.com");
        assert!(profile.public);
        assert!(profile.public_key.starts_with("-----BEGIN PUBLIC KEY-----"));
        assert_eq!(profile.image_urls.large, "https://example.com/alice.png");
        assert_eq!(profile.image_urls.small, profile.image_urls.large);
    }

    #[test]
    fn parse_actor_locked_account_is_not_public() {
        let actor = json!({
            "id": "https://example.com/users/bob",
            "preferredUsername": "bob",
            "manuallyApprovesFollowers": true,
            "icon": [{ "url": "https://example.com/bob.png" }]
        });

        let profile = parse_actor(&actor, "bob@example.com").unwrap();

        assert_eq!(profile.name, "bob");
        assert!(!profile.public);
        assert_eq!(profile.image_urls.medium, "https://example.com/bob.png");
        assert_eq!(profile.public_key, "");
    }

    #[test]
    fn parse_actor_requires_id() {
        let error = parse_actor(&json!({ "name": "Nobody" }), "nobody@example.com").unwrap_err();
        assert!(matches!(error, AppError::Federation(_)));
    }
}
