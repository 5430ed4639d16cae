//! Sender profile resolution
//!
//! Maps a remote handle to a local [`Profile`], fetching and storing the
//! remote actor the first time the handle is seen.

use std::future::Future;
use std::sync::Arc;

use chrono::Utc;

use super::text::safe_text;
use crate::data::{Database, EntityId, Profile, Visibility};
use crate::error::AppError;
use crate::metrics::PROFILE_FETCHES_TOTAL;

/// Profile image URLs as published by the remote node
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImageUrls {
    pub small: String,
    pub medium: String,
    pub large: String,
}

/// Actor data fetched from a remote node
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemoteProfile {
    pub name: String,
    pub guid: String,
    pub handle: String,
    pub public: bool,
    pub public_key: String,
    pub image_urls: ImageUrls,
    pub location: String,
    pub email: Option<String>,
}

/// Source of remote actor data
///
/// `Ok(None)` means the actor definitively does not exist; `Err` is a
/// failure to find out.
pub trait RemoteProfileFetcher: Send + Sync {
    fn fetch(
        &self,
        handle: &str,
    ) -> impl Future<Output = Result<Option<RemoteProfile>, AppError>> + Send;
}

/// Build a new local profile from fetched remote data
fn profile_from_remote(handle: &str, remote: &RemoteProfile) -> Profile {
    let now = Utc::now();
    Profile {
        id: EntityId::new().0,
        handle: handle.to_string(),
        name: safe_text(&remote.name),
        guid: safe_text(&remote.guid),
        visibility: Visibility::from_public_flag(remote.public),
        rsa_public_key: safe_text(&remote.public_key),
        image_url_small: safe_text(&remote.image_urls.small),
        image_url_medium: safe_text(&remote.image_urls.medium),
        image_url_large: safe_text(&remote.image_urls.large),
        location: safe_text(&remote.location),
        email: remote.email.clone(),
        created_at: now,
        updated_at: now,
    }
}

/// Resolve-or-create for sender profiles
pub struct ProfileResolver<F> {
    db: Arc<Database>,
    fetcher: F,
}

impl<F: RemoteProfileFetcher> ProfileResolver<F> {
    pub fn new(db: Arc<Database>, fetcher: F) -> Self {
        Self { db, fetcher }
    }

    /// Get the local profile for `handle`, fetching it remotely if needed
    ///
    /// # Returns
    /// `Ok(None)` if the actor is unknown both locally and remotely.
    /// Callers should not retry that within the same invocation.
    ///
    /// # Errors
    /// Fetch failures and store failures other than a duplicate handle.
    pub async fn resolve(&self, handle: &str) -> Result<Option<Profile>, AppError> {
        if let Some(profile) = self.db.get_profile_by_handle(handle).await? {
            tracing::debug!(handle = %handle, "Sender profile found locally");
            return Ok(Some(profile));
        }

        let remote = match self.fetcher.fetch(handle).await {
            Ok(remote) => remote,
            Err(error) => {
                PROFILE_FETCHES_TOTAL.with_label_values(&["error"]).inc();
                return Err(error);
            }
        };

        let Some(remote) = remote else {
            PROFILE_FETCHES_TOTAL.with_label_values(&["not_found"]).inc();
            tracing::warn!(handle = %handle, "Remote profile not found locally or remotely");
            return Ok(None);
        };
        PROFILE_FETCHES_TOTAL.with_label_values(&["found"]).inc();

        if !remote.handle.is_empty() && remote.handle != handle {
            tracing::debug!(
                handle = %handle,
                declared = %remote.handle,
                "Remote profile declares a different handle; keeping the requested one"
            );
        }

        let profile = profile_from_remote(handle, &remote);
        match self.db.insert_profile(&profile).await {
            Ok(()) => {
                tracing::info!(handle = %handle, guid = %profile.guid, "Created sender profile");
                Ok(Some(profile))
            }
            Err(AppError::Conflict(_)) => {
                // Someone else created it between our lookup and insert.
                tracing::debug!(handle = %handle, "Sender profile created concurrently");
                let existing = self.db.get_profile_by_handle(handle).await?;
                existing
                    .map(Some)
                    .ok_or_else(|| AppError::Conflict(format!("profile handle {}", handle)))
            }
            Err(error) => Err(error),
        }
    }
}
