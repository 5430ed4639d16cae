//! Common test utilities for E2E tests

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use fedbridge::data::Database;
use fedbridge::error::AppError;
use fedbridge::federation::{ImageUrls, Inbox, RemoteProfile, RemoteProfileFetcher};
use tempfile::TempDir;

/// Fetcher answering from a fixed directory of remote actors
#[derive(Clone, Default)]
pub struct DirectoryFetcher {
    profiles: Arc<HashMap<String, RemoteProfile>>,
    calls: Arc<Mutex<Vec<String>>>,
}

impl DirectoryFetcher {
    pub fn new(profiles: Vec<RemoteProfile>) -> Self {
        let profiles = profiles
            .into_iter()
            .map(|profile| (profile.handle.clone(), profile))
            .collect();
        Self {
            profiles: Arc::new(profiles),
            calls: Arc::default(),
        }
    }

    /// Handles fetched so far, in order
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

impl RemoteProfileFetcher for DirectoryFetcher {
    async fn fetch(&self, handle: &str) -> Result<Option<RemoteProfile>, AppError> {
        self.calls.lock().unwrap().push(handle.to_string());
        Ok(self.profiles.get(handle).cloned())
    }
}

/// Remote actor as a WebFinger fetch would return it
pub fn remote_profile(handle: &str, name: &str, public: bool) -> RemoteProfile {
    RemoteProfile {
        name: name.to_string(),
        guid: format!("guid-{}", handle),
        handle: handle.to_string(),
        public,
        public_key: "-----BEGIN PUBLIC KEY-----\ntest\n-----END PUBLIC KEY-----".to_string(),
        image_urls: ImageUrls::default(),
        location: String::new(),
        email: None,
    }
}

/// A node under test: its own database and inbox
pub struct TestNode {
    pub db: Arc<Database>,
    pub inbox: Inbox<DirectoryFetcher>,
    pub fetcher: DirectoryFetcher,
    pub _temp_dir: TempDir,
}

impl TestNode {
    pub async fn new(fetcher: DirectoryFetcher) -> Self {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("test.db");
        let db = Arc::new(Database::connect(&db_path).await.unwrap());
        let inbox = Inbox::new(db.clone(), fetcher.clone());

        Self {
            db,
            inbox,
            fetcher,
            _temp_dir: temp_dir,
        }
    }
}
