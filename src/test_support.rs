//! Shared fixtures for unit tests

use std::sync::Arc;

use chrono::Utc;
use tempfile::TempDir;

use crate::data::{Content, Database, EntityId, Profile, Visibility};

/// Helper to create a test database
pub async fn create_test_db() -> (Arc<Database>, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("test.db");
    let db = Database::connect(&db_path).await.unwrap();
    (Arc::new(db), temp_dir)
}

pub fn sample_profile(handle: &str) -> Profile {
    Profile {
        id: EntityId::new().0,
        handle: handle.to_string(),
        name: handle.split('@').next().unwrap_or_default().to_string(),
        guid: format!("guid-{}", handle),
        visibility: Visibility::Public,
        rsa_public_key: "test_public_key".to_string(),
        image_url_small: String::new(),
        image_url_medium: String::new(),
        image_url_large: String::new(),
        location: String::new(),
        email: None,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

/// Insert and return a profile for `handle`
pub async fn insert_sample_profile(db: &Database, handle: &str) -> Profile {
    let profile = sample_profile(handle);
    db.insert_profile(&profile).await.unwrap();
    profile
}

pub fn sample_content(guid: &str, author: &Profile, is_local: bool) -> Content {
    Content {
        id: EntityId::new().0,
        guid: guid.to_string(),
        author_id: author.id.clone(),
        text: "Hello, world!".to_string(),
        visibility: Visibility::Public,
        remote_created: None,
        service_label: String::new(),
        is_local,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

/// Insert and return a content record owned by `author`
pub async fn insert_sample_content(
    db: &Database,
    guid: &str,
    author: &Profile,
    is_local: bool,
) -> Content {
    let content = sample_content(guid, author, is_local);
    db.insert_content(&content).await.unwrap();
    content
}
