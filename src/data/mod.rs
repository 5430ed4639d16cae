//! Data layer module
//!
//! Handles all data persistence:
//! - Profiles (local cache of remote actors)
//! - Content (federated posts)

mod database;
mod models;

pub use database::Database;
pub use models::*;
