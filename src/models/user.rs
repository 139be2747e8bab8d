// src/models/user.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Represents the 'users' table in the database.
///
/// The primary key is the opaque id issued by the identity provider; rows are
/// provisioned lazily on a user's first authenticated request and never
/// deleted by this service.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// Profile data as returned by the identity provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: String,
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
}
