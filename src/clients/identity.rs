// src/clients/identity.rs

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

use crate::{error::AppError, models::user::UserProfile};

/// Identity collaborator: resolves an opaque, pre-verified user id to a
/// profile. Only consulted when a user is first seen or their profile is
/// displayed; verification itself happens upstream.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn fetch_profile(&self, user_id: &str) -> Result<UserProfile, AppError>;
}

/// Clerk Backend API client.
#[derive(Clone)]
pub struct ClerkClient {
    http: Client,
    api_url: String,
    secret_key: String,
}

#[derive(Debug, Deserialize)]
struct ClerkUser {
    id: String,
    first_name: Option<String>,
    last_name: Option<String>,
    image_url: Option<String>,
}

impl ClerkClient {
    pub fn new(secret_key: String, api_url: String, http: Client) -> Self {
        Self {
            http,
            api_url,
            secret_key,
        }
    }
}

#[async_trait]
impl IdentityProvider for ClerkClient {
    async fn fetch_profile(&self, user_id: &str) -> Result<UserProfile, AppError> {
        let res = self
            .http
            .get(format!("{}/users/{}", self.api_url, user_id))
            .bearer_auth(&self.secret_key)
            .timeout(Duration::from_secs(10))
            .send()
            .await?;

        if res.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(AppError::AuthError("Unknown user".to_string()));
        }
        if !res.status().is_success() {
            let status = res.status();
            return Err(AppError::InternalServerError(format!(
                "Identity provider error {}",
                status
            )));
        }

        let user: ClerkUser = res.json().await?;

        let display_name = match (user.first_name, user.last_name) {
            (Some(first), Some(last)) => Some(format!("{} {}", first, last)),
            (Some(first), None) => Some(first),
            (None, Some(last)) => Some(last),
            (None, None) => None,
        };

        Ok(UserProfile {
            id: user.id,
            display_name,
            avatar_url: user.image_url,
        })
    }
}
