// src/config.rs

use dotenvy::dotenv;
use std::env;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub openai_api_key: String,
    pub openai_base_url: String,
    pub clerk_secret_key: String,
    pub clerk_api_url: String,
    pub rust_log: String,
    pub port: u16,
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        let database_url = env::var("DATABASE_URL").expect("DATABASE_URL must be set");

        let openai_api_key = env::var("OPENAI_API_KEY").expect("OPENAI_API_KEY must be set");

        let openai_base_url = env::var("OPENAI_BASE_URL")
            .unwrap_or_else(|_| "https://api.openai.com/v1".to_string());

        let clerk_secret_key = env::var("CLERK_SECRET_KEY").expect("CLERK_SECRET_KEY must be set");

        let clerk_api_url =
            env::var("CLERK_API_URL").unwrap_or_else(|_| "https://api.clerk.com/v1".to_string());

        let rust_log = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        let port = env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(3000);

        Self {
            database_url,
            openai_api_key,
            openai_base_url,
            clerk_secret_key,
            clerk_api_url,
            rust_log,
            port,
        }
    }
}
