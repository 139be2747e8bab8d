// tests/leaderboard_tests.rs

use std::sync::Arc;

use async_trait::async_trait;
use mentor_backend::{
    clients::{generation::GenerationClient, identity::IdentityProvider},
    config::Config,
    error::AppError,
    models::{message::ChatTurn, question::Question, user::UserProfile},
    routes,
    state::AppState,
};
use sqlx::postgres::PgPoolOptions;

struct StubModel;

#[async_trait]
impl GenerationClient for StubModel {
    async fn generate_questions(
        &self,
        _subject: &str,
        _difficulty: &str,
        count: u32,
    ) -> Result<Vec<Question>, AppError> {
        Ok((0..count)
            .map(|i| Question {
                question: format!("question {}", i + 1),
                options: vec![
                    format!("right-{}", i),
                    format!("wrong-a-{}", i),
                    format!("wrong-b-{}", i),
                    format!("wrong-c-{}", i),
                ],
                answer: format!("right-{}", i),
                explanation: "stub".to_string(),
            })
            .collect())
    }

    async fn chat_reply(&self, _transcript: &[ChatTurn]) -> Result<String, AppError> {
        Ok("stub reply".to_string())
    }

    async fn synthesize_speech(&self, _input: &str, _voice: &str) -> Result<Vec<u8>, AppError> {
        Ok(vec![0u8; 16])
    }
}

struct StubIdentity;

#[async_trait]
impl IdentityProvider for StubIdentity {
    async fn fetch_profile(&self, user_id: &str) -> Result<UserProfile, AppError> {
        Ok(UserProfile {
            id: user_id.to_string(),
            display_name: Some("Test User".to_string()),
            avatar_url: None,
        })
    }
}

async fn spawn_app() -> String {
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    let pool = PgPoolOptions::new()
        .max_connections(1)
        .connect(&database_url)
        .await
        .expect("Failed to connect to Postgres for testing.");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to migrate database");

    let config = Config {
        database_url: database_url.clone(),
        openai_api_key: "test-key".to_string(),
        openai_base_url: "http://127.0.0.1:1".to_string(),
        clerk_secret_key: "test-secret".to_string(),
        clerk_api_url: "http://127.0.0.1:1".to_string(),
        rust_log: "error".to_string(),
        port: 0,
    };

    let state = AppState {
        pool,
        config,
        identity: Arc::new(StubIdentity),
        model: Arc::new(StubModel),
    };

    let app = routes::create_router(state);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    address
}

fn unique_user() -> String {
    format!("user_{}", &uuid::Uuid::new_v4().to_string()[..8])
}

async fn record_attempt(
    client: &reqwest::Client,
    address: &str,
    user: &str,
    subject: &str,
    points: i32,
    duration_ms: i64,
) {
    let started: serde_json::Value = client
        .post(format!("{}/api/user/questions/start", address))
        .header("clerk-user-id", user)
        .json(&serde_json::json!({ "subject": subject, "difficulty": "hard" }))
        .send()
        .await
        .expect("Failed to execute request")
        .json()
        .await
        .expect("Invalid JSON body");

    let start = 1_700_000_000_000i64;
    let response = client
        .post(format!("{}/api/user/questions/end", address))
        .header("clerk-user-id", user)
        .json(&serde_json::json!({
            "questionId": started["questionId"].as_i64().unwrap(),
            "points": points,
            "startDate": start,
            "endDate": start + duration_ms,
        }))
        .send()
        .await
        .expect("Failed to execute request");
    assert!(response.status().is_success());
}

#[tokio::test]
async fn ranking_order_and_privacy_masking() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let subject = format!("subject_{}", &uuid::Uuid::new_v4().to_string()[..8]);

    let slow_low = unique_user();
    let slow_high = unique_user();
    let fast_high = unique_user();

    record_attempt(&client, &address, &slow_low, &subject, 3, 500).await;
    record_attempt(&client, &address, &slow_high, &subject, 5, 700).await;
    record_attempt(&client, &address, &fast_high, &subject, 5, 200).await;

    let body: serde_json::Value = client
        .get(format!("{}/api/user/leaderboard/{}/hard", address, subject))
        .header("clerk-user-id", &slow_high)
        .send()
        .await
        .expect("Failed to execute request")
        .json()
        .await
        .expect("Invalid JSON body");

    let ranked = body["data"].as_array().unwrap();
    assert_eq!(ranked.len(), 3);

    // Points descending, ties broken by faster duration
    assert_eq!(ranked[0]["points"], 5);
    assert_eq!(ranked[0]["duration"], 200);
    assert_eq!(ranked[1]["points"], 5);
    assert_eq!(ranked[1]["duration"], 700);
    assert_eq!(ranked[2]["points"], 3);
    assert_eq!(ranked[2]["duration"], 500);

    // Only the requester's own row carries an identity
    assert!(ranked[0]["userId"].is_null());
    assert_eq!(ranked[1]["userId"], slow_high);
    assert!(ranked[2]["userId"].is_null());

    // The requester's own record rides along
    assert_eq!(body["user"]["userId"], slow_high);
    assert_eq!(body["user"]["points"], 5);
    assert_eq!(body["user"]["duration"], 700);
}

#[tokio::test]
async fn own_record_returned_even_when_unranked() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let subject = format!("subject_{}", &uuid::Uuid::new_v4().to_string()[..8]);

    // Eleven other users fill the top 10
    for i in 0..11 {
        let user = unique_user();
        record_attempt(&client, &address, &user, &subject, 100 + i, 1_000).await;
    }

    let straggler = unique_user();
    record_attempt(&client, &address, &straggler, &subject, 1, 1_000).await;

    let body: serde_json::Value = client
        .get(format!("{}/api/user/leaderboard/{}/hard", address, subject))
        .header("clerk-user-id", &straggler)
        .send()
        .await
        .expect("Failed to execute request")
        .json()
        .await
        .expect("Invalid JSON body");

    let ranked = body["data"].as_array().unwrap();
    assert_eq!(ranked.len(), 10);
    assert!(ranked.iter().all(|row| row["points"].as_i64().unwrap() > 1));
    assert_eq!(body["user"]["points"], 1);
}

#[tokio::test]
async fn unstarted_requester_gets_null_self() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let subject = format!("subject_{}", &uuid::Uuid::new_v4().to_string()[..8]);
    let user = unique_user();

    let body: serde_json::Value = client
        .get(format!("{}/api/user/leaderboard/{}/hard", address, subject))
        .header("clerk-user-id", &user)
        .send()
        .await
        .expect("Failed to execute request")
        .json()
        .await
        .expect("Invalid JSON body");

    assert_eq!(body["data"].as_array().unwrap().len(), 0);
    assert!(body["user"].is_null());
}
