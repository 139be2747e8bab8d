// src/utils/auth.rs

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
};

use crate::{error::AppError, state::AppState};

/// Header carrying the pre-verified opaque user id. Verification happens
/// upstream of this service; the value is trusted as-is.
pub const USER_ID_HEADER: &str = "clerk-user-id";

/// The authenticated caller, injected into request extensions by
/// `auth_middleware` for handlers to consume.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: String,
}

/// Axum Middleware: Authentication.
///
/// Requires the identity header on every request. On the first request from
/// a given user, fetches their profile from the identity provider and
/// provisions the users row (lazy creation; rows are never deleted here).
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let user_id = req
        .headers()
        .get(USER_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .filter(|v| !v.is_empty())
        .map(|v| v.to_string())
        .ok_or_else(|| AppError::AuthError("Unauthorized".to_string()))?;

    ensure_user(&state, &user_id).await?;

    req.extensions_mut().insert(AuthUser { id: user_id });
    Ok(next.run(req).await)
}

/// Creates the users row on first sight. The ON CONFLICT guard makes
/// concurrent first requests from the same user converge on one row.
async fn ensure_user(state: &AppState, user_id: &str) -> Result<(), AppError> {
    let known: Option<(String,)> = sqlx::query_as("SELECT id FROM users WHERE id = $1")
        .bind(user_id)
        .fetch_optional(&state.pool)
        .await?;

    if known.is_some() {
        return Ok(());
    }

    let profile = state.identity.fetch_profile(user_id).await?;
    tracing::info!("Provisioning user {}", user_id);

    sqlx::query(
        r#"
        INSERT INTO users (id, display_name, avatar_url)
        VALUES ($1, $2, $3)
        ON CONFLICT (id) DO NOTHING
        "#,
    )
    .bind(&profile.id)
    .bind(&profile.display_name)
    .bind(&profile.avatar_url)
    .execute(&state.pool)
    .await?;

    Ok(())
}
