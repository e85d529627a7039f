use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde_json::json;
use tracing::instrument;

use crate::{
    auth::{
        dto::{AuthResponse, ChangePasswordRequest, LoginRequest, MessageResponse, RegisterRequest},
        extractors::AuthUser,
        services,
    },
    error::{AppError, AppResult},
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/changePassword", post(change_password))
        .route("/auth/verify-token", post(verify_token))
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> AppResult<(StatusCode, Json<MessageResponse>)> {
    let Json(payload) = payload?;
    let res = services::register(&state, payload).await?;
    Ok((StatusCode::CREATED, Json(res)))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> AppResult<Json<AuthResponse>> {
    let Json(payload) = payload?;
    Ok(Json(services::login(&state, payload).await?))
}

#[instrument(skip(state, payload), fields(user_id = %user.id))]
pub async fn change_password(
    State(state): State<AppState>,
    user: AuthUser,
    payload: Result<Json<ChangePasswordRequest>, JsonRejection>,
) -> AppResult<Json<MessageResponse>> {
    let Json(payload) = payload?;
    Ok(Json(services::change_password(&state, &user, payload).await?))
}

/// Guard failures are answered here so the client gets `valid: false`.
#[instrument(skip_all)]
pub async fn verify_token(user: Result<AuthUser, AppError>) -> Response {
    match user {
        Ok(user) => Json(services::verify_token(&user)).into_response(),
        Err(e) => {
            let status = match e {
                AppError::Internal(_) => e.status_code(),
                _ => StatusCode::UNAUTHORIZED,
            };
            (
                status,
                Json(json!({ "valid": false, "message": e.public_message() })),
            )
                .into_response()
        }
    }
}
