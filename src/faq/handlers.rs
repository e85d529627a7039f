use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    routing::{delete, get, post, put},
    Json, Router,
};
use tracing::instrument;
use uuid::Uuid;

use crate::{
    auth::{dto::MessageResponse, extractors::AuthUser},
    error::{AppError, AppResult},
    faq::{
        dto::{FaqListQuery, FaqListResponse, FaqRequest, FaqResponse, ListParams},
        services,
    },
    state::AppState,
};

pub fn faq_routes() -> Router<AppState> {
    Router::new()
        .route("/faq/add", post(add_faq))
        .route("/faq/edit/:id", put(edit_faq))
        .route("/faq/faqall", get(list_faqs))
        .route("/faq/delete/:id", delete(delete_faq))
        .route("/faq/soft-delete/:id", put(soft_delete_faq))
        .route("/faq/restore/:id", put(restore_faq))
}

/// Ids that are not UUIDs cannot name a FAQ.
fn parse_id(raw: &str) -> AppResult<Uuid> {
    Uuid::parse_str(raw).map_err(|_| AppError::not_found("FAQ not found"))
}

#[instrument(skip(state, body), fields(user_id = %user.id))]
pub async fn add_faq(
    State(state): State<AppState>,
    user: AuthUser,
    body: Result<Json<FaqRequest>, JsonRejection>,
) -> AppResult<(StatusCode, Json<FaqResponse>)> {
    let Json(body) = body?;
    let faq = services::create(&state, user.id, body.into()).await?;
    Ok((
        StatusCode::CREATED,
        Json(FaqResponse {
            message: "FAQ added successfully".into(),
            faq,
        }),
    ))
}

#[instrument(skip(state, body), fields(user_id = %user.id))]
pub async fn edit_faq(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
    body: Result<Json<FaqRequest>, JsonRejection>,
) -> AppResult<Json<FaqResponse>> {
    let id = parse_id(&id)?;
    let Json(body) = body?;
    let faq = services::edit(&state, id, body.into(), user.id).await?;
    Ok(Json(FaqResponse {
        message: "FAQ updated successfully".into(),
        faq,
    }))
}

#[instrument(skip(state), fields(user_id = %user.id))]
pub async fn list_faqs(
    State(state): State<AppState>,
    user: AuthUser,
    query: Result<Query<FaqListQuery>, QueryRejection>,
) -> AppResult<Json<FaqListResponse>> {
    let Query(q) = query?;
    let params = ListParams::from(q);
    let page = services::list(&state, &params).await?;
    Ok(Json(FaqListResponse {
        message: "FAQs fetched successfully".into(),
        total_faqs: page.total_count,
        current_page: page.current_page,
        total_pages: page.total_pages,
        faqs: page.items,
    }))
}

#[instrument(skip(state), fields(user_id = %user.id))]
pub async fn delete_faq(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> AppResult<Json<MessageResponse>> {
    services::hard_delete(&state, parse_id(&id)?, user.id).await?;
    Ok(Json(MessageResponse::new("FAQ permanently deleted")))
}

#[instrument(skip(state), fields(user_id = %user.id))]
pub async fn soft_delete_faq(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> AppResult<Json<MessageResponse>> {
    services::soft_delete(&state, parse_id(&id)?, user.id).await?;
    Ok(Json(MessageResponse::new("FAQ moved to trash")))
}

#[instrument(skip(state), fields(user_id = %user.id))]
pub async fn restore_faq(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> AppResult<Json<MessageResponse>> {
    services::restore(&state, parse_id(&id)?, user.id).await?;
    Ok(Json(MessageResponse::new("FAQ restored successfully")))
}
