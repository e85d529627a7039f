use time::OffsetDateTime;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    faq::{
        dto::ListParams,
        repo_types::{Faq, FaqContent},
    },
    state::AppState,
};

const NOT_FOUND: &str = "FAQ not found";

/// One page of a listing.
#[derive(Debug, Clone)]
pub struct FaqPage {
    pub items: Vec<Faq>,
    pub total_count: i64,
    pub current_page: i64,
    pub total_pages: i64,
}

fn validate(content: &FaqContent) -> AppResult<()> {
    if content.question.trim().is_empty()
        || content.answer.trim().is_empty()
        || content.category.trim().is_empty()
    {
        return Err(AppError::validation("All fields are required"));
    }
    Ok(())
}

/// The one ownership rule every mutation goes through.
pub fn ensure_owner(faq: &Faq, requester: Uuid, denied: &str) -> AppResult<()> {
    if faq.is_owned_by(requester) {
        Ok(())
    } else {
        warn!(faq_id = %faq.id, owner_id = %faq.owner.id, requester = %requester, "non-owner mutation rejected");
        Err(AppError::forbidden(denied))
    }
}

pub async fn get(st: &AppState, id: Uuid) -> AppResult<Faq> {
    st.faqs
        .find(id)
        .await?
        .ok_or_else(|| AppError::not_found(NOT_FOUND))
}

async fn owned(st: &AppState, id: Uuid, requester: Uuid, denied: &str) -> AppResult<Faq> {
    let faq = get(st, id).await?;
    ensure_owner(&faq, requester, denied)?;
    Ok(faq)
}

pub async fn create(st: &AppState, owner_id: Uuid, content: FaqContent) -> AppResult<Faq> {
    validate(&content)?;
    let faq = st.faqs.insert(owner_id, &content).await?;
    info!(faq_id = %faq.id, user_id = %owner_id, "faq created");
    Ok(faq)
}

pub async fn list(st: &AppState, params: &ListParams) -> AppResult<FaqPage> {
    let (items, total_count) = st
        .faqs
        .list(&params.filter, params.offset(), params.limit)
        .await?;
    Ok(FaqPage {
        items,
        total_count,
        current_page: params.page,
        total_pages: params.total_pages(total_count),
    })
}

pub async fn edit(
    st: &AppState,
    id: Uuid,
    content: FaqContent,
    requester: Uuid,
) -> AppResult<Faq> {
    validate(&content)?;
    owned(st, id, requester, "Unauthorized action").await?;
    let faq = st
        .faqs
        .update_content(id, &content)
        .await?
        .ok_or_else(|| AppError::not_found(NOT_FOUND))?;
    info!(faq_id = %id, user_id = %requester, "faq updated");
    Ok(faq)
}

pub async fn hard_delete(st: &AppState, id: Uuid, requester: Uuid) -> AppResult<()> {
    owned(st, id, requester, "Unauthorized to delete this FAQ").await?;
    if !st.faqs.delete(id).await? {
        return Err(AppError::not_found(NOT_FOUND));
    }
    info!(faq_id = %id, user_id = %requester, "faq permanently deleted");
    Ok(())
}

/// Trashing an already trashed FAQ succeeds and keeps its original `deleted_at`.
pub async fn soft_delete(st: &AppState, id: Uuid, requester: Uuid) -> AppResult<()> {
    let faq = owned(st, id, requester, "Unauthorized to delete this FAQ").await?;
    if faq.is_deleted {
        return Ok(());
    }
    if !st
        .faqs
        .set_deleted_at(id, Some(OffsetDateTime::now_utc()))
        .await?
    {
        return Err(AppError::not_found(NOT_FOUND));
    }
    info!(faq_id = %id, user_id = %requester, "faq moved to trash");
    Ok(())
}

pub async fn restore(st: &AppState, id: Uuid, requester: Uuid) -> AppResult<()> {
    let faq = owned(st, id, requester, "Unauthorized to restore this FAQ").await?;
    if !faq.is_deleted {
        return Err(AppError::validation("FAQ is not in trash"));
    }
    if !st.faqs.set_deleted_at(id, None).await? {
        return Err(AppError::not_found(NOT_FOUND));
    }
    info!(faq_id = %id, user_id = %requester, "faq restored");
    Ok(())
}
