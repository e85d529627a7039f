//! In-process store used when no database is configured, and by the tests.

use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{
    auth::{repo::UserRepo, repo_types::User},
    faq::{
        repo::FaqRepo,
        repo_types::{Faq, FaqContent, FaqFilter, Owner},
    },
};

#[derive(Debug, Clone)]
struct FaqRecord {
    id: Uuid,
    user_id: Uuid,
    content: FaqContent,
    deleted_at: Option<OffsetDateTime>,
    created_at: OffsetDateTime,
    updated_at: OffsetDateTime,
}

#[derive(Default)]
struct Inner {
    users: Vec<User>,
    // insertion order is listing order
    faqs: Vec<FaqRecord>,
}

impl Inner {
    fn expand(&self, r: &FaqRecord) -> anyhow::Result<Faq> {
        let owner = self
            .users
            .iter()
            .find(|u| u.id == r.user_id)
            .ok_or_else(|| anyhow::anyhow!("faq {} references missing user {}", r.id, r.user_id))?;
        Ok(Faq {
            id: r.id,
            owner: Owner {
                id: owner.id,
                name: owner.name.clone(),
            },
            question: r.content.question.clone(),
            answer: r.content.answer.clone(),
            category: r.content.category.clone(),
            is_deleted: r.deleted_at.is_some(),
            deleted_at: r.deleted_at,
            created_at: r.created_at,
            updated_at: r.updated_at,
        })
    }
}

#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepo for MemoryStore {
    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        let inner = self.inner.read().await;
        Ok(inner.users.iter().find(|u| u.email == email).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>> {
        let inner = self.inner.read().await;
        Ok(inner.users.iter().find(|u| u.id == id).cloned())
    }

    async fn create(
        &self,
        name: &str,
        email: &str,
        password_hash: &str,
    ) -> anyhow::Result<Option<User>> {
        let mut inner = self.inner.write().await;
        if inner.users.iter().any(|u| u.email == email) {
            return Ok(None);
        }
        let user = User {
            id: Uuid::new_v4(),
            name: name.to_string(),
            email: email.to_string(),
            password_hash: password_hash.to_string(),
            password_history: Vec::new(),
            created_at: OffsetDateTime::now_utc(),
        };
        inner.users.push(user.clone());
        Ok(Some(user))
    }

    async fn update_password(
        &self,
        id: Uuid,
        password_hash: &str,
        history: &[String],
    ) -> anyhow::Result<()> {
        let mut inner = self.inner.write().await;
        let user = inner
            .users
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or_else(|| anyhow::anyhow!("user {id} not found"))?;
        user.password_hash = password_hash.to_string();
        user.password_history = history.to_vec();
        Ok(())
    }
}

#[async_trait]
impl FaqRepo for MemoryStore {
    async fn insert(&self, owner_id: Uuid, content: &FaqContent) -> anyhow::Result<Faq> {
        let mut inner = self.inner.write().await;
        let now = OffsetDateTime::now_utc();
        let record = FaqRecord {
            id: Uuid::new_v4(),
            user_id: owner_id,
            content: content.clone(),
            deleted_at: None,
            created_at: now,
            updated_at: now,
        };
        let faq = inner.expand(&record)?;
        inner.faqs.push(record);
        Ok(faq)
    }

    async fn find(&self, id: Uuid) -> anyhow::Result<Option<Faq>> {
        let inner = self.inner.read().await;
        inner
            .faqs
            .iter()
            .find(|r| r.id == id)
            .map(|r| inner.expand(r))
            .transpose()
    }

    async fn list(
        &self,
        filter: &FaqFilter,
        offset: i64,
        limit: i64,
    ) -> anyhow::Result<(Vec<Faq>, i64)> {
        let inner = self.inner.read().await;
        let mut matched = Vec::new();
        for r in &inner.faqs {
            let faq = inner.expand(r)?;
            if filter.matches(&faq) {
                matched.push(faq);
            }
        }
        let total = matched.len() as i64;
        let page = matched
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .collect();
        Ok((page, total))
    }

    async fn update_content(&self, id: Uuid, content: &FaqContent) -> anyhow::Result<Option<Faq>> {
        let mut inner = self.inner.write().await;
        let Some(idx) = inner.faqs.iter().position(|r| r.id == id) else {
            return Ok(None);
        };
        let record = &mut inner.faqs[idx];
        record.content = content.clone();
        record.updated_at = OffsetDateTime::now_utc();
        let record = record.clone();
        inner.expand(&record).map(Some)
    }

    async fn set_deleted_at(
        &self,
        id: Uuid,
        deleted_at: Option<OffsetDateTime>,
    ) -> anyhow::Result<bool> {
        let mut inner = self.inner.write().await;
        match inner.faqs.iter_mut().find(|r| r.id == id) {
            Some(r) => {
                r.deleted_at = deleted_at;
                r.updated_at = OffsetDateTime::now_utc();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete(&self, id: Uuid) -> anyhow::Result<bool> {
        let mut inner = self.inner.write().await;
        let before = inner.faqs.len();
        inner.faqs.retain(|r| r.id != id);
        Ok(inner.faqs.len() < before)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn content(q: &str) -> FaqContent {
        FaqContent {
            question: q.into(),
            answer: "answer".into(),
            category: "general".into(),
        }
    }

    #[tokio::test]
    async fn duplicate_email_is_refused() {
        let store = MemoryStore::new();
        assert!(store.create("A", "a@x.io", "h").await.unwrap().is_some());
        assert!(store.create("B", "a@x.io", "h").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn list_pages_in_insertion_order() {
        let store = MemoryStore::new();
        let owner = store.create("A", "a@x.io", "h").await.unwrap().unwrap();
        for i in 0..5 {
            store.insert(owner.id, &content(&format!("q{i}"))).await.unwrap();
        }
        let (page, total) = store.list(&FaqFilter::default(), 2, 2).await.unwrap();
        assert_eq!(total, 5);
        let qs: Vec<_> = page.iter().map(|f| f.question.as_str()).collect();
        assert_eq!(qs, ["q2", "q3"]);
    }

    #[tokio::test]
    async fn deleted_flag_follows_timestamp() {
        let store = MemoryStore::new();
        let owner = store.create("A", "a@x.io", "h").await.unwrap().unwrap();
        let faq = store.insert(owner.id, &content("q")).await.unwrap();

        store
            .set_deleted_at(faq.id, Some(OffsetDateTime::now_utc()))
            .await
            .unwrap();
        let got = store.find(faq.id).await.unwrap().unwrap();
        assert!(got.is_deleted && got.deleted_at.is_some());

        store.set_deleted_at(faq.id, None).await.unwrap();
        let got = store.find(faq.id).await.unwrap().unwrap();
        assert!(!got.is_deleted && got.deleted_at.is_none());
    }

    #[tokio::test]
    async fn insert_for_unknown_owner_fails() {
        let store = MemoryStore::new();
        assert!(store.insert(Uuid::new_v4(), &content("q")).await.is_err());
    }
}
