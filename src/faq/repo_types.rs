use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// FAQ row joined with its owner's name.
#[derive(Debug, FromRow)]
pub struct FaqRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub owner_name: String,
    pub question: String,
    pub answer: String,
    pub category: String,
    pub is_deleted: bool,
    pub deleted_at: Option<OffsetDateTime>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Owner {
    pub id: Uuid,
    pub name: String,
}

/// A FAQ with its owner expanded, as handed to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Faq {
    pub id: Uuid,
    #[serde(rename = "user")]
    pub owner: Owner,
    pub question: String,
    pub answer: String,
    pub category: String,
    pub is_deleted: bool,
    #[serde(with = "time::serde::rfc3339::option")]
    pub deleted_at: Option<OffsetDateTime>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl Faq {
    pub fn is_owned_by(&self, user_id: Uuid) -> bool {
        self.owner.id == user_id
    }
}

impl From<FaqRow> for Faq {
    fn from(r: FaqRow) -> Self {
        Self {
            id: r.id,
            owner: Owner {
                id: r.user_id,
                name: r.owner_name,
            },
            question: r.question,
            answer: r.answer,
            category: r.category,
            is_deleted: r.is_deleted,
            deleted_at: r.deleted_at,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

/// The editable part of a FAQ.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaqContent {
    pub question: String,
    pub answer: String,
    pub category: String,
}

/// Which records a listing matches.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FaqFilter {
    /// Case-insensitive literal substring over question, answer and category.
    pub search: Option<String>,
    pub show_deleted: bool,
}

impl FaqFilter {
    pub fn matches(&self, faq: &Faq) -> bool {
        if !self.show_deleted && faq.is_deleted {
            return false;
        }
        match &self.search {
            None => true,
            Some(s) => {
                let needle = s.to_lowercase();
                [&faq.question, &faq.answer, &faq.category]
                    .iter()
                    .any(|field| field.to_lowercase().contains(&needle))
            }
        }
    }

    /// ILIKE pattern for the search term, with LIKE metacharacters escaped.
    pub fn like_pattern(&self) -> Option<String> {
        self.search.as_ref().map(|s| {
            let mut escaped = String::with_capacity(s.len() + 2);
            escaped.push('%');
            for c in s.chars() {
                if matches!(c, '%' | '_' | '\\') {
                    escaped.push('\\');
                }
                escaped.push(c);
            }
            escaped.push('%');
            escaped
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn faq(q: &str, a: &str, c: &str, deleted: bool) -> Faq {
        let now = OffsetDateTime::now_utc();
        Faq {
            id: Uuid::new_v4(),
            owner: Owner {
                id: Uuid::new_v4(),
                name: "Owner".into(),
            },
            question: q.into(),
            answer: a.into(),
            category: c.into(),
            is_deleted: deleted,
            deleted_at: deleted.then_some(now),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn hides_trashed_unless_asked() {
        let trashed = faq("Q", "A", "general", true);
        assert!(!FaqFilter::default().matches(&trashed));
        let all = FaqFilter {
            show_deleted: true,
            ..Default::default()
        };
        assert!(all.matches(&trashed));
    }

    #[test]
    fn search_is_case_insensitive_over_three_fields() {
        let f = faq("How do refunds work?", "Within 30 days", "Billing", false);
        for term in ["REFUND", "30 days", "billing"] {
            let filter = FaqFilter {
                search: Some(term.into()),
                show_deleted: false,
            };
            assert!(filter.matches(&f), "{term}");
        }
        let miss = FaqFilter {
            search: Some("shipping".into()),
            show_deleted: false,
        };
        assert!(!miss.matches(&f));
    }

    #[test]
    fn search_with_trashed_hidden_is_anded() {
        let f = faq("Refunds", "A", "c", true);
        let filter = FaqFilter {
            search: Some("refund".into()),
            show_deleted: false,
        };
        assert!(!filter.matches(&f));
    }

    #[test]
    fn like_pattern_escapes_metacharacters() {
        let filter = FaqFilter {
            search: Some(r"50%_off\now".into()),
            show_deleted: false,
        };
        assert_eq!(filter.like_pattern().unwrap(), r"%50\%\_off\\now%");
        assert_eq!(FaqFilter::default().like_pattern(), None);
    }

    #[test]
    fn serializes_owner_as_user_in_camel_case() {
        let f = faq("Q", "A", "c", false);
        let v = serde_json::to_value(&f).unwrap();
        assert_eq!(v["user"]["name"], "Owner");
        assert_eq!(v["isDeleted"], false);
        assert!(v["deletedAt"].is_null());
        assert!(v["createdAt"].is_string());
    }
}
