use serde::{Deserialize, Serialize};

use crate::faq::repo_types::{Faq, FaqContent, FaqFilter};

pub const DEFAULT_PAGE: i64 = 1;
pub const DEFAULT_LIMIT: i64 = 10;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FaqRequest {
    #[serde(default)]
    pub question: String,
    #[serde(default)]
    pub answer: String,
    #[serde(default)]
    pub category: String,
}

impl From<FaqRequest> for FaqContent {
    fn from(r: FaqRequest) -> Self {
        Self {
            question: r.question,
            answer: r.answer,
            category: r.category,
        }
    }
}

/// Raw `GET /faq/faqall` query string. Values stay strings so bad numbers fall back to defaults
/// instead of rejecting the request.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FaqListQuery {
    pub page: Option<String>,
    pub limit: Option<String>,
    pub search: Option<String>,
    pub show_deleted: Option<String>,
}

/// Normalized listing parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListParams {
    pub page: i64,
    pub limit: i64,
    pub filter: FaqFilter,
}

impl Default for ListParams {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
            filter: FaqFilter::default(),
        }
    }
}

impl ListParams {
    /// Rows to skip. Saturates for page numbers far past the end.
    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.limit)
    }

    /// `ceil(total / limit)` without the overflow of `total + limit - 1`.
    pub fn total_pages(&self, total: i64) -> i64 {
        total / self.limit + i64::from(total % self.limit != 0)
    }
}

fn positive_or(raw: Option<&str>, default: i64) -> i64 {
    raw.and_then(|v| v.trim().parse::<i64>().ok())
        .filter(|v| *v > 0)
        .unwrap_or(default)
}

impl From<FaqListQuery> for ListParams {
    fn from(q: FaqListQuery) -> Self {
        Self {
            page: positive_or(q.page.as_deref(), DEFAULT_PAGE),
            limit: positive_or(q.limit.as_deref(), DEFAULT_LIMIT),
            filter: FaqFilter {
                search: q.search.filter(|s| !s.is_empty()),
                show_deleted: q.show_deleted.as_deref() == Some("true"),
            },
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FaqResponse {
    pub message: String,
    pub faq: Faq,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FaqListResponse {
    pub message: String,
    #[serde(rename = "totalFAQs")]
    pub total_faqs: i64,
    pub current_page: i64,
    pub total_pages: i64,
    pub faqs: Vec<Faq>,
}
