use std::time::Duration;

use anyhow::Context;
use reqwest::{RequestBuilder, StatusCode};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::{
    auth::dto::{
        AuthResponse, ChangePasswordRequest, LoginRequest, MessageResponse, RegisterRequest,
        VerifyResponse,
    },
    faq::dto::{FaqListResponse, FaqRequest, FaqResponse},
};

#[derive(Debug, Error)]
pub enum ClientError {
    /// The server answered with a non-success status.
    #[error("{message}")]
    Api { status: StatusCode, message: String },

    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Token not found, please login again.")]
    MissingToken,

    #[error("session storage: {0:#}")]
    Storage(anyhow::Error),
}

impl ClientError {
    /// Text to show the user: the server's message verbatim, otherwise `fallback`.
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            ClientError::Api { message, .. } if !message.is_empty() => message.clone(),
            ClientError::MissingToken => self.to_string(),
            _ => fallback.to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

/// `GET /faq/faqall` parameters as sent on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FaqQuery {
    pub page: i64,
    pub limit: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    pub show_deleted: bool,
}

impl Default for FaqQuery {
    fn default() -> Self {
        Self {
            page: 1,
            limit: 10,
            search: None,
            show_deleted: false,
        }
    }
}

/// Thin typed wrapper over the portal's HTTP API.
#[derive(Clone)]
pub struct ApiClient {
    base_url: String,
    client: reqwest::Client,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .context("Failed to create HTTP client")?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send<T: DeserializeOwned>(&self, req: RequestBuilder) -> Result<T, ClientError> {
        let response = req.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorBody>(&body)
                .ok()
                .and_then(|b| b.message)
                .unwrap_or_else(|| status.canonical_reason().unwrap_or("").to_string());
            return Err(ClientError::Api { status, message });
        }
        Ok(response.json::<T>().await?)
    }

    pub async fn register(&self, req: &RegisterRequest) -> Result<MessageResponse, ClientError> {
        self.send(self.client.post(self.url("/auth/register")).json(req))
            .await
    }

    pub async fn login(&self, req: &LoginRequest) -> Result<AuthResponse, ClientError> {
        self.send(self.client.post(self.url("/auth/login")).json(req))
            .await
    }

    pub async fn change_password(
        &self,
        token: &str,
        req: &ChangePasswordRequest,
    ) -> Result<MessageResponse, ClientError> {
        self.send(
            self.client
                .post(self.url("/auth/changePassword"))
                .bearer_auth(token)
                .json(req),
        )
        .await
    }

    pub async fn verify_token(&self, token: &str) -> Result<VerifyResponse, ClientError> {
        self.send(
            self.client
                .post(self.url("/auth/verify-token"))
                .bearer_auth(token),
        )
        .await
    }

    pub async fn list_faqs(
        &self,
        token: &str,
        query: &FaqQuery,
    ) -> Result<FaqListResponse, ClientError> {
        self.send(
            self.client
                .get(self.url("/faq/faqall"))
                .bearer_auth(token)
                .query(query),
        )
        .await
    }

    pub async fn add_faq(&self, token: &str, req: &FaqRequest) -> Result<FaqResponse, ClientError> {
        self.send(
            self.client
                .post(self.url("/faq/add"))
                .bearer_auth(token)
                .json(req),
        )
        .await
    }

    pub async fn edit_faq(
        &self,
        token: &str,
        id: Uuid,
        req: &FaqRequest,
    ) -> Result<FaqResponse, ClientError> {
        self.send(
            self.client
                .put(self.url(&format!("/faq/edit/{id}")))
                .bearer_auth(token)
                .json(req),
        )
        .await
    }

    pub async fn delete_faq(&self, token: &str, id: Uuid) -> Result<MessageResponse, ClientError> {
        self.send(
            self.client
                .delete(self.url(&format!("/faq/delete/{id}")))
                .bearer_auth(token),
        )
        .await
    }

    pub async fn soft_delete_faq(
        &self,
        token: &str,
        id: Uuid,
    ) -> Result<MessageResponse, ClientError> {
        self.send(
            self.client
                .put(self.url(&format!("/faq/soft-delete/{id}")))
                .bearer_auth(token),
        )
        .await
    }

    pub async fn restore_faq(&self, token: &str, id: Uuid) -> Result<MessageResponse, ClientError> {
        self.send(
            self.client
                .put(self.url(&format!("/faq/restore/{id}")))
                .bearer_auth(token),
        )
        .await
    }
}
