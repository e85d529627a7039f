use tracing::{debug, warn};
use uuid::Uuid;

use crate::{
    auth::dto::{ChangePasswordRequest, LoginRequest, PublicUser, RegisterRequest},
    client::{
        api::{ApiClient, ClientError, FaqQuery},
        session::{Pagination, PersistedSession, SessionStorage},
    },
    faq::{dto::FaqRequest, repo_types::Faq},
};

/// Outcome handed back to the UI after each operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpResult {
    pub success: bool,
    pub message: String,
}

impl OpResult {
    fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }

    fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}

/// Client-side session and FAQ list. One instance per UI; `&mut self` keeps it to a single
/// outstanding call.
pub struct ClientStore<S: SessionStorage> {
    api: ApiClient,
    storage: S,
    session: PersistedSession,
    loading: bool,
    error: Option<String>,
}

impl<S: SessionStorage> ClientStore<S> {
    /// Builds the store, rehydrating whatever session `storage` holds.
    pub fn new(api: ApiClient, storage: S) -> Result<Self, ClientError> {
        let session = storage
            .load()
            .map_err(ClientError::Storage)?
            .unwrap_or_default();
        Ok(Self {
            api,
            storage,
            session,
            loading: false,
            error: None,
        })
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.is_authenticated
    }

    pub fn user(&self) -> Option<&PublicUser> {
        self.session.user.as_ref()
    }

    pub fn token(&self) -> Option<&str> {
        self.session.token.as_deref()
    }

    pub fn faqs(&self) -> &[Faq] {
        &self.session.faqs
    }

    pub fn pagination(&self) -> Pagination {
        self.session.pagination
    }

    pub fn loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn set_user(&mut self, user: PublicUser) {
        self.session.user = Some(user);
        self.persist();
    }

    fn begin(&mut self) {
        self.loading = true;
        self.error = None;
    }

    fn succeed(&mut self, message: impl Into<String>) -> OpResult {
        self.loading = false;
        self.persist();
        OpResult::ok(message)
    }

    fn fail(&mut self, err: ClientError, fallback: &str) -> OpResult {
        let message = err.user_message(fallback);
        warn!(error = %err, "{fallback}");
        self.loading = false;
        self.error = Some(message.clone());
        OpResult::failed(message)
    }

    fn persist(&mut self) {
        if let Err(e) = self.storage.save(&self.session) {
            let err = ClientError::Storage(e);
            warn!(error = %err, "failed to persist session");
            self.error = Some(err.to_string());
        }
    }

    fn reset_session(&mut self) {
        self.session = PersistedSession::default();
        if let Err(e) = self.storage.clear() {
            let err = ClientError::Storage(e);
            warn!(error = %err, "failed to clear session");
            self.error = Some(err.to_string());
        }
    }

    fn require_token(&self) -> Result<String, ClientError> {
        self.session
            .token
            .clone()
            .ok_or(ClientError::MissingToken)
    }

    pub async fn login(&mut self, email: &str, password: &str) -> OpResult {
        self.begin();
        let req = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        match self.api.login(&req).await {
            Ok(res) => {
                self.session.is_authenticated = true;
                self.session.user = Some(res.user);
                self.session.token = Some(res.token);
                self.succeed("Login successful")
            }
            Err(e) => self.fail(e, "Login failed"),
        }
    }

    pub async fn register(&mut self, name: &str, email: &str, password: &str) -> OpResult {
        self.begin();
        let req = RegisterRequest {
            name: name.to_string(),
            email: email.to_string(),
            password: password.to_string(),
        };
        match self.api.register(&req).await {
            Ok(res) => self.succeed(res.message),
            Err(e) => self.fail(e, "Registration failed"),
        }
    }

    pub fn logout(&mut self) {
        debug!("logging out");
        self.error = None;
        self.reset_session();
    }

    pub async fn change_password(&mut self, old_password: &str, new_password: &str) -> OpResult {
        self.begin();
        let req = ChangePasswordRequest {
            old_password: old_password.to_string(),
            new_password: new_password.to_string(),
        };
        let res = match self.require_token() {
            Ok(token) => self.api.change_password(&token, &req).await,
            Err(e) => Err(e),
        };
        match res {
            Ok(res) => self.succeed(res.message),
            Err(e) => self.fail(e, "Password change failed"),
        }
    }

    /// Re-validates the stored token. Any failure drops the session.
    pub async fn check_auth(&mut self) -> bool {
        let Some(token) = self.session.token.clone() else {
            if self.session.is_authenticated {
                self.session.is_authenticated = false;
                self.persist();
            }
            return false;
        };

        self.begin();
        match self.api.verify_token(&token).await {
            Ok(res) if res.valid => {
                self.session.is_authenticated = true;
                self.session.user = Some(res.user);
                self.succeed("Token valid");
                true
            }
            Ok(_) => {
                self.loading = false;
                self.reset_session();
                false
            }
            Err(e) => {
                self.fail(e, "Session expired, please login again.");
                self.reset_session();
                false
            }
        }
    }

    pub async fn fetch_faqs(
        &mut self,
        page: i64,
        limit: i64,
        search: Option<&str>,
        show_deleted: bool,
    ) -> OpResult {
        let query = FaqQuery {
            page,
            limit,
            search: search.filter(|s| !s.is_empty()).map(str::to_string),
            show_deleted,
        };
        self.begin();
        match self.load_page(&query).await {
            Ok(message) => self.succeed(message),
            Err(e) => self.fail(e, "Failed to fetch FAQs"),
        }
    }

    async fn load_page(&mut self, query: &FaqQuery) -> Result<String, ClientError> {
        let token = self.require_token()?;
        let res = self.api.list_faqs(&token, query).await?;
        self.session.faqs = res.faqs;
        self.session.pagination = Pagination {
            total_faqs: res.total_faqs,
            current_page: res.current_page,
            total_pages: res.total_pages,
        };
        Ok(res.message)
    }

    pub async fn add_faq(&mut self, faq: FaqRequest) -> OpResult {
        self.begin();
        let res = match self.require_token() {
            Ok(token) => self.api.add_faq(&token, &faq).await,
            Err(e) => Err(e),
        };
        match res {
            Ok(res) => {
                self.session.faqs.push(res.faq);
                self.succeed(res.message)
            }
            Err(e) => self.fail(e, "Failed to add FAQ"),
        }
    }

    pub async fn edit_faq(&mut self, id: Uuid, faq: FaqRequest) -> OpResult {
        self.begin();
        let res = match self.require_token() {
            Ok(token) => self.api.edit_faq(&token, id, &faq).await,
            Err(e) => Err(e),
        };
        match res {
            Ok(res) => {
                if let Some(slot) = self.session.faqs.iter_mut().find(|f| f.id == id) {
                    *slot = res.faq;
                }
                self.succeed(res.message)
            }
            Err(e) => self.fail(e, "Failed to update FAQ"),
        }
    }

    pub async fn delete_faq(&mut self, id: Uuid) -> OpResult {
        self.begin();
        let res = match self.require_token() {
            Ok(token) => self.api.delete_faq(&token, id).await,
            Err(e) => Err(e),
        };
        match res {
            Ok(res) => {
                self.session.faqs.retain(|f| f.id != id);
                self.succeed(res.message)
            }
            Err(e) => self.fail(e, "Failed to delete FAQ"),
        }
    }

    pub async fn soft_delete_faq(&mut self, id: Uuid) -> OpResult {
        self.begin();
        let res = match self.require_token() {
            Ok(token) => self.api.soft_delete_faq(&token, id).await,
            Err(e) => Err(e),
        };
        match res {
            Ok(res) => {
                self.session.faqs.retain(|f| f.id != id);
                self.succeed(res.message)
            }
            Err(e) => self.fail(e, "Failed to move FAQ to trash"),
        }
    }

    /// Restores a trashed FAQ, then reloads the first page including the trash.
    pub async fn restore_faq(&mut self, id: Uuid) -> OpResult {
        self.begin();
        let token = match self.require_token() {
            Ok(token) => token,
            Err(e) => return self.fail(e, "Failed to restore FAQ"),
        };
        let message = match self.api.restore_faq(&token, id).await {
            Ok(res) => res.message,
            Err(e) => return self.fail(e, "Failed to restore FAQ"),
        };
        let query = FaqQuery {
            show_deleted: true,
            ..FaqQuery::default()
        };
        match self.load_page(&query).await {
            Ok(_) => self.succeed(message),
            Err(e) => self.fail(e, "Failed to fetch FAQs"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        app::build_app,
        client::session::{FileSessionStorage, MemorySessionStorage},
        state::AppState,
    };

    async fn spawn_server() -> String {
        let app = build_app(AppState::fake());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    async fn logged_in(base: &str, email: &str) -> ClientStore<MemorySessionStorage> {
        let mut store =
            ClientStore::new(ApiClient::new(base).unwrap(), MemorySessionStorage::default())
                .unwrap();
        assert!(store.register("Ann", email, "secret1").await.success);
        assert!(store.login(email, "secret1").await.success);
        store
    }

    fn faq(q: &str) -> FaqRequest {
        FaqRequest {
            question: q.into(),
            answer: "a".into(),
            category: "general".into(),
        }
    }

    #[tokio::test]
    async fn register_then_login_persists_session() {
        let base = spawn_server().await;
        let dir = tempfile::tempdir().unwrap();

        let mut store = ClientStore::new(
            ApiClient::new(&base).unwrap(),
            FileSessionStorage::new(dir.path()),
        )
        .unwrap();
        let reg = store.register("Ann", "ann@x.io", "secret1").await;
        assert!(reg.success);
        assert!(reg.message.starts_with("User registered successfully"));
        assert!(!store.is_authenticated());

        let res = store.login("ann@x.io", "secret1").await;
        assert!(res.success);
        assert!(store.is_authenticated());
        assert!(!store.loading());
        assert_eq!(store.user().unwrap().name, "Ann");

        let mut reopened = ClientStore::new(
            ApiClient::new(&base).unwrap(),
            FileSessionStorage::new(dir.path()),
        )
        .unwrap();
        assert!(reopened.is_authenticated());
        assert_eq!(reopened.token(), store.token());
        assert!(reopened.check_auth().await);
    }

    #[tokio::test]
    async fn failed_login_keeps_server_message() {
        let base = spawn_server().await;
        let mut store =
            ClientStore::new(ApiClient::new(&base).unwrap(), MemorySessionStorage::default())
                .unwrap();

        let res = store.login("ghost@x.io", "nope").await;
        assert!(!res.success);
        assert_eq!(res.message, "Invalid credentials");
        assert_eq!(store.error(), Some("Invalid credentials"));
        assert!(!store.loading());
        assert!(!store.is_authenticated());
    }

    #[tokio::test]
    async fn unreachable_server_uses_fallback_message() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        drop(listener);

        let mut store =
            ClientStore::new(ApiClient::new(&base).unwrap(), MemorySessionStorage::default())
                .unwrap();
        let res = store.login("a@x.io", "pw").await;
        assert_eq!(res, OpResult::failed("Login failed"));
    }

    #[tokio::test]
    async fn faq_ops_without_token_fail_locally() {
        let mut store = ClientStore::new(
            ApiClient::new("http://127.0.0.1:9").unwrap(),
            MemorySessionStorage::default(),
        )
        .unwrap();

        let res = store.add_faq(faq("q")).await;
        assert_eq!(
            res,
            OpResult::failed("Token not found, please login again.")
        );
        let res = store.fetch_faqs(1, 10, None, false).await;
        assert_eq!(res.message, "Token not found, please login again.");
        assert!(store.faqs().is_empty());
    }

    #[tokio::test]
    async fn faq_lifecycle_updates_local_list() {
        let base = spawn_server().await;
        let mut store = logged_in(&base, "ann@x.io").await;

        let res = store.add_faq(faq("first")).await;
        assert_eq!(res, OpResult::ok("FAQ added successfully"));
        store.add_faq(faq("second")).await;
        assert_eq!(store.faqs().len(), 2);
        let first = store.faqs()[0].id;

        let res = store.edit_faq(first, faq("first, edited")).await;
        assert!(res.success);
        assert_eq!(store.faqs()[0].question, "first, edited");

        assert!(store.fetch_faqs(1, 1, None, false).await.success);
        assert_eq!(store.faqs().len(), 1);
        assert_eq!(
            store.pagination(),
            Pagination {
                total_faqs: 2,
                current_page: 1,
                total_pages: 2
            }
        );

        store.fetch_faqs(1, 10, None, false).await;
        let res = store.soft_delete_faq(first).await;
        assert_eq!(res, OpResult::ok("FAQ moved to trash"));
        assert!(store.faqs().iter().all(|f| f.id != first));

        let res = store.restore_faq(first).await;
        assert_eq!(res, OpResult::ok("FAQ restored successfully"));
        let restored = store.faqs().iter().find(|f| f.id == first).unwrap();
        assert!(!restored.is_deleted);

        let res = store.delete_faq(first).await;
        assert_eq!(res, OpResult::ok("FAQ permanently deleted"));
        assert_eq!(store.faqs().len(), 1);
    }

    #[tokio::test]
    async fn failed_edit_keeps_prior_data() {
        let base = spawn_server().await;
        let mut store = logged_in(&base, "ann@x.io").await;
        store.add_faq(faq("mine")).await;
        let before = store.faqs().to_vec();

        let res = store.edit_faq(Uuid::new_v4(), faq("x")).await;
        assert_eq!(res, OpResult::failed("FAQ not found"));
        assert_eq!(store.faqs(), before.as_slice());
        assert_eq!(store.error(), Some("FAQ not found"));
    }

    #[tokio::test]
    async fn search_narrows_fetched_page() {
        let base = spawn_server().await;
        let mut store = logged_in(&base, "ann@x.io").await;
        store.add_faq(faq("How do refunds work?")).await;
        store.add_faq(faq("Shipping times")).await;

        store.fetch_faqs(1, 10, Some("REFUND"), false).await;
        assert_eq!(store.faqs().len(), 1);
        assert_eq!(store.pagination().total_faqs, 1);
    }

    #[tokio::test]
    async fn change_password_reports_reuse() {
        let base = spawn_server().await;
        let mut store = logged_in(&base, "ann@x.io").await;

        let res = store.change_password("secret1", "secret2").await;
        assert_eq!(res, OpResult::ok("Password updated successfully"));
        let res = store.change_password("secret2", "secret1").await;
        assert_eq!(res, OpResult::failed("Cannot reuse the last 3 passwords"));
        let res = store.change_password("wrong", "secret9").await;
        assert_eq!(res.message, "Incorrect old password");
    }

    #[tokio::test]
    async fn check_auth_with_bad_token_clears_session() {
        let base = spawn_server().await;
        let mut storage = MemorySessionStorage::default();
        storage
            .save(&PersistedSession {
                is_authenticated: true,
                token: Some("garbage".into()),
                ..Default::default()
            })
            .unwrap();

        let mut store = ClientStore::new(ApiClient::new(&base).unwrap(), storage).unwrap();
        assert!(store.is_authenticated());
        assert!(!store.check_auth().await);
        assert!(!store.is_authenticated());
        assert_eq!(store.token(), None);
        assert_eq!(store.storage.load().unwrap(), None);
    }

    #[tokio::test]
    async fn logout_clears_state_and_storage() {
        let base = spawn_server().await;
        let mut store = logged_in(&base, "ann@x.io").await;
        store.add_faq(faq("q")).await;

        store.logout();
        assert!(!store.is_authenticated());
        assert!(store.user().is_none());
        assert!(store.faqs().is_empty());
        assert_eq!(store.storage.load().unwrap(), None);
        assert!(!store.check_auth().await);
    }

    #[tokio::test]
    async fn set_user_is_persisted() {
        let mut store = ClientStore::new(
            ApiClient::new("http://127.0.0.1:9").unwrap(),
            MemorySessionStorage::default(),
        )
        .unwrap();
        let user = PublicUser {
            id: Uuid::new_v4(),
            name: "Bo".into(),
            email: None,
        };
        store.set_user(user.clone());
        assert_eq!(store.storage.load().unwrap().unwrap().user, Some(user));
    }
}
