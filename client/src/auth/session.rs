//! Process-wide authentication state.
//!
//! `SessionManager` is the single source of truth for "is anyone signed in,
//! and who". The user record is mirrored into a `KeyValueStore` as a
//! write-through cache: every mutation writes the store first and only then
//! publishes the new state. The cache is never used to decide that a user is
//! authenticated; `initialize` always asks the API.

use std::sync::Arc;

use ballotbox_adapters::KeyValueStore;
use serde_json::{Map, Value};
use tokio::sync::watch;

use crate::auth::models::User;
use crate::auth::service::AuthService;
use crate::errors::{ApiError, ApiResult};

/// Storage key of the cached user record.
pub const USER_STORAGE_KEY: &str = "user";

#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub user: Option<User>,
    pub authenticated: bool,
    /// True until the first `initialize` settles.
    pub loading: bool,
}

impl Session {
    fn loading() -> Self {
        Self {
            user: None,
            authenticated: false,
            loading: true,
        }
    }

    fn signed_out() -> Self {
        Self {
            user: None,
            authenticated: false,
            loading: false,
        }
    }

    fn signed_in(user: User) -> Self {
        Self {
            user: Some(user),
            authenticated: true,
            loading: false,
        }
    }
}

pub struct SessionManager {
    auth: AuthService,
    store: Arc<dyn KeyValueStore>,
    state: watch::Sender<Session>,
}

impl SessionManager {
    pub fn new(auth: AuthService, store: Arc<dyn KeyValueStore>) -> Self {
        let (state, _) = watch::channel(Session::loading());
        Self { auth, store, state }
    }

    pub fn snapshot(&self) -> Session {
        self.state.borrow().clone()
    }

    pub fn user(&self) -> Option<User> {
        self.state.borrow().user.clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.state.borrow().authenticated
    }

    pub fn is_loading(&self) -> bool {
        self.state.borrow().loading
    }

    /// Receives every state change from now on.
    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.state.subscribe()
    }

    /// Revalidates the session with the API: refresh, then fetch the user.
    ///
    /// Any failure leaves the session signed out with the cache cleared.
    pub async fn initialize(&self) -> Session {
        self.state.send_modify(|session| session.loading = true);

        if let Err(err) = self.auth.refresh().await {
            tracing::info!("no resumable session: {}", err);
            self.clear();
            return self.snapshot();
        }

        match self.auth.current_user().await {
            Ok(user) => {
                if let Err(err) = self.persist(&user) {
                    // Memory follows the API; drop the stale cache entry.
                    tracing::warn!("failed to cache user {}: {}", user.id, err);
                    self.discard_cache();
                }
                tracing::info!("session restored for user {}", user.id);
                self.state.send_replace(Session::signed_in(user));
            }
            Err(err) => {
                tracing::info!("session refreshed but user lookup failed: {}", err);
                self.clear();
            }
        }
        self.snapshot()
    }

    /// Marks `user` as signed in. The API round trip has already happened.
    pub fn login(&self, user: User) -> ApiResult<()> {
        self.persist(&user)?;
        tracing::info!("user {} signed in", user.id);
        self.state.send_replace(Session::signed_in(user));
        Ok(())
    }

    /// Signs out locally whatever the API says.
    pub async fn logout(&self) {
        if let Err(err) = self.auth.logout().await {
            tracing::warn!("logout request failed: {}", err);
        }
        self.clear();
        tracing::info!("signed out");
    }

    /// Merges `partial` into the current user and persists the result.
    pub fn update_user(&self, partial: &Map<String, Value>) -> ApiResult<User> {
        let current = self
            .user()
            .ok_or_else(|| ApiError::validation("No signed-in user to update"))?;
        let updated = current.merged(partial)?;

        self.persist(&updated)?;
        self.state.send_modify(|session| session.user = Some(updated.clone()));
        Ok(updated)
    }

    /// The cached user record, if any. Only a cache: it says nothing about
    /// whether the session is still valid.
    pub fn cached_user(&self) -> ApiResult<Option<User>> {
        let Some(raw) = self.store.get(USER_STORAGE_KEY)? else {
            return Ok(None);
        };
        Ok(Some(serde_json::from_str(&raw)?))
    }

    fn persist(&self, user: &User) -> ApiResult<()> {
        let raw = serde_json::to_string(user)?;
        self.store.set(USER_STORAGE_KEY, &raw)?;
        Ok(())
    }

    fn discard_cache(&self) {
        if let Err(err) = self.store.remove(USER_STORAGE_KEY) {
            tracing::warn!("failed to clear cached user: {}", err);
        }
    }

    fn clear(&self) {
        self.discard_cache();
        self.state.send_replace(Session::signed_out());
    }
}

#[cfg(test)]
mod tests {
    use ballotbox_adapters::{AdapterError, ApiResponse, MemoryStore, Method, MockTransport};
    use serde_json::json;

    use super::*;
    use crate::services::api_client::{ApiClient, REFRESH_PATH};

    struct Fixture {
        session: SessionManager,
        store: Arc<MemoryStore>,
        transport: Arc<MockTransport>,
    }

    fn fixture(transport: MockTransport) -> Fixture {
        let transport = Arc::new(transport);
        let store = Arc::new(MemoryStore::new());
        let auth = AuthService::new(ApiClient::new(transport.clone()));
        Fixture {
            session: SessionManager::new(auth, store.clone()),
            store,
            transport,
        }
    }

    fn stored_user(store: &MemoryStore) -> Option<Value> {
        store
            .get(USER_STORAGE_KEY)
            .unwrap()
            .map(|raw| serde_json::from_str(&raw).unwrap())
    }

    fn user(value: Value) -> User {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_starts_loading_and_signed_out() {
        let f = fixture(MockTransport::new(|_| Ok(ApiResponse::empty(500))));
        assert!(f.session.is_loading());
        assert!(!f.session.is_authenticated());
        assert_eq!(f.session.user(), None);
    }

    #[test]
    fn test_login_persists_exact_user() {
        let f = fixture(MockTransport::new(|_| Ok(ApiResponse::empty(500))));
        let record = json!({ "id": 1, "email": "e", "name": "Ada" });

        f.session.login(user(record.clone())).unwrap();

        assert_eq!(stored_user(&f.store), Some(record));
        assert!(f.session.is_authenticated());
        assert_eq!(f.session.cached_user().unwrap(), f.session.user());
        assert!(f.transport.calls().is_empty());
    }

    #[test]
    fn test_login_keeps_null_fields_in_storage() {
        let f = fixture(MockTransport::new(|_| Ok(ApiResponse::empty(500))));
        let record = json!({ "id": 1, "email": null });

        f.session.login(user(record.clone())).unwrap();

        assert_eq!(stored_user(&f.store), Some(record));
    }

    #[tokio::test]
    async fn test_logout_clears_even_when_api_fails() {
        let f = fixture(MockTransport::new(|_| {
            Err(AdapterError::Transport("offline".to_string()))
        }));
        f.session.login(User::new(1, "e")).unwrap();

        f.session.logout().await;

        assert_eq!(stored_user(&f.store), None);
        assert!(!f.session.is_authenticated());
        assert_eq!(f.session.user(), None);
        assert_eq!(f.transport.calls_to(Method::Post, "/auth/logout"), 1);
    }

    #[test]
    fn test_update_user_merges_in_memory_and_storage() {
        let f = fixture(MockTransport::new(|_| Ok(ApiResponse::empty(500))));
        f.session
            .login(user(json!({ "id": 1, "email": "e", "name": "Old" })))
            .unwrap();

        let partial = json!({ "name": "New" });
        f.session.update_user(partial.as_object().unwrap()).unwrap();

        let expected = json!({ "id": 1, "email": "e", "name": "New" });
        assert_eq!(stored_user(&f.store), Some(expected.clone()));
        assert_eq!(
            serde_json::to_value(f.session.user().unwrap()).unwrap(),
            expected
        );
        assert!(f.session.is_authenticated());
    }

    #[test]
    fn test_update_user_requires_signed_in_user() {
        let f = fixture(MockTransport::new(|_| Ok(ApiResponse::empty(500))));
        let err = f
            .session
            .update_user(json!({ "name": "x" }).as_object().unwrap())
            .unwrap_err();
        assert!(matches!(err, ApiError::Validation { .. }));
        assert_eq!(stored_user(&f.store), None);
    }

    #[tokio::test]
    async fn test_initialize_restores_session_from_api() {
        let f = fixture(MockTransport::new(|request| match request.path.as_str() {
            REFRESH_PATH => Ok(ApiResponse::empty(200)),
            "/auth/me" => Ok(ApiResponse::json(200, &json!({ "id": 9, "email": "me@x" }))),
            _ => Ok(ApiResponse::empty(404)),
        }));

        let session = f.session.initialize().await;

        assert!(session.authenticated);
        assert!(!session.loading);
        assert_eq!(session.user.as_ref().map(|u| u.id), Some(9));
        assert_eq!(stored_user(&f.store), Some(json!({ "id": 9, "email": "me@x" })));
    }

    #[tokio::test]
    async fn test_initialize_ignores_stale_cache_when_refresh_fails() {
        let f = fixture(MockTransport::new(|_| Ok(ApiResponse::empty(401))));
        f.store
            .set(USER_STORAGE_KEY, r#"{"id":1,"email":"stale"}"#)
            .unwrap();

        let session = f.session.initialize().await;

        assert!(!session.authenticated);
        assert!(!session.loading);
        assert_eq!(session.user, None);
        assert_eq!(stored_user(&f.store), None);
        assert_eq!(f.transport.calls_to(Method::Get, "/auth/me"), 0);
    }

    #[tokio::test]
    async fn test_initialize_clears_when_user_lookup_fails() {
        let f = fixture(MockTransport::new(|request| match request.path.as_str() {
            REFRESH_PATH => Ok(ApiResponse::empty(200)),
            _ => Ok(ApiResponse::empty(500)),
        }));
        f.store.set(USER_STORAGE_KEY, r#"{"id":1}"#).unwrap();

        let session = f.session.initialize().await;

        assert!(!session.authenticated);
        assert_eq!(stored_user(&f.store), None);
    }

    #[tokio::test]
    async fn test_subscribers_observe_transitions() {
        let f = fixture(MockTransport::new(|_| Ok(ApiResponse::empty(200))));
        let mut rx = f.session.subscribe();

        f.session.login(User::new(2, "e")).unwrap();
        assert!(rx.has_changed().unwrap());
        assert!(rx.borrow_and_update().authenticated);

        f.session.logout().await;
        assert!(rx.has_changed().unwrap());
        assert!(!rx.borrow_and_update().authenticated);
    }
}
