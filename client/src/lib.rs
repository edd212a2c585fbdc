//! Client for the ballotbox voting platform.
//!
//! Every request goes through one `ApiClient`, which recovers expired
//! sessions with a single shared refresh. The domain services on top of it are
//! cheap handles; `SessionManager` owns the signed-in user.

pub mod api;
pub mod auth;
pub mod config;
pub mod errors;
pub mod services;
pub mod utils;

use std::sync::Arc;

use ballotbox_adapters::{FileStore, HttpTransport, KeyValueStore, ReqwestTransport};

pub use api::election::{
    BallotSelection, Candidate, CandidateDraft, Document, Election, ElectionDraft,
    ElectionService, ElectionSettings, ElectionUpdate,
};
pub use api::user::{UserProfile, UserProfileService, VoteDetails};
pub use api::vote::{Vote, VoteService};
pub use auth::{AuthService, Registration, Session, SessionManager, User};
pub use config::Config;
pub use errors::{ApiError, ApiResult};
pub use services::{ApiClient, ElectionResults};

/// The services and session of one signed-in (or signed-out) client.
pub struct Ballotbox {
    pub client: ApiClient,
    pub auth: AuthService,
    pub elections: ElectionService,
    pub votes: VoteService,
    pub profiles: UserProfileService,
    pub session: SessionManager,
}

impl Ballotbox {
    pub fn new(transport: Arc<dyn HttpTransport>, store: Arc<dyn KeyValueStore>) -> Self {
        let client = ApiClient::new(transport);
        let auth = AuthService::new(client.clone());
        Self {
            elections: ElectionService::new(client.clone()),
            votes: VoteService::new(client.clone()),
            profiles: UserProfileService::new(client.clone()),
            session: SessionManager::new(auth.clone(), store),
            auth,
            client,
        }
    }

    /// Talks to `config.api_url` over HTTP and caches under `config.data_dir`.
    pub fn connect(config: &Config) -> ApiResult<Self> {
        let transport = ReqwestTransport::new(config.api_url.clone())?;
        tracing::info!("using API at {}", transport.base_url());
        Ok(Self::new(
            Arc::new(transport),
            Arc::new(FileStore::new(config.data_dir.clone())),
        ))
    }

    /// Logs in through the API and records the user in the session.
    pub async fn sign_in(&self, email: &str, password: &str) -> ApiResult<User> {
        let response = self.auth.login(email, password).await?;
        let user = match response.user {
            Some(user) => user,
            None => self.auth.current_user().await?,
        };
        self.session.login(user.clone())?;
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use ballotbox_adapters::{ApiResponse, MemoryStore, Method, MockTransport};
    use serde_json::json;

    use super::*;

    #[tokio::test]
    async fn test_sign_in_populates_session() {
        let transport = Arc::new(MockTransport::new(|request| match request.path.as_str() {
            "/auth/login" => Ok(ApiResponse::json(200, &json!({ "message": "ok" }))),
            "/auth/me" => Ok(ApiResponse::json(200, &json!({ "user": { "id": 6, "email": "a@b" } }))),
            _ => Ok(ApiResponse::empty(404)),
        }));
        let app = Ballotbox::new(transport.clone(), Arc::new(MemoryStore::new()));

        let user = app.sign_in("a@b", "pw").await.unwrap();

        assert_eq!(user.id, 6);
        assert!(app.session.is_authenticated());
        assert_eq!(transport.calls_to(Method::Get, "/auth/me"), 1);
    }

    #[tokio::test]
    async fn test_bad_credentials_leave_session_signed_out() {
        let transport = Arc::new(MockTransport::new(|_| {
            Ok(ApiResponse::json(401, &json!({ "error": "Invalid credentials" })))
        }));
        let app = Ballotbox::new(transport.clone(), Arc::new(MemoryStore::new()));

        let err = app.sign_in("a@b", "wrong").await.unwrap_err();

        assert_eq!(err, ApiError::authentication("Invalid credentials"));
        assert!(!app.session.is_authenticated());
        assert_eq!(transport.calls().len(), 1);
    }

    #[test]
    fn test_connect_rejects_empty_url() {
        let config = Config {
            api_url: String::new(),
            data_dir: "data".into(),
        };
        assert!(Ballotbox::connect(&config).is_err());
    }
}
