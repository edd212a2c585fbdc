//! Request builders for the authentication endpoints.
//!
//! The service holds nothing but a handle to the shared `ApiClient`; session
//! state lives in `auth::session`.

use ballotbox_adapters::ApiRequest;

use crate::auth::models::{AuthResponse, Credentials, Registration, User, UserEnvelope};
use crate::errors::ApiResult;
use crate::services::api_client::{ApiClient, REFRESH_PATH};

#[derive(Clone)]
pub struct AuthService {
    client: ApiClient,
}

impl AuthService {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub async fn login(&self, email: &str, password: &str) -> ApiResult<AuthResponse> {
        let credentials = Credentials {
            email: email.to_string(),
            password: password.to_string(),
        };
        self.client.post("/auth/login", &credentials).await
    }

    pub async fn register(&self, registration: &Registration) -> ApiResult<AuthResponse> {
        self.client.post("/auth/register", registration).await
    }

    pub async fn logout(&self) -> ApiResult<()> {
        self.client.send(ApiRequest::post("/auth/logout")).await?;
        Ok(())
    }

    pub async fn current_user(&self) -> ApiResult<User> {
        let envelope: UserEnvelope = self.client.get("/auth/me").await?;
        Ok(envelope.into_user())
    }

    /// Asks the API to renew the session cookie.
    pub async fn refresh(&self) -> ApiResult<()> {
        self.client.send(ApiRequest::post(REFRESH_PATH)).await?;
        Ok(())
    }
}
