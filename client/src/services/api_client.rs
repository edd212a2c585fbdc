//! HTTP client wrapper used by every domain service.
//!
//! `ApiClient` sends requests through an `HttpTransport`, decodes successful
//! bodies, and turns every other outcome into an `ApiError`. A 401 on an
//! ordinary request is recovered transparently: the client waits for a valid
//! session through the shared `RefreshCoordinator` and sends the request once
//! more. Login, registration and refresh requests are never recovered.

use std::sync::Arc;

use ballotbox_adapters::{ApiRequest, ApiResponse, HttpTransport};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::auth::middleware::RefreshCoordinator;
use crate::errors::{ApiError, ApiResult};

pub const REFRESH_PATH: &str = "/auth/refresh";

/// Paths whose 401 is a final answer rather than an expired session.
const AUTH_ENDPOINTS: [&str; 3] = ["/auth/login", "/auth/register", REFRESH_PATH];

const UNAUTHORIZED: u16 = 401;

pub fn is_auth_endpoint(path: &str) -> bool {
    AUTH_ENDPOINTS.iter().any(|endpoint| path.contains(endpoint))
}

#[derive(Clone)]
pub struct ApiClient {
    transport: Arc<dyn HttpTransport>,
    coordinator: Arc<RefreshCoordinator>,
}

impl ApiClient {
    pub fn new(transport: Arc<dyn HttpTransport>) -> Self {
        Self {
            transport,
            coordinator: Arc::new(RefreshCoordinator::new()),
        }
    }

    pub fn coordinator(&self) -> &RefreshCoordinator {
        &self.coordinator
    }

    /// Sends `request` and returns the parsed JSON body (`null` when empty).
    ///
    /// # Errors
    ///
    /// - `Authentication` for a 401 on an auth endpoint, a failed session
    ///   refresh, or a 401 on the retried request
    /// - `Http` for any other non-2xx status
    /// - `Network` when no response was received
    /// - `Decode` when a 2xx body is not JSON
    pub async fn send(&self, request: ApiRequest) -> ApiResult<Value> {
        let mut retried = false;
        loop {
            let response = self.execute(&request).await?;

            if response.is_success() {
                return decode_body(&response);
            }

            if response.status != UNAUTHORIZED {
                return Err(ApiError::from_response(&response));
            }

            if is_auth_endpoint(&request.path) || retried {
                return Err(ApiError::unauthenticated(&response));
            }

            retried = true;
            tracing::debug!("{} returned 401, waiting for a valid session", request);
            self.coordinator
                .await_valid_session(|| self.refresh_session())
                .await?;
        }
    }

    /// Like `send`, decoding the body into `T`.
    pub async fn send_as<T: DeserializeOwned>(&self, request: ApiRequest) -> ApiResult<T> {
        let body = self.send(request).await?;
        Ok(serde_json::from_value(body)?)
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> ApiResult<T> {
        self.send_as(ApiRequest::get(path)).await
    }

    pub async fn post<B, T>(&self, path: &str, body: &B) -> ApiResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let body = serde_json::to_value(body)?;
        self.send_as(ApiRequest::post(path).with_json(body)).await
    }

    pub async fn put<B, T>(&self, path: &str, body: &B) -> ApiResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let body = serde_json::to_value(body)?;
        self.send_as(ApiRequest::put(path).with_json(body)).await
    }

    pub async fn delete(&self, path: &str) -> ApiResult<Value> {
        self.send(ApiRequest::delete(path)).await
    }

    /// One refresh call, outside the recovery path.
    async fn refresh_session(&self) -> ApiResult<()> {
        let request = ApiRequest::post(REFRESH_PATH);
        let response = self.execute(&request).await?;
        match response.status {
            status if (200..300).contains(&status) => Ok(()),
            UNAUTHORIZED => Err(ApiError::unauthenticated(&response)),
            _ => Err(ApiError::from_response(&response)),
        }
    }

    async fn execute(&self, request: &ApiRequest) -> ApiResult<ApiResponse> {
        self.transport.execute(request).await.map_err(|err| {
            tracing::warn!("{} via {} failed: {}", request, self.transport.name(), err);
            ApiError::from(err)
        })
    }
}

fn decode_body(response: &ApiResponse) -> ApiResult<Value> {
    Ok(response.json_body()?)
}
