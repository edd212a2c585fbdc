//! Scripted `HttpTransport` for tests.
//!
//! A `MockTransport` answers every request through a caller-supplied closure
//! and records what it was asked. Per-path delays let a test hold one request
//! (typically the session refresh) in flight while others run into the same
//! fault.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::errors::AdapterError;
use crate::models::{ApiRequest, ApiResponse, Method};
use crate::HttpTransport;

type Responder = dyn Fn(&ApiRequest) -> Result<ApiResponse, AdapterError> + Send + Sync;

pub struct MockTransport {
    responder: Box<Responder>,
    delays: Mutex<HashMap<String, Duration>>,
    calls: Mutex<Vec<ApiRequest>>,
}

impl MockTransport {
    pub fn new<F>(responder: F) -> Self
    where
        F: Fn(&ApiRequest) -> Result<ApiResponse, AdapterError> + Send + Sync + 'static,
    {
        Self {
            responder: Box::new(responder),
            delays: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Sleeps for `delay` before answering any request to `path`.
    pub fn with_delay(self, path: impl Into<String>, delay: Duration) -> Self {
        self.delays.lock().insert(path.into(), delay);
        self
    }

    pub fn calls(&self) -> Vec<ApiRequest> {
        self.calls.lock().clone()
    }

    pub fn calls_to(&self, method: Method, path: &str) -> usize {
        self.calls
            .lock()
            .iter()
            .filter(|call| call.method == method && call.path == path)
            .count()
    }
}

#[async_trait]
impl HttpTransport for MockTransport {
    async fn execute(&self, request: &ApiRequest) -> Result<ApiResponse, AdapterError> {
        self.calls.lock().push(request.clone());

        let delay = self.delays.lock().get(&request.path).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        (self.responder)(request)
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_records_calls() {
        let transport = MockTransport::new(|request| match request.path.as_str() {
            "/elections" => Ok(ApiResponse::new(200, "[]")),
            _ => Ok(ApiResponse::empty(404)),
        });

        let ok = transport.execute(&ApiRequest::get("/elections")).await.unwrap();
        let missing = transport.execute(&ApiRequest::get("/nope")).await.unwrap();

        assert_eq!(ok.status, 200);
        assert_eq!(missing.status, 404);
        assert_eq!(transport.calls().len(), 2);
        assert_eq!(transport.calls_to(Method::Get, "/elections"), 1);
        assert_eq!(transport.calls_to(Method::Post, "/elections"), 0);
    }

    #[tokio::test]
    async fn test_mock_transport_failure() {
        let transport =
            MockTransport::new(|_| Err(AdapterError::Transport("connection refused".to_string())));
        let result = transport.execute(&ApiRequest::get("/auth/me")).await;
        assert!(matches!(result, Err(AdapterError::Transport(_))));
    }
}
