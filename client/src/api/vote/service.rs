//! Requests against the generic `/votes` resource.

use serde::Serialize;
use serde_json::Value;

use crate::api::vote::models::{Participation, VoteId};
use crate::errors::ApiResult;
use crate::services::api_client::ApiClient;

/// CRUD over `/votes` plus poll-style participation.
///
/// Bodies pass through as JSON; the vote resource has no fixed shape beyond
/// what `Vote` reads.
#[derive(Clone)]
pub struct VoteService {
    client: ApiClient,
}

impl VoteService {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub async fn list(&self) -> ApiResult<Value> {
        self.client.get("/votes").await
    }

    pub async fn get(&self, id: VoteId) -> ApiResult<Value> {
        self.client.get(&format!("/votes/{id}")).await
    }

    pub async fn create<B: Serialize + ?Sized>(&self, body: &B) -> ApiResult<Value> {
        self.client.post("/votes", body).await
    }

    pub async fn update<B: Serialize + ?Sized>(&self, id: VoteId, body: &B) -> ApiResult<Value> {
        self.client.put(&format!("/votes/{id}"), body).await
    }

    pub async fn delete(&self, id: VoteId) -> ApiResult<Value> {
        self.client.delete(&format!("/votes/{id}")).await
    }

    pub async fn participate(&self, id: VoteId, option_id: &Value) -> ApiResult<Value> {
        self.client
            .post(
                &format!("/votes/{id}/participate"),
                &Participation { option_id },
            )
            .await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use ballotbox_adapters::{ApiResponse, Method, MockTransport};
    use serde_json::json;

    use super::*;
    use crate::api::vote::models::Vote;

    fn service_with(transport: MockTransport) -> (VoteService, Arc<MockTransport>) {
        let transport = Arc::new(transport);
        (VoteService::new(ApiClient::new(transport.clone())), transport)
    }

    #[tokio::test]
    async fn test_crud_paths() {
        let (votes, transport) =
            service_with(MockTransport::new(|_| Ok(ApiResponse::json(200, &json!({ "id": 4 })))));

        votes.list().await.unwrap();
        votes.get(4).await.unwrap();
        votes.create(&Vote::new(1, 2)).await.unwrap();
        votes.update(4, &json!({ "candidate_id": 3 })).await.unwrap();
        votes.delete(4).await.unwrap();

        assert_eq!(transport.calls_to(Method::Get, "/votes"), 1);
        assert_eq!(transport.calls_to(Method::Get, "/votes/4"), 1);
        assert_eq!(transport.calls_to(Method::Post, "/votes"), 1);
        assert_eq!(transport.calls_to(Method::Put, "/votes/4"), 1);
        assert_eq!(transport.calls_to(Method::Delete, "/votes/4"), 1);
    }

    #[tokio::test]
    async fn test_participate_sends_option_id() {
        let (votes, transport) = service_with(MockTransport::new(|_| Ok(ApiResponse::empty(204))));

        let response = votes.participate(9, &json!("opt-2")).await.unwrap();

        assert_eq!(response, Value::Null);
        let calls = transport.calls();
        assert_eq!(calls[0].path, "/votes/9/participate");
        assert_eq!(calls[0].json(), Some(&json!({ "optionId": "opt-2" })));
    }
}
