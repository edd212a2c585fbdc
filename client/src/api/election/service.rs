//! Requests against the election endpoints and the ballot endpoints under
//! `/votes/election`.

use ballotbox_adapters::ApiRequest;
use serde_json::{json, Value};

use crate::api::election::models::{
    CandidateId, Document, Election, ElectionDraft, ElectionEnvelope, ElectionId,
    ElectionListEnvelope, ElectionUpdate,
};
use crate::errors::{ApiError, ApiResult};
use crate::services::api_client::ApiClient;
use crate::services::results::ElectionResults;

/// Election endpoints: listing, management, voting and results.
#[derive(Clone)]
pub struct ElectionService {
    client: ApiClient,
}

impl ElectionService {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub async fn list(&self) -> ApiResult<Vec<Election>> {
        let envelope: ElectionListEnvelope = self.client.get("/elections").await?;
        Ok(envelope.into_elections())
    }

    pub async fn get(&self, id: ElectionId) -> ApiResult<Election> {
        let envelope: ElectionEnvelope = self.client.get(&format!("/elections/{id}")).await?;
        Ok(envelope.into_election())
    }

    /// Creates an election. With a document the draft goes out as multipart,
    /// otherwise as JSON.
    pub async fn create(
        &self,
        draft: &ElectionDraft,
        document: Option<Document>,
    ) -> ApiResult<Election> {
        draft.validate()?;
        let draft = draft.normalized();

        let request = match document {
            Some(document) => {
                tracing::debug!("attaching {} ({} bytes)", document.file_name(), document.len());
                ApiRequest::post("/elections").with_multipart(draft.to_multipart(document)?)
            }
            None => ApiRequest::post("/elections").with_json(serde_json::to_value(&draft)?),
        };

        let envelope: ElectionEnvelope = self.client.send_as(request).await?;
        let election = envelope.into_election();
        tracing::info!("created election {}", election.id);
        Ok(election)
    }

    pub async fn update(&self, id: ElectionId, update: &ElectionUpdate) -> ApiResult<Value> {
        update.validate()?;
        self.client
            .put(&format!("/elections/{id}"), &update.normalized())
            .await
    }

    pub async fn delete(&self, id: ElectionId) -> ApiResult<()> {
        self.client.delete(&format!("/elections/{id}")).await?;
        tracing::info!("deleted election {}", id);
        Ok(())
    }

    /// Casts one vote per selected candidate, in order.
    ///
    /// Stops at the first rejected vote; votes already recorded stay recorded.
    pub async fn submit_vote(
        &self,
        id: ElectionId,
        candidates: &[CandidateId],
    ) -> ApiResult<Vec<Value>> {
        if candidates.is_empty() {
            return Err(ApiError::validation("Please select at least one candidate"));
        }

        let mut receipts = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            let body = json!({ "election_id": id, "candidate_id": candidate });
            match self.client.post("/votes", &body).await {
                Ok(receipt) => receipts.push(receipt),
                Err(err) => {
                    tracing::warn!(
                        "vote for candidate {} in election {} failed after {} recorded: {}",
                        candidate,
                        id,
                        receipts.len(),
                        err
                    );
                    return Err(err);
                }
            }
        }
        Ok(receipts)
    }

    /// The caller's vote in this election; `None` when they have not voted.
    pub async fn my_vote(&self, id: ElectionId) -> ApiResult<Option<Value>> {
        match self.client.get(&format!("/votes/election/{id}/my-vote")).await {
            Ok(vote) => Ok(Some(vote)),
            Err(err) if err.is_not_found() => Ok(None),
            Err(err) => Err(err),
        }
    }

    pub async fn results(&self, id: ElectionId) -> ApiResult<ElectionResults> {
        let votes: Value = self.client.get(&format!("/votes/election/{id}")).await?;
        ElectionResults::from_votes_value(&votes)
    }
}
