//! Requests against the user profile endpoints, and a user's voting
//! history assembled from votes and their elections.

use std::collections::HashMap;

use futures::future::join_all;
use serde_json::Value;

use crate::api::election::models::{Election, ElectionId};
use crate::api::election::service::ElectionService;
use crate::api::user::models::{UserProfile, VoteDetails};
use crate::api::vote::models::Vote;
use crate::auth::models::UserId;
use crate::errors::ApiResult;
use crate::services::api_client::ApiClient;

const MY_PROFILE_PATH: &str = "/user-profiles/me/profile";

#[derive(Clone)]
pub struct UserProfileService {
    client: ApiClient,
    elections: ElectionService,
}

impl UserProfileService {
    pub fn new(client: ApiClient) -> Self {
        Self {
            elections: ElectionService::new(client.clone()),
            client,
        }
    }

    /// The caller's profile; `None` until one has been created.
    pub async fn my_profile(&self) -> ApiResult<Option<UserProfile>> {
        match self.client.get(MY_PROFILE_PATH).await {
            Ok(profile) => Ok(Some(profile)),
            Err(err) if err.is_not_found() => Ok(None),
            Err(err) => Err(err),
        }
    }

    pub async fn create(&self, profile: &UserProfile) -> ApiResult<UserProfile> {
        self.client.post("/user-profiles", profile).await
    }

    pub async fn update(&self, profile: &UserProfile) -> ApiResult<UserProfile> {
        self.client.put(MY_PROFILE_PATH, profile).await
    }

    /// Votes cast by `user_id`. A body that is not a list reads as no votes;
    /// entries that are not votes are skipped.
    pub async fn user_votes(&self, user_id: UserId) -> ApiResult<Vec<Vote>> {
        let body: Value = self.client.get(&format!("/votes/user/{user_id}")).await?;
        let Value::Array(entries) = body else {
            return Ok(Vec::new());
        };

        Ok(entries
            .into_iter()
            .filter_map(|entry| match serde_json::from_value(entry) {
                Ok(vote) => Some(vote),
                Err(err) => {
                    tracing::warn!("skipping malformed vote for user {}: {}", user_id, err);
                    None
                }
            })
            .collect())
    }

    /// Every vote of `user_id` with its election and candidate.
    ///
    /// Each distinct election is fetched once, concurrently. A vote whose
    /// election fails to load is kept without details. Output follows vote
    /// order.
    pub async fn vote_history(&self, user_id: UserId) -> ApiResult<Vec<VoteDetails>> {
        let votes = self.user_votes(user_id).await?;

        let mut election_ids: Vec<ElectionId> = votes.iter().map(|vote| vote.election_id).collect();
        election_ids.sort_unstable();
        election_ids.dedup();

        let lookups = election_ids.into_iter().map(|id| async move {
            match self.elections.get(id).await {
                Ok(election) => (id, Some(election)),
                Err(err) => {
                    tracing::warn!("failed to load election {}: {}", id, err);
                    (id, None)
                }
            }
        });
        let elections: HashMap<ElectionId, Option<Election>> =
            join_all(lookups).await.into_iter().collect();

        Ok(votes
            .into_iter()
            .map(|vote| {
                let election = elections.get(&vote.election_id).cloned().flatten();
                VoteDetails::join(vote, election)
            })
            .collect())
    }
}
