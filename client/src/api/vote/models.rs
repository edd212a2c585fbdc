//! Vote records and the participation payload.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::api::election::models::{CandidateId, ElectionId};
use crate::auth::models::UserId;

pub type VoteId = i64;

/// A recorded ballot entry: one candidate chosen in one election.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vote {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<VoteId>,
    pub election_id: ElectionId,
    pub candidate_id: CandidateId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<UserId>,
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

impl Vote {
    pub fn new(election_id: ElectionId, candidate_id: CandidateId) -> Self {
        Self {
            id: None,
            election_id,
            candidate_id,
            user_id: None,
            attributes: Map::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Participation<'a> {
    pub option_id: &'a Value,
}
