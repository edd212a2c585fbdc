//! Profile records and votes joined with their election details.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::api::election::models::{Candidate, Election};
use crate::api::vote::models::Vote;
use crate::auth::models::UserId;

/// Optional personal details attached to an account.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<UserId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub birth_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

/// A vote joined with the election it was cast in and the chosen candidate.
///
/// Both are `None` when the election could not be loaded; `candidate` is also
/// `None` when the election no longer lists it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VoteDetails {
    #[serde(flatten)]
    pub vote: Vote,
    pub election: Option<Election>,
    pub candidate: Option<Candidate>,
}

impl VoteDetails {
    pub(crate) fn join(vote: Vote, election: Option<Election>) -> Self {
        let candidate = election
            .as_ref()
            .and_then(|election| election.candidate(vote.candidate_id))
            .cloned();
        Self {
            vote,
            election,
            candidate,
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_profile_omits_unset_fields() {
        let profile = UserProfile {
            avatar_url: Some("https://cdn/a.png".to_string()),
            ..UserProfile::default()
        };
        assert_eq!(
            serde_json::to_value(&profile).unwrap(),
            json!({ "avatar_url": "https://cdn/a.png" })
        );
    }

    #[test]
    fn test_join_finds_candidate() {
        let election: Election = serde_json::from_value(json!({
            "id": 1,
            "candidates": [{ "id": 10, "name": "Ada" }, { "id": 11, "name": "Grace" }],
        }))
        .unwrap();

        let details = VoteDetails::join(Vote::new(1, 11), Some(election));
        assert_eq!(details.candidate.map(|c| c.name), Some("Grace".to_string()));

        let details = VoteDetails::join(Vote::new(1, 12), None);
        assert!(details.election.is_none());
        assert!(details.candidate.is_none());
    }
}
