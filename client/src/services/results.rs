//! Tallying of raw election votes.
//!
//! The votes endpoint returns one record per ballot entry. Results are the
//! count of records per candidate id; a candidate nobody voted for has no
//! entry, so lookups go through `count_for`.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;

use crate::api::election::models::{CandidateId, Election};
use crate::errors::{ApiError, ApiResult};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ElectionResults {
    counts: BTreeMap<CandidateId, u64>,
}

impl ElectionResults {
    pub fn tally<I>(candidate_ids: I) -> Self
    where
        I: IntoIterator<Item = CandidateId>,
    {
        let mut counts = BTreeMap::new();
        for id in candidate_ids {
            *counts.entry(id).or_insert(0) += 1;
        }
        Self { counts }
    }

    /// Tallies a raw votes body. Anything but an array is an empty tally.
    ///
    /// # Errors
    ///
    /// `Decode` when an entry has no `candidate_id` that reads as an integer
    /// (numeric strings are accepted).
    pub fn from_votes_value(votes: &Value) -> ApiResult<Self> {
        let Some(entries) = votes.as_array() else {
            return Ok(Self::default());
        };
        let ids = entries
            .iter()
            .enumerate()
            .map(|(index, vote)| {
                candidate_id(vote).ok_or_else(|| ApiError::Decode {
                    message: format!("vote #{index} has no valid candidate_id: {vote}"),
                })
            })
            .collect::<ApiResult<Vec<_>>>()?;
        Ok(Self::tally(ids))
    }

    pub fn count_for(&self, candidate: CandidateId) -> u64 {
        self.counts.get(&candidate).copied().unwrap_or(0)
    }

    pub fn counts(&self) -> &BTreeMap<CandidateId, u64> {
        &self.counts
    }

    pub fn total(&self) -> u64 {
        self.counts.values().sum()
    }

    /// Share of all votes for `candidate`, in percent.
    pub fn percentage(&self, candidate: CandidateId) -> f64 {
        match self.total() {
            0 => 0.0,
            total => self.count_for(candidate) as f64 * 100.0 / total as f64,
        }
    }

    /// One row per candidate of `election`, zero counts included, in the
    /// election's candidate order.
    pub fn rows<'a>(&self, election: &'a Election) -> Vec<(&'a str, u64)> {
        election
            .candidates
            .iter()
            .map(|candidate| (candidate.name.as_str(), self.count_for(candidate.id)))
            .collect()
    }
}

fn candidate_id(vote: &Value) -> Option<CandidateId> {
    match vote.get("candidate_id")? {
        Value::Number(id) => id.as_i64(),
        Value::String(id) => id.trim().parse().ok(),
        _ => None,
    }
}
