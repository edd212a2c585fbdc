//! Election records, drafts, and the client-side rules around them.
//!
//! `Election` mirrors what the API returns. `ElectionDraft` and
//! `ElectionUpdate` are what the client sends when creating an election or
//! editing one before voting opens; both validate themselves before any
//! request goes out. `BallotSelection` tracks the candidates picked on a
//! ballot under the election's `max_votes` limit.

use ballotbox_adapters::{FilePart, MultipartForm};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::auth::models::{User, UserId};
use crate::errors::{ApiError, ApiResult};
use crate::utils::{null_as_default, serde_datetime};

pub type ElectionId = i64;
pub type CandidateId = i64;

pub const PDF_CONTENT_TYPE: &str = "application/pdf";
pub const MAX_DOCUMENT_BYTES: usize = 10 * 1024 * 1024;
pub const DOCUMENT_FIELD: &str = "pdfFile";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub id: CandidateId,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElectionSettings {
    #[serde(default = "default_max_votes")]
    pub max_votes: u32,
    #[serde(default)]
    pub allow_revoting: bool,
    #[serde(default = "default_true")]
    pub require_auth: bool,
}

fn default_max_votes() -> u32 {
    1
}

fn default_true() -> bool {
    true
}

impl Default for ElectionSettings {
    fn default() -> Self {
        Self {
            max_votes: default_max_votes(),
            allow_revoting: false,
            require_auth: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Election {
    pub id: ElectionId,
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, with = "serde_datetime")]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default, with = "serde_datetime")]
    pub end_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub is_public: bool,
    #[serde(default)]
    pub owner_id: Option<UserId>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub candidates: Vec<Candidate>,
    #[serde(default)]
    pub settings: Option<ElectionSettings>,
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

impl Election {
    /// Voting is open from the start date on; no start date means open.
    pub fn has_started(&self, now: DateTime<Utc>) -> bool {
        self.start_date.map_or(true, |start| now >= start)
    }

    pub fn has_ended(&self, now: DateTime<Utc>) -> bool {
        self.end_date.map_or(false, |end| now >= end)
    }

    pub fn is_owned_by(&self, user: &User) -> bool {
        self.owner_id == Some(user.id)
    }

    /// Only the owner may edit, and only before voting starts.
    pub fn can_edit_settings(&self, user: &User, now: DateTime<Utc>) -> bool {
        self.is_owned_by(user) && !self.has_started(now)
    }

    /// Results are shown to voters who already voted and to everyone once
    /// the election is over.
    pub fn results_visible(&self, has_voted: bool, now: DateTime<Utc>) -> bool {
        has_voted || self.has_ended(now)
    }

    pub fn max_votes(&self) -> u32 {
        self.settings.map_or(1, |settings| settings.max_votes.max(1))
    }

    pub fn candidate(&self, id: CandidateId) -> Option<&Candidate> {
        self.candidates.iter().find(|candidate| candidate.id == id)
    }
}

/// `GET /elections/{id}` and `POST /elections` answer either with the
/// election or with `{ "election": ... }`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum ElectionEnvelope {
    Wrapped { election: Election },
    Bare(Election),
}

impl ElectionEnvelope {
    pub(crate) fn into_election(self) -> Election {
        match self {
            ElectionEnvelope::Wrapped { election } | ElectionEnvelope::Bare(election) => election,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum ElectionListEnvelope {
    Bare(Vec<Election>),
    Wrapped {
        #[serde(default, deserialize_with = "null_as_default")]
        elections: Vec<Election>,
    },
    Empty(()),
}

impl ElectionListEnvelope {
    pub(crate) fn into_elections(self) -> Vec<Election> {
        match self {
            ElectionListEnvelope::Bare(elections) | ElectionListEnvelope::Wrapped { elections } => {
                elections
            }
            ElectionListEnvelope::Empty(()) => Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateDraft {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

impl CandidateDraft {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    fn is_named(&self) -> bool {
        !self.name.trim().is_empty()
    }
}

/// Trims names and descriptions and drops candidates without a name.
fn normalize_candidates(candidates: &[CandidateDraft]) -> Vec<CandidateDraft> {
    candidates
        .iter()
        .filter(|candidate| candidate.is_named())
        .map(|candidate| CandidateDraft {
            name: candidate.name.trim().to_string(),
            description: candidate
                .description
                .as_deref()
                .map(str::trim)
                .filter(|description| !description.is_empty())
                .map(str::to_string),
        })
        .collect()
}

fn normalize_text(text: &Option<String>) -> Option<String> {
    text.as_deref()
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(str::to_string)
}

fn require_named_candidates(candidates: &[CandidateDraft]) -> ApiResult<()> {
    if candidates.iter().filter(|c| c.is_named()).count() < 2 {
        return Err(ApiError::validation("At least 2 candidates must have names"));
    }
    Ok(())
}

/// A new election as submitted by its owner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElectionDraft {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, with = "serde_datetime")]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default, with = "serde_datetime")]
    pub end_date: Option<DateTime<Utc>>,
    #[serde(default = "default_true")]
    pub is_public: bool,
    pub candidates: Vec<CandidateDraft>,
    #[serde(default)]
    pub settings: ElectionSettings,
}

impl ElectionDraft {
    pub fn new(title: impl Into<String>, candidates: Vec<CandidateDraft>) -> Self {
        Self {
            title: title.into(),
            description: None,
            start_date: None,
            end_date: None,
            is_public: true,
            candidates,
            settings: ElectionSettings::default(),
        }
    }

    pub fn validate(&self) -> ApiResult<()> {
        if self.title.trim().is_empty() {
            return Err(ApiError::validation("Title is required"));
        }
        if self.candidates.len() < 2 {
            return Err(ApiError::validation("At least 2 candidates are required"));
        }
        require_named_candidates(&self.candidates)?;
        if let (Some(start), Some(end)) = (self.start_date, self.end_date) {
            if start >= end {
                return Err(ApiError::validation("End date must be after start date"));
            }
        }
        if self.settings.max_votes < 1 {
            return Err(ApiError::validation("Max votes must be at least 1"));
        }
        Ok(())
    }

    /// The draft as it is sent: blank candidates dropped, text trimmed.
    pub fn normalized(&self) -> Self {
        Self {
            title: self.title.trim().to_string(),
            description: normalize_text(&self.description),
            candidates: normalize_candidates(&self.candidates),
            ..self.clone()
        }
    }

    /// Multipart rendition used when a document is attached.
    ///
    /// Scalars become text fields, `candidates` and `settings` become JSON
    /// strings, and absent optional fields are left out.
    pub fn to_multipart(&self, document: Document) -> ApiResult<MultipartForm> {
        let Value::Object(fields) = serde_json::to_value(self)? else {
            return Err(ApiError::validation("Election draft must serialize to an object"));
        };

        let mut form = MultipartForm::new();
        for (key, value) in fields {
            let text = match value {
                Value::Null => continue,
                Value::String(text) => text,
                other => other.to_string(),
            };
            form = form.text(key, text);
        }
        Ok(form.file(document.into_part()))
    }
}

/// Settings edit an owner may make before voting starts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElectionUpdate {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, with = "serde_datetime")]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default, with = "serde_datetime")]
    pub end_date: Option<DateTime<Utc>>,
    pub candidates: Vec<CandidateDraft>,
}

impl ElectionUpdate {
    /// Starts an edit from the election's current values.
    pub fn from_election(election: &Election) -> Self {
        Self {
            title: election.title.clone(),
            description: election.description.clone(),
            start_date: election.start_date,
            end_date: election.end_date,
            candidates: election
                .candidates
                .iter()
                .map(|candidate| CandidateDraft {
                    name: candidate.name.clone(),
                    description: candidate.description.clone(),
                })
                .collect(),
        }
    }

    pub fn validate(&self) -> ApiResult<()> {
        if self.title.trim().is_empty() {
            return Err(ApiError::validation("Title is required"));
        }
        require_named_candidates(&self.candidates)
            .map_err(|_| ApiError::validation("At least 2 candidates are required"))
    }

    pub fn normalized(&self) -> Self {
        Self {
            title: self.title.trim().to_string(),
            description: normalize_text(&self.description),
            candidates: normalize_candidates(&self.candidates),
            ..self.clone()
        }
    }
}

/// A document attached to a new election.
#[derive(Clone, PartialEq)]
pub struct Document {
    file_name: String,
    content_type: String,
    bytes: Vec<u8>,
}

impl std::fmt::Debug for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Document")
            .field("file_name", &self.file_name)
            .field("content_type", &self.content_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

impl Document {
    pub fn new(
        file_name: impl Into<String>,
        content_type: impl Into<String>,
        bytes: Vec<u8>,
    ) -> ApiResult<Self> {
        let content_type = content_type.into();
        if content_type != PDF_CONTENT_TYPE {
            return Err(ApiError::validation("Please upload a PDF file"));
        }
        if bytes.len() > MAX_DOCUMENT_BYTES {
            return Err(ApiError::validation("File size should be less than 10MB"));
        }
        Ok(Self {
            file_name: file_name.into(),
            content_type,
            bytes,
        })
    }

    pub fn pdf(file_name: impl Into<String>, bytes: Vec<u8>) -> ApiResult<Self> {
        Self::new(file_name, PDF_CONTENT_TYPE, bytes)
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    fn into_part(self) -> FilePart {
        FilePart {
            field: DOCUMENT_FIELD.to_string(),
            file_name: self.file_name,
            content_type: self.content_type,
            bytes: self.bytes,
        }
    }
}

/// Candidates picked on a ballot, bounded by the election's `max_votes`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BallotSelection {
    max_votes: usize,
    selected: Vec<CandidateId>,
}

impl BallotSelection {
    pub fn new(max_votes: u32) -> Self {
        Self {
            max_votes: max_votes.max(1) as usize,
            selected: Vec::new(),
        }
    }

    pub fn for_election(election: &Election) -> Self {
        Self::new(election.max_votes())
    }

    /// Deselects a selected candidate; otherwise selects it if there is room.
    /// With a single-choice ballot a new pick replaces the old one.
    pub fn toggle(&mut self, candidate: CandidateId) {
        if let Some(position) = self.selected.iter().position(|id| *id == candidate) {
            self.selected.remove(position);
        } else if self.selected.len() < self.max_votes {
            self.selected.push(candidate);
        } else if self.max_votes == 1 {
            self.selected = vec![candidate];
        }
    }

    pub fn selected(&self) -> &[CandidateId] {
        &self.selected
    }

    pub fn is_selected(&self, candidate: CandidateId) -> bool {
        self.selected.contains(&candidate)
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    pub fn clear(&mut self) {
        self.selected.clear();
    }
}
