//! Data structures for authentication-related entities.
//!
//! This module defines the user record the session revolves around, the
//! credentials and registration payloads, and the response shapes returned by
//! the authentication endpoints.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub type UserId = i64;

/// The signed-in user.
///
/// Only `id` is guaranteed by the API; everything else, `email` included, is
/// kept as an open attribute map so that partial updates merge field by field
/// and the record serializes back exactly as it was received.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

impl User {
    pub fn new(id: UserId, email: impl Into<String>) -> Self {
        Self {
            id,
            attributes: Map::new(),
        }
        .with_attribute("email", email.into())
    }

    pub fn email(&self) -> Option<&str> {
        self.attribute("email").and_then(Value::as_str)
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    pub fn attribute(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key)
    }

    /// Shallow merge: every field of `partial` overwrites the same field of
    /// this record.
    ///
    /// # Errors
    ///
    /// Fails when the merged record no longer has a valid `id`.
    pub fn merged(&self, partial: &Map<String, Value>) -> Result<User, serde_json::Error> {
        let mut record = match serde_json::to_value(self)? {
            Value::Object(record) => record,
            _ => Map::new(),
        };
        for (key, value) in partial {
            record.insert(key.clone(), value.clone());
        }
        serde_json::from_value(Value::Object(record))
    }

    /// Best human-readable label for the user.
    pub fn display_name(&self) -> String {
        let text = |key: &str| {
            self.attribute(key)
                .and_then(Value::as_str)
                .map(str::trim)
                .filter(|s| !s.is_empty())
        };

        let full = [text("first_name").or(text("firstName")), text("last_name").or(text("lastName"))]
            .into_iter()
            .flatten()
            .collect::<Vec<_>>()
            .join(" ");
        if !full.is_empty() {
            return full;
        }
        text("name")
            .map(str::to_string)
            .or_else(|| self.email().map(str::to_string))
            .unwrap_or_else(|| format!("user #{}", self.id))
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

/// Sign-up payload, in the field naming the registration endpoint expects.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Registration {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
}

/// Body of a login or registration response.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<User>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// `/auth/me` answers either with the user or with `{ "user": ... }`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum UserEnvelope {
    Wrapped { user: User },
    Bare(User),
}

impl UserEnvelope {
    pub(crate) fn into_user(self) -> User {
        match self {
            UserEnvelope::Wrapped { user } | UserEnvelope::Bare(user) => user,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_merge_overwrites_only_given_fields() {
        let user: User = serde_json::from_value(json!({ "id": 1, "email": "e", "name": "Old" })).unwrap();
        let partial = json!({ "name": "New" });

        let merged = user.merged(partial.as_object().unwrap()).unwrap();

        assert_eq!(
            serde_json::to_value(&merged).unwrap(),
            json!({ "id": 1, "email": "e", "name": "New" })
        );
    }

    #[test]
    fn test_merge_adds_new_fields_and_rejects_bad_id() {
        let user = User::new(1, "e");
        let merged = user
            .merged(json!({ "avatar_url": "a.png" }).as_object().unwrap())
            .unwrap();
        assert_eq!(merged.attribute("avatar_url"), Some(&json!("a.png")));

        assert!(user.merged(json!({ "id": "one" }).as_object().unwrap()).is_err());
    }

    #[test]
    fn test_user_envelope_shapes() {
        let bare: UserEnvelope = serde_json::from_value(json!({ "id": 4, "email": "x" })).unwrap();
        assert_eq!(bare.into_user().id, 4);

        let wrapped: UserEnvelope =
            serde_json::from_value(json!({ "user": { "id": 5, "email": "y" } })).unwrap();
        assert_eq!(wrapped.into_user().id, 5);
    }

    #[test]
    fn test_user_without_id_is_rejected() {
        let result: Result<User, _> = serde_json::from_value(json!({ "_id": "abc", "email": "x" }));
        assert!(result.is_err());
    }

    #[test]
    fn test_user_serializes_back_unchanged() {
        for record in [
            json!({ "id": 1, "email": null }),
            json!({ "id": 2 }),
            json!({ "id": 3, "email": "c@d", "avatar_url": null }),
        ] {
            let user: User = serde_json::from_value(record.clone()).unwrap();
            assert_eq!(serde_json::to_value(&user).unwrap(), record);
        }
        assert_eq!(User::new(4, "e@f").email(), Some("e@f"));
    }

    #[test]
    fn test_display_name() {
        let user = User::new(1, "ada@example.com")
            .with_attribute("first_name", "Ada")
            .with_attribute("last_name", "Lovelace");
        assert_eq!(user.display_name(), "Ada Lovelace");
        assert_eq!(User::new(2, "bob@example.com").display_name(), "bob@example.com");
    }

    #[test]
    fn test_registration_wire_names() {
        let registration = Registration {
            email: "a@b.c".to_string(),
            password: "secret1".to_string(),
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
        };
        let value = serde_json::to_value(&registration).unwrap();
        assert_eq!(value["firstName"], "Ada");
        assert_eq!(value["lastName"], "Lovelace");
    }
}
