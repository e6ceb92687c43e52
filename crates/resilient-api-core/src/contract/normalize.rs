//! Normalization of raw user payloads

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A user in its stable internal representation
///
/// Every field is optional; absent or null input fields map to `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedUser {
    pub id: Option<String>,
    pub email: Option<String>,
    pub name: Option<String>,
}

impl NormalizedUser {
    /// True when no field carried any data
    pub fn is_empty(&self) -> bool {
        self.id.is_none() && self.email.is_none() && self.name.is_none()
    }

    /// The JSON object form, as consumed by the validators
    pub fn to_value(&self) -> Value {
        serde_json::json!({
            "id": self.id,
            "email": self.email,
            "name": self.name,
        })
    }
}

/// Render a JSON scalar as text, treating null as absent
fn text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// Normalize one raw user object
///
/// - `id` is always rendered as a string
/// - `email` is lowercased; a non-string email is dropped
/// - `name` falls back to `first_name` and `last_name` when missing
/// - extra fields are ignored
pub fn normalize_user(raw: &Value) -> NormalizedUser {
    let id = text(raw.get("id"));
    let email = raw
        .get("email")
        .and_then(Value::as_str)
        .map(str::to_lowercase);

    let name = text(raw.get("name")).or_else(|| {
        let first = text(raw.get("first_name")).filter(|s| !s.is_empty());
        let last = text(raw.get("last_name")).filter(|s| !s.is_empty());
        match (first, last) {
            (Some(first), Some(last)) => Some(format!("{} {}", first, last)),
            (first, last) => first.or(last),
        }
    });

    NormalizedUser { id, email, name }
}

/// Normalize a list of raw users
///
/// Items that are not objects are skipped, as are users with no usable
/// fields. Order is preserved.
pub fn normalize_users(raw: &[Value]) -> Vec<NormalizedUser> {
    raw.iter()
        .filter(|value| value.is_object())
        .map(normalize_user)
        .filter(|user| !user.is_empty())
        .collect()
}
