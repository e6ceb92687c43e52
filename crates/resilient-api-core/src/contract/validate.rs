//! Field-level validation of user payloads

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;
use thiserror::Error;

/// An `@` followed by a domain part containing a dot, after the last `@`
static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"@[^@]*\.[^@]*$").expect("email regex is valid"));

/// A contract violation in a user payload
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ContractError {
    #[error("Users payload must be a list")]
    NotAList,

    #[error("Each user must be an object")]
    NotAnObject,

    #[error("User id must be a non-empty string")]
    InvalidId,

    #[error("User [{user_id}]: name must be a non-empty string if provided")]
    InvalidName { user_id: String },

    #[error("User [{user_id}]: email is missing or not a string")]
    MissingEmail { user_id: String },

    #[error("User [{user_id}]: invalid email format '{email}'")]
    InvalidEmail { user_id: String, email: String },
}

/// The id used in error messages
fn display_id(user: &Value) -> String {
    match user.get("id") {
        None => "Unknown ID".to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

fn non_blank(value: &str) -> bool {
    !value.trim().is_empty()
}

pub fn validate_user_id(user: &Value) -> Result<(), ContractError> {
    tracing::trace!(id = ?user.get("id"), "validating user id");
    match user.get("id").and_then(Value::as_str) {
        Some(id) if non_blank(id) => Ok(()),
        _ => Err(ContractError::InvalidId),
    }
}

/// The name is optional, but must be a non-blank string when present
pub fn validate_user_name(user: &Value) -> Result<(), ContractError> {
    tracing::trace!(name = ?user.get("name"), "validating user name");
    match user.get("name") {
        None | Some(Value::Null) => Ok(()),
        Some(Value::String(name)) if non_blank(name) => Ok(()),
        Some(_) => Err(ContractError::InvalidName {
            user_id: display_id(user),
        }),
    }
}

pub fn validate_user_email(user: &Value) -> Result<(), ContractError> {
    tracing::trace!(email = ?user.get("email"), "validating user email");
    let email = match user.get("email").and_then(Value::as_str) {
        Some(email) if non_blank(email) => email,
        _ => {
            return Err(ContractError::MissingEmail {
                user_id: display_id(user),
            })
        }
    };

    if !EMAIL_RE.is_match(email) {
        return Err(ContractError::InvalidEmail {
            user_id: display_id(user),
            email: email.to_string(),
        });
    }

    Ok(())
}

/// Validate one user object: id, then email, then name
pub fn validate_user(user: &Value) -> Result<(), ContractError> {
    if !user.is_object() {
        return Err(ContractError::NotAnObject);
    }
    validate_user_id(user)?;
    validate_user_email(user)?;
    validate_user_name(user)
}

/// Validate a users payload, stopping at the first violation
pub fn validate_users(users: &Value) -> Result<(), ContractError> {
    let users = users.as_array().ok_or(ContractError::NotAList)?;
    for user in users {
        tracing::debug!(user = %user, "validating user");
        validate_user(user)?;
    }
    Ok(())
}
