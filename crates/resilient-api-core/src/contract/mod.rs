//! Contract checks for Users API payloads
//!
//! Raw API responses are first normalized into a stable shape, then
//! validated field by field. Validation works on `serde_json::Value` so it
//! can run against both normalized users and untrusted input.

mod normalize;
mod validate;

pub use normalize::{normalize_user, normalize_users, NormalizedUser};
pub use validate::{
    validate_user, validate_user_email, validate_user_id, validate_user_name, validate_users,
    ContractError,
};
