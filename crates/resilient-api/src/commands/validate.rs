//! Validate command

use anyhow::{bail, Context, Result};
use resilient_api_core::contract::{normalize_user, validate_user, ContractError};
use serde_json::Value;

use crate::cli::ValidateArgs;
use crate::output;

pub fn run(args: ValidateArgs) -> Result<()> {
    let content = std::fs::read_to_string(&args.file)
        .with_context(|| format!("Failed to read {}", args.file))?;
    let payload: Value = serde_json::from_str(&content)
        .with_context(|| format!("{} is not valid JSON", args.file))?;

    let failures = check_users(&payload)?;
    let total = payload.as_array().map_or(0, Vec::len);

    if failures.is_empty() {
        output::success(&format!("{} users satisfy the contract", total));
        return Ok(());
    }

    for (index, err) in &failures {
        output::error(&format!("#{index}: {err}"));
    }
    bail!("{} of {} users violate the contract", failures.len(), total)
}

/// Normalize every user and collect each contract violation with its index
fn check_users(payload: &Value) -> Result<Vec<(usize, ContractError)>> {
    let Some(raw) = payload.as_array() else {
        return Err(ContractError::NotAList.into());
    };

    Ok(raw
        .iter()
        .enumerate()
        .filter_map(|(index, value)| {
            let checked = if value.is_object() {
                validate_user(&normalize_user(value).to_value())
            } else {
                Err(ContractError::NotAnObject)
            };
            checked.err().map(|e| (index, e))
        })
        .collect())
}
