//! Burst command
//!
//! Fans out concurrent create, patch and fetch lifecycles on the async
//! client, checks the fetched users against the contract, then purges
//! everything the burst created.

use std::collections::HashSet;

use anyhow::{bail, Context, Result};
use camino::Utf8Path;
use futures::future::join_all;
use resilient_api_client::{AsyncUsersApiClient, CleanupRegistry, UserFactory};
use resilient_api_core::contract::{normalize_users, validate_user};
use serde_json::{json, Value};

use crate::cli::BurstArgs;
use crate::commands::{cancel_on_interrupt, created_id, load_config};
use crate::output;

pub async fn run(args: BurstArgs, config_file: Option<&Utf8Path>) -> Result<()> {
    let config = load_config(config_file)?;
    let client = AsyncUsersApiClient::new(&config)
        .context("Failed to build HTTP client")?
        .with_cancellation(cancel_on_interrupt());
    let factory = UserFactory::new();
    let registry = CleanupRegistry::new();

    output::header(&format!(
        "Burst: {} concurrent users against {}",
        args.size, config.api.base_url
    ));

    let results = join_all(
        (0..args.size).map(|index| lifecycle(&client, &factory, &registry, index)),
    )
    .await;

    let mut fetched = Vec::new();
    let mut failures = 0usize;
    for result in results {
        match result {
            Ok(user) => fetched.push(user),
            Err(err) => {
                failures += 1;
                output::error(&format!("{:#}", err));
            }
        }
    }

    let verdict = check_burst(&fetched);

    output::info(&format!("Purging {} users", registry.len()));
    let report = registry.purge(&client).await;
    output::cleanup(&report);

    if failures > 0 {
        bail!("{} of {} lifecycles failed", failures, args.size);
    }
    verdict?;
    if !report.is_clean() {
        bail!("Cleanup left {} users behind", report.unverified.len() + report.failed.len());
    }

    output::success(&format!("Burst of {} users completed", args.size));
    Ok(())
}

/// Create, rename and read back one user
async fn lifecycle(
    client: &AsyncUsersApiClient,
    factory: &UserFactory,
    registry: &CleanupRegistry,
    index: u32,
) -> Result<Value> {
    let created = client
        .create_user(&factory.create_user_payload())
        .await
        .with_context(|| format!("Lifecycle {}: create failed", index))?;
    let id = created_id(created)?;
    registry.register(id.clone());
    tracing::debug!(index, user_id = %id, "burst user created");

    client
        .patch_user(&id, &json!({ "name": format!("burst_{}", index) }))
        .await
        .with_context(|| format!("Lifecycle {}: patch of {} failed", index, id))?;

    client
        .get_user(&id)
        .await
        .with_context(|| format!("Lifecycle {}: fetch of {} failed", index, id))?
        .with_context(|| format!("Lifecycle {}: user {} vanished", index, id))
}

/// Fetched users must satisfy the contract and carry distinct ids
fn check_burst(fetched: &[Value]) -> Result<()> {
    let users = normalize_users(fetched);

    for user in &users {
        validate_user(&user.to_value())
            .with_context(|| format!("Contract violation in {:?}", user.id))?;
    }

    let unique: HashSet<_> = users.iter().filter_map(|u| u.id.as_deref()).collect();
    if unique.len() != fetched.len() {
        bail!(
            "Expected {} distinct user ids, found {}",
            fetched.len(),
            unique.len()
        );
    }

    output::success(&format!("{} users satisfy the contract", users.len()));
    Ok(())
}
