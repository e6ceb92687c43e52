//! Scenario command
//!
//! Runs the user lifecycle end to end: create each user and read it back,
//! rename the first, then delete everything and confirm each deletion.
//! A read-back or rename that does not match what was sent fails the run.
//! Anything left behind by an early failure is purged before returning.

use anyhow::{bail, ensure, Context, Result};
use camino::Utf8Path;
use resilient_api_client::{AsyncUsersApiClient, CleanupRegistry, UserFactory, UsersApiClient};
use resilient_api_core::{Cancellation, ExhaustionPolicy, RuntimeConfig};
use serde_json::{json, Value};

use crate::cli::ScenarioArgs;
use crate::commands::{cancel_on_interrupt, created_id, load_config};
use crate::output;

const RENAMED: &str = "renamed_user";

pub async fn run(args: ScenarioArgs, config_file: Option<&Utf8Path>) -> Result<()> {
    let mut config = load_config(config_file)?;
    if args.best_effort {
        config.polling.exhaustion = ExhaustionPolicy::BestEffort;
    }

    output::header(&format!(
        "Scenario: {} users against {}",
        args.count, config.api.base_url
    ));

    let cancel = cancel_on_interrupt();
    let unverified = if args.use_async {
        run_async(&config, args.count, cancel).await?
    } else {
        let count = args.count;
        tokio::task::spawn_blocking(move || run_blocking(&config, count, cancel))
            .await
            .context("Scenario thread panicked")??
    };

    if !unverified.is_empty() {
        bail!(
            "Deletion could not be verified for: {}",
            unverified.join(", ")
        );
    }

    output::success("Scenario completed");
    Ok(())
}

fn run_blocking(config: &RuntimeConfig, count: u32, cancel: Cancellation) -> Result<Vec<String>> {
    let client = UsersApiClient::new(config)
        .context("Failed to build HTTP client")?
        .with_cancellation(cancel);
    let registry = CleanupRegistry::new();

    let result = blocking_lifecycle(&client, &registry, count);
    if !registry.is_empty() {
        output::warning(&format!("Purging {} leftover users", registry.len()));
        output::cleanup(&registry.purge_blocking(&client));
    }
    result
}

fn blocking_lifecycle(
    client: &UsersApiClient,
    registry: &CleanupRegistry,
    count: u32,
) -> Result<Vec<String>> {
    let factory = UserFactory::new();

    let mut ids = Vec::new();
    for _ in 0..count {
        let payload = factory.create_user_payload();
        let created = client
            .create_user(&payload)
            .with_context(|| format!("Failed to create user {}", payload["name"]))?;
        let id = created_id(created)?;
        registry.register(id.clone());

        let fetched = client
            .get_user(&id)
            .with_context(|| format!("Failed to fetch user {}", id))?;
        check_fetched(&id, &payload, fetched.as_ref())?;
        output::success(&format!("Created and verified user {}", id));
        ids.push(id);
    }

    if let Some(first) = ids.first() {
        let patched = client
            .patch_user(first, &json!({ "name": RENAMED }))
            .with_context(|| format!("Failed to rename user {}", first))?;
        let patched = match patched {
            Some(user) => Some(user),
            None => client
                .get_user(first)
                .with_context(|| format!("Failed to fetch renamed user {}", first))?,
        };
        check_rename(first, patched.as_ref())?;
    }

    let mut unverified = Vec::new();
    for id in &ids {
        client
            .delete_user(id)
            .with_context(|| format!("Failed to delete user {}", id))?;
        let outcome = client.wait_until_deleted(id);
        registry.unregister(id);
        output::deletion(id, outcome);
        if !outcome.is_success() {
            unverified.push(id.clone());
        }
    }
    Ok(unverified)
}

async fn run_async(
    config: &RuntimeConfig,
    count: u32,
    cancel: Cancellation,
) -> Result<Vec<String>> {
    let client = AsyncUsersApiClient::new(config)
        .context("Failed to build HTTP client")?
        .with_cancellation(cancel);
    let registry = CleanupRegistry::new();

    let result = async_lifecycle(&client, &registry, count).await;
    if !registry.is_empty() {
        output::warning(&format!("Purging {} leftover users", registry.len()));
        output::cleanup(&registry.purge(&client).await);
    }
    result
}

async fn async_lifecycle(
    client: &AsyncUsersApiClient,
    registry: &CleanupRegistry,
    count: u32,
) -> Result<Vec<String>> {
    let factory = UserFactory::new();

    let mut ids = Vec::new();
    for _ in 0..count {
        let payload = factory.create_user_payload();
        let created = client
            .create_user(&payload)
            .await
            .with_context(|| format!("Failed to create user {}", payload["name"]))?;
        let id = created_id(created)?;
        registry.register(id.clone());

        let fetched = client
            .get_user(&id)
            .await
            .with_context(|| format!("Failed to fetch user {}", id))?;
        check_fetched(&id, &payload, fetched.as_ref())?;
        output::success(&format!("Created and verified user {}", id));
        ids.push(id);
    }

    if let Some(first) = ids.first() {
        let patched = client
            .patch_user(first, &json!({ "name": RENAMED }))
            .await
            .with_context(|| format!("Failed to rename user {}", first))?;
        let patched = match patched {
            Some(user) => Some(user),
            None => client
                .get_user(first)
                .await
                .with_context(|| format!("Failed to fetch renamed user {}", first))?,
        };
        check_rename(first, patched.as_ref())?;
    }

    let mut unverified = Vec::new();
    for id in &ids {
        client
            .delete_user(id)
            .await
            .with_context(|| format!("Failed to delete user {}", id))?;
        let outcome = client.wait_until_deleted(id).await;
        registry.unregister(id);
        output::deletion(id, outcome);
        if !outcome.is_success() {
            unverified.push(id.clone());
        }
    }
    Ok(unverified)
}

/// The fetched user must exist and carry the name it was created with
fn check_fetched(user_id: &str, payload: &Value, fetched: Option<&Value>) -> Result<()> {
    let fetched = fetched.with_context(|| format!("User {} not found after creation", user_id))?;
    ensure!(
        fetched["name"] == payload["name"],
        "User {} fetched with name {} but was created as {}",
        user_id,
        fetched["name"],
        payload["name"]
    );
    Ok(())
}

/// The renamed user, from the patch response or a follow-up fetch
fn check_rename(user_id: &str, patched: Option<&Value>) -> Result<()> {
    let patched = patched.with_context(|| format!("User {} vanished after rename", user_id))?;
    ensure!(
        patched["name"] == RENAMED,
        "Rename of user {} to {} failed, server reports name {}",
        user_id,
        RENAMED,
        patched["name"]
    );
    output::success(&format!("Renamed user {} to {}", user_id, RENAMED));
    Ok(())
}
