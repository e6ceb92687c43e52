//! Unique user payloads for tests and scenarios

use std::collections::HashSet;
use std::sync::{Mutex, PoisonError};

use serde_json::{json, Map, Value};
use uuid::Uuid;

/// Generates user payloads with names unique for the factory's lifetime
///
/// Safe to share between threads.
#[derive(Debug, Default)]
pub struct UserFactory {
    used_names: Mutex<HashSet<String>>,
}

impl UserFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// A fresh `user_<8 hex>` name never handed out before
    pub fn unique_name(&self) -> String {
        let mut used = self.used_names.lock().unwrap_or_else(PoisonError::into_inner);
        loop {
            let suffix = Uuid::new_v4().simple().to_string();
            let name = format!("user_{}", &suffix[..8]);
            if used.insert(name.clone()) {
                return name;
            }
        }
    }

    /// `{ "name": <unique>, "email": "<name>@example.com" }`
    pub fn create_user_payload(&self) -> Value {
        let name = self.unique_name();
        json!({
            "email": format!("{}@example.com", name),
            "name": name,
        })
    }

    /// A default payload with `overrides` merged on top
    ///
    /// Overrides that are not a JSON object are ignored.
    pub fn create_user_payload_with(&self, overrides: Value) -> Value {
        let mut payload = match self.create_user_payload() {
            Value::Object(map) => map,
            _ => Map::new(),
        };

        if let Value::Object(overrides) = overrides {
            payload.extend(overrides);
        }
        Value::Object(payload)
    }

    /// Number of names handed out since creation or the last reset
    pub fn generated(&self) -> usize {
        self.used_names
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Forget every generated name
    pub fn reset(&self) {
        self.used_names
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}
