//! In-memory Users API backend
//!
//! Serves `/users` and `/users/{id}` with create, read, patch, delete and
//! list. Two knobs model an unreliable deployment:
//!
//! - deletion lag: a deleted user stays readable for N more GETs
//! - scripted failures: the next requests answer with given 5xx statuses

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use serde_json::{json, Value};
use wiremock::matchers::path_regex;
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

#[derive(Default)]
struct BackendState {
    next_id: u64,
    users: BTreeMap<String, Value>,
    /// Deleted users still served, with the number of GETs left
    ghosts: HashMap<String, (u32, Value)>,
    deletion_lag: u32,
    scripted_failures: VecDeque<u16>,
}

/// A stateful mock of the Users collection
#[derive(Clone, Default)]
pub struct UsersBackend {
    state: Arc<Mutex<BackendState>>,
}

impl UsersBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep deleted users visible for `gets` further reads
    pub fn with_deletion_lag(self, gets: u32) -> Self {
        self.state.lock().unwrap().deletion_lag = gets;
        self
    }

    /// Answer the next requests, in order, with these statuses
    pub fn fail_next(&self, statuses: &[u16]) {
        self.state
            .lock()
            .unwrap()
            .scripted_failures
            .extend(statuses.iter().copied());
    }

    /// Seed a user directly, returning its id
    pub fn insert(&self, user: Value) -> String {
        let mut state = self.state.lock().unwrap();
        state.create(user)
    }

    pub fn contains(&self, user_id: &str) -> bool {
        self.state.lock().unwrap().users.contains_key(user_id)
    }

    pub fn user(&self, user_id: &str) -> Option<Value> {
        self.state.lock().unwrap().users.get(user_id).cloned()
    }

    pub fn user_count(&self) -> usize {
        self.state.lock().unwrap().users.len()
    }

    /// Serve the collection from `server` at `/users`
    pub async fn mount(&self, server: &MockServer) {
        Mock::given(path_regex(r"^/users(/[^/]+)?$"))
            .respond_with(self.clone())
            .mount(server)
            .await;
    }
}

impl BackendState {
    fn create(&mut self, mut user: Value) -> String {
        self.next_id += 1;
        let id = self.next_id.to_string();
        if let Value::Object(map) = &mut user {
            map.insert("id".into(), Value::String(id.clone()));
        }
        self.users.insert(id.clone(), user);
        id
    }

    fn get(&mut self, id: &str) -> ResponseTemplate {
        if let Some((remaining, ghost)) = self.ghosts.get_mut(id) {
            if *remaining > 0 {
                *remaining -= 1;
                return ResponseTemplate::new(200).set_body_json(ghost.clone());
            }
            self.ghosts.remove(id);
        }

        match self.users.get(id) {
            Some(user) => ResponseTemplate::new(200).set_body_json(user.clone()),
            None => not_found(),
        }
    }

    fn patch(&mut self, id: &str, changes: Value) -> ResponseTemplate {
        let Some(user) = self.users.get_mut(id) else {
            return not_found();
        };
        if let (Value::Object(user), Value::Object(changes)) = (&mut *user, changes) {
            for (key, value) in changes {
                if key != "id" {
                    user.insert(key, value);
                }
            }
        }
        ResponseTemplate::new(200).set_body_json(user.clone())
    }

    fn delete(&mut self, id: &str) -> ResponseTemplate {
        match self.users.remove(id) {
            Some(user) => {
                if self.deletion_lag > 0 {
                    self.ghosts
                        .insert(id.to_string(), (self.deletion_lag, user.clone()));
                }
                ResponseTemplate::new(200).set_body_json(user)
            }
            None => not_found(),
        }
    }
}

fn not_found() -> ResponseTemplate {
    ResponseTemplate::new(404).set_body_json(json!({"error": "Not found"}))
}

impl Respond for UsersBackend {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let mut state = self.state.lock().unwrap();

        if let Some(status) = state.scripted_failures.pop_front() {
            return ResponseTemplate::new(status).set_body_string("scripted failure");
        }

        let id = request
            .url
            .path()
            .strip_prefix("/users/")
            .map(str::to_string);

        match (request.method.as_str(), id) {
            ("POST", None) => match request.body_json::<Value>() {
                Ok(body) if body.is_object() => {
                    let id = state.create(body);
                    let created = state.users[&id].clone();
                    ResponseTemplate::new(201).set_body_json(created)
                }
                _ => ResponseTemplate::new(400).set_body_json(json!({"error": "Invalid body"})),
            },
            ("GET", None) => {
                let users: Vec<Value> = state.users.values().cloned().collect();
                ResponseTemplate::new(200).set_body_json(users)
            }
            ("GET", Some(id)) => state.get(&id),
            ("PATCH", Some(id)) | ("PUT", Some(id)) => match request.body_json::<Value>() {
                Ok(changes) => state.patch(&id, changes),
                Err(_) => ResponseTemplate::new(400).set_body_json(json!({"error": "Invalid body"})),
            },
            ("DELETE", Some(id)) => state.delete(&id),
            _ => ResponseTemplate::new(405),
        }
    }
}
