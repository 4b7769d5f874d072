//! Typed, fail-soft access to the key-value store.
//!
//! One collection per resource kind plus the split server collections:
//! `servers` holds what the provider (or fixture) delivered, `user-servers`
//! holds what the user created in this session. Reads that fail or find
//! malformed JSON degrade to empty; writes that fail are logged and
//! swallowed. Nothing in here panics or propagates a store error.

use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::warn;

use crate::keys::{self, ResourceKind};
use crate::models::{ApiMode, Server, ServerPatch};
use crate::KeyValueStore;

/// Persistence façade over two [`KeyValueStore`] handles: `session` for
/// every resource collection, `persistent` for the keys that must survive
/// a reload (active mode, bearer token).
#[derive(Clone)]
pub struct ResourceStorage {
    session: Arc<dyn KeyValueStore>,
    persistent: Arc<dyn KeyValueStore>,
}

impl ResourceStorage {
    pub fn new(session: Arc<dyn KeyValueStore>, persistent: Arc<dyn KeyValueStore>) -> Self {
        Self { session, persistent }
    }

    // ── Servers ─────────────────────────────────────────────────────

    /// Merged server view. In `Real` mode only the provider-supplied
    /// collection is visible; otherwise user-created servers come first,
    /// each sub-collection keeping its internal order.
    pub fn get_servers(&self, mode: ApiMode) -> Vec<Server> {
        let provider: Vec<Server> = self.read_session(ResourceKind::Servers.storage_key());
        if mode == ApiMode::Real {
            return provider;
        }
        let mut merged: Vec<Server> = self.read_session(keys::USER_SERVERS);
        merged.extend(provider);
        merged
    }

    /// Overwrite the provider-supplied collection wholesale.
    pub fn save_servers(&self, servers: &[Server]) {
        self.write_session(ResourceKind::Servers.storage_key(), servers);
    }

    /// Append a user-created server. Newest first, so the merged view
    /// lists creations in reverse-chronological order.
    pub fn add_server(&self, server: Server) {
        let mut user: Vec<Server> = self.read_session(keys::USER_SERVERS);
        user.insert(0, server);
        self.write_session(keys::USER_SERVERS, &user);
    }

    /// Shallow-merge `patch` into the first server matching `id`,
    /// searching the provider-supplied collection before the user-created
    /// one. Unknown ids are a no-op.
    pub fn update_server(&self, id: i64, patch: &ServerPatch) {
        let mut provider: Vec<Server> = self.read_session(ResourceKind::Servers.storage_key());
        if let Some(server) = provider.iter_mut().find(|s| s.id == id) {
            patch.apply(server);
            self.write_session(ResourceKind::Servers.storage_key(), &provider);
            return;
        }

        let mut user: Vec<Server> = self.read_session(keys::USER_SERVERS);
        if let Some(server) = user.iter_mut().find(|s| s.id == id) {
            patch.apply(server);
            self.write_session(keys::USER_SERVERS, &user);
        }
    }

    /// Remove the first server matching `id`, provider collection first.
    /// Absent ids are a no-op, so deleting twice is safe.
    pub fn delete_server(&self, id: i64) {
        let mut provider: Vec<Server> = self.read_session(ResourceKind::Servers.storage_key());
        if let Some(pos) = provider.iter().position(|s| s.id == id) {
            provider.remove(pos);
            self.write_session(ResourceKind::Servers.storage_key(), &provider);
            return;
        }

        let mut user: Vec<Server> = self.read_session(keys::USER_SERVERS);
        if let Some(pos) = user.iter().position(|s| s.id == id) {
            user.remove(pos);
            self.write_session(keys::USER_SERVERS, &user);
        }
    }

    // ── Generic collections ─────────────────────────────────────────

    pub fn get_collection<T: DeserializeOwned>(&self, kind: ResourceKind) -> Vec<T> {
        self.read_session(kind.storage_key())
    }

    pub fn save_collection<T: Serialize>(&self, kind: ResourceKind, items: &[T]) {
        self.write_session(kind.storage_key(), items);
    }

    // ── Mode and token ──────────────────────────────────────────────

    /// Active mode from the persistent store; absent or malformed falls
    /// back to `Mock`.
    pub fn mode(&self) -> ApiMode {
        match self.persistent.get(keys::API_MODE) {
            Ok(Some(raw)) => raw.parse().unwrap_or_default(),
            Ok(None) => ApiMode::default(),
            Err(e) => {
                warn!(error = %e, "failed to read api mode, defaulting to mock");
                ApiMode::default()
            }
        }
    }

    pub fn set_mode(&self, mode: ApiMode) {
        if let Err(e) = self.persistent.set(keys::API_MODE, mode.as_str()) {
            warn!(error = %e, %mode, "failed to persist api mode");
        }
    }

    pub fn token(&self) -> Option<String> {
        match self.persistent.get(keys::API_TOKEN) {
            Ok(token) => token,
            Err(e) => {
                warn!(error = %e, "failed to read api token");
                None
            }
        }
    }

    pub fn set_token(&self, token: &str) {
        if let Err(e) = self.persistent.set(keys::API_TOKEN, token) {
            warn!(error = %e, "failed to persist api token");
        }
    }

    // ── Introspection ───────────────────────────────────────────────

    /// Wipe every known resource key. Mode and token survive.
    pub fn clear_all(&self) {
        for kind in ResourceKind::ALL {
            if let Err(e) = self.session.remove(kind.storage_key()) {
                warn!(error = %e, key = kind.storage_key(), "failed to clear key");
            }
        }
        if let Err(e) = self.session.remove(keys::USER_SERVERS) {
            warn!(error = %e, key = keys::USER_SERVERS, "failed to clear key");
        }
    }

    /// Whether a non-empty collection is cached for `kind`.
    pub fn has_data(&self, kind: ResourceKind) -> bool {
        !self
            .get_collection::<serde_json::Value>(kind)
            .is_empty()
    }

    /// Total bytes of JSON cached under the known keys.
    pub fn storage_size(&self) -> usize {
        let mut size = 0;
        for kind in ResourceKind::ALL {
            size += self.value_len(kind.storage_key());
        }
        size + self.value_len(keys::USER_SERVERS)
    }

    fn value_len(&self, key: &str) -> usize {
        match self.session.get(key) {
            Ok(Some(v)) => v.len(),
            _ => 0,
        }
    }

    // ── Internals ───────────────────────────────────────────────────

    fn read_session<T: DeserializeOwned>(&self, key: &str) -> Vec<T> {
        let raw = match self.session.get(key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(e) => {
                warn!(error = %e, key, "store read failed, treating as empty");
                return Vec::new();
            }
        };
        match serde_json::from_str(&raw) {
            Ok(items) => items,
            Err(e) => {
                warn!(error = %e, key, "malformed stored JSON, treating as empty");
                Vec::new()
            }
        }
    }

    fn write_session<T: Serialize>(&self, key: &str, items: &[T]) {
        let raw = match serde_json::to_string(items) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(error = %e, key, "failed to encode collection");
                return;
            }
        };
        if let Err(e) = self.session.set(key, &raw) {
            warn!(error = %e, key, "store write failed, dropping update");
        }
    }
}
