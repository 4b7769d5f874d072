//! The resource catalog service: one load state machine per resource
//! kind, a shared mode flag, and mode-gated write operations.
//!
//! `CatalogService` is not an ambient singleton: the binary constructs it
//! once with its storage and both sources and passes it to whoever needs
//! it. Methods take `&mut self`; callers sharing the service across tasks
//! must serialize access (a mutex or a single-owner task), which restores
//! the run-to-completion guarantee the state transitions assume.
//!
//! Exclusive access is also what rules out stale responses after a mode
//! switch: a load holds the service for its whole fetch-and-apply span,
//! so a mode switch can only run between loads, never while one is in
//! flight. Every response is applied under the mode that issued it.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

use cloud_api::{ApiResponse, ResourceSource, extract_list, extract_one};
use sd_store::models::{
    ActionRecord, ApiMode, Datacenter, Firewall, FloatingIp, Image, LoadBalancer, Location,
    Network, Server, ServerPatch, ServerStatus, ServerType,
};
use sd_store::{ResourceKind, ResourceStorage};

use crate::generator::{self, CreateConfig, ResourceGenerator};

const ENDPOINT_LOG_CAP: usize = 10;

/// Load lifecycle of one resource kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LoadState {
    #[default]
    Idle,
    Loading,
    Loaded,
    Error,
}

/// One observed endpoint call, for the observability widget. Bounded
/// ring, not consistency-critical.
#[derive(Debug, Clone)]
pub struct EndpointCall {
    pub status: u16,
    pub method: &'static str,
    pub endpoint: String,
    pub at: DateTime<Utc>,
}

/// Cached non-server collections, one slot per kind.
#[derive(Default)]
pub struct Collections {
    pub server_types: Vec<ServerType>,
    pub locations: Vec<Location>,
    pub datacenters: Vec<Datacenter>,
    pub images: Vec<Image>,
    pub firewalls: Vec<Firewall>,
    pub actions: Vec<ActionRecord>,
    pub floating_ips: Vec<FloatingIp>,
    pub load_balancers: Vec<LoadBalancer>,
    pub networks: Vec<Network>,
}

pub struct CatalogService {
    storage: ResourceStorage,
    generator: ResourceGenerator,
    mock: Arc<dyn ResourceSource>,
    live: Arc<dyn ResourceSource>,

    mode: ApiMode,
    loading: bool,
    error: Option<String>,
    restricted: bool,
    /// Retry server types against the mock fixture when the primary
    /// endpoint fails.
    type_fallback: bool,

    load_states: HashMap<ResourceKind, LoadState>,
    endpoint_log: VecDeque<EndpointCall>,

    /// Merged server view, re-read from storage after every load/write.
    pub servers: Vec<Server>,
    /// Creation templates, regenerated on every server-type load.
    pub templates: Vec<Server>,
    pub collections: Collections,
}

impl CatalogService {
    /// Build the service around its storage and both data sources. The
    /// persisted mode is restored and the cached merged view warms the
    /// server collection, so the UI has data before the first load.
    pub fn new(
        storage: ResourceStorage,
        mock: Arc<dyn ResourceSource>,
        live: Arc<dyn ResourceSource>,
        type_fallback: bool,
    ) -> Self {
        let mode = storage.mode();
        let servers = storage.get_servers(mode);
        let generator = ResourceGenerator::new(storage.clone());
        Self {
            storage,
            generator,
            mock,
            live,
            mode,
            loading: false,
            error: None,
            restricted: false,
            type_fallback,
            load_states: HashMap::new(),
            endpoint_log: VecDeque::new(),
            servers,
            templates: Vec::new(),
            collections: Collections::default(),
        }
    }

    // ── State accessors ─────────────────────────────────────────────

    pub fn mode(&self) -> ApiMode {
        self.mode
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Set when a write was attempted outside mock mode. Distinct from
    /// an error; the UI turns it into a dialog.
    pub fn is_restricted(&self) -> bool {
        self.restricted
    }

    /// Clear the restricted signal once the UI has shown its dialog.
    pub fn acknowledge_restricted(&mut self) {
        self.restricted = false;
    }

    pub fn load_state(&self, kind: ResourceKind) -> LoadState {
        self.load_states.get(&kind).copied().unwrap_or_default()
    }

    pub fn endpoint_log(&self) -> impl Iterator<Item = &EndpointCall> {
        self.endpoint_log.iter()
    }

    /// All cached servers that are actual instances, excluding catalog
    /// templates that leaked into the general collection.
    pub fn my_servers(&self) -> Vec<&Server> {
        self.servers
            .iter()
            .filter(|s| s.status != ServerStatus::Available)
            .collect()
    }

    // ── Mode switching ──────────────────────────────────────────────

    /// Switch the active data source and reload every collection.
    /// Needing the service exclusively means no load is in flight for
    /// the old mode when the switch runs.
    pub async fn set_mode(&mut self, mode: ApiMode) {
        if mode == self.mode {
            return;
        }
        info!(%mode, "switching api mode");
        self.mode = mode;
        self.storage.set_mode(mode);
        self.restricted = false;

        self.load_all().await;

        if mode == ApiMode::Mock {
            self.generate_endpoint_statuses();
        }
    }

    /// Synthetic telemetry shown when mock mode is entered: one green
    /// entry per resource endpoint.
    fn generate_endpoint_statuses(&mut self) {
        for kind in ResourceKind::ALL {
            let endpoint = self.mock.endpoint(kind);
            self.push_call(EndpointCall {
                status: 200,
                method: "GET",
                endpoint,
                at: Utc::now(),
            });
        }
    }

    // ── Loading ─────────────────────────────────────────────────────

    /// Reload every resource collection from the active source.
    pub async fn load_all(&mut self) {
        self.loading = true;
        self.error = None;
        for kind in ResourceKind::ALL {
            self.load_resource(kind).await;
        }
        self.loading = false;
    }

    /// Load one resource kind; servers and server types have dedicated
    /// paths, everything else goes through the generic typed load.
    pub async fn load_resource(&mut self, kind: ResourceKind) {
        match kind {
            ResourceKind::Servers => self.load_servers().await,
            ResourceKind::ServerTypes => self.load_server_types().await,
            ResourceKind::Locations => self.load_typed(kind, |c, v| c.locations = v).await,
            ResourceKind::Datacenters => self.load_typed(kind, |c, v| c.datacenters = v).await,
            ResourceKind::Images => self.load_typed(kind, |c, v| c.images = v).await,
            ResourceKind::Firewalls => self.load_typed(kind, |c, v| c.firewalls = v).await,
            ResourceKind::Actions => self.load_typed(kind, |c, v| c.actions = v).await,
            ResourceKind::FloatingIps => self.load_typed(kind, |c, v| c.floating_ips = v).await,
            ResourceKind::LoadBalancers => {
                self.load_typed(kind, |c, v| c.load_balancers = v).await
            }
            ResourceKind::Networks => self.load_typed(kind, |c, v| c.networks = v).await,
        }
    }

    /// Load the server collection: fetch, attach computed prices, cache
    /// to storage (only when non-empty, so a transient empty response
    /// never wipes a good cache), then re-read the merged view.
    pub async fn load_servers(&mut self) {
        let kind = ResourceKind::Servers;
        self.set_state(kind, LoadState::Loading);

        let source = self.source();
        let outcome = source.fetch_list(kind).await;
        self.record_live_call(kind, &outcome);

        match outcome.and_then(|resp| extract_list::<Server>(kind, &resp.body)) {
            Ok(mut servers) => {
                for server in &mut servers {
                    server.price_monthly = Some(generator::estimate_monthly_price(
                        server.server_type.cores,
                        server.server_type.memory,
                    ));
                }
                if !servers.is_empty() {
                    self.storage.save_servers(&servers);
                }
                self.servers = self.storage.get_servers(self.mode);
                self.set_state(kind, LoadState::Loaded);
            }
            Err(e) => {
                // Last known good stays visible alongside the message.
                warn!(error = %e, "server load failed, keeping cached view");
                self.error = Some(format!("Failed to load servers: {e}"));
                self.set_state(kind, LoadState::Error);
            }
        }
    }

    /// Load the server-type catalog. The primary endpoint is always
    /// tried first; on failure the mock fixture is retried iff the
    /// fallback flag is on, otherwise the catalog resolves to empty.
    pub async fn load_server_types(&mut self) {
        let kind = ResourceKind::ServerTypes;
        self.set_state(kind, LoadState::Loading);

        let source = self.source();
        let mut outcome = source.fetch_list(kind).await;
        self.record_live_call(kind, &outcome);

        if outcome.is_err() && self.type_fallback {
            debug!("server type endpoint failed, retrying mock fixture");
            outcome = self.mock.fetch_list(kind).await;
        }

        match outcome.and_then(|resp| extract_list::<ServerType>(kind, &resp.body)) {
            Ok(types) => {
                if !types.is_empty() {
                    self.storage.save_collection(kind, &types);
                }
                self.templates = ResourceGenerator::transform_server_types_to_servers(&types);
                self.collections.server_types = types;
                self.set_state(kind, LoadState::Loaded);
            }
            Err(e) => {
                warn!(error = %e, "server type load failed, resolving to empty");
                self.templates.clear();
                self.collections.server_types.clear();
                self.error = Some(format!("Failed to load server types: {e}"));
                self.set_state(kind, LoadState::Error);
            }
        }
    }

    /// Generic select-by-mode, fail-soft-to-empty load for the plain
    /// collections. `assign` writes the result into its slot.
    async fn load_typed<T>(&mut self, kind: ResourceKind, assign: fn(&mut Collections, Vec<T>))
    where
        T: DeserializeOwned + Serialize,
    {
        self.set_state(kind, LoadState::Loading);

        let source = self.source();
        let outcome = source.fetch_list(kind).await;
        self.record_live_call(kind, &outcome);

        match outcome.and_then(|resp| extract_list::<T>(kind, &resp.body)) {
            Ok(items) => {
                self.storage.save_collection(kind, &items);
                assign(&mut self.collections, items);
                self.set_state(kind, LoadState::Loaded);
            }
            Err(e) => {
                warn!(error = %e, %kind, "resource load failed, resolving to empty");
                assign(&mut self.collections, Vec::new());
                self.error = Some(format!("Failed to load {kind}: {e}"));
                self.set_state(kind, LoadState::Error);
            }
        }
    }

    /// Single-server lookup. Mock mode answers from the cached merged
    /// collection; real mode issues a dedicated fetch.
    pub async fn get_server_by_id(&mut self, id: i64) -> Option<Server> {
        if self.mode == ApiMode::Mock {
            return self.servers.iter().find(|s| s.id == id).cloned();
        }

        let kind = ResourceKind::Servers;
        let outcome = self.live.fetch_one(kind, id).await;
        self.record_live_call(kind, &outcome);
        match outcome.and_then(|resp| extract_one::<Server>(kind, &resp.body)) {
            Ok(server) => Some(server),
            Err(e) => {
                warn!(error = %e, server_id = id, "single server fetch failed");
                None
            }
        }
    }

    // ── Write operations (mock mode only) ───────────────────────────

    /// Create a server from the template whose type carries `type_name`.
    /// Outside mock mode this flips the restricted signal and mutates
    /// nothing; the missing-template case falls back to defaults inside
    /// the generator.
    pub fn create_server_from_type(
        &mut self,
        type_name: &str,
        custom_name: Option<&str>,
        config: &CreateConfig,
    ) -> Option<Server> {
        if !self.ensure_mock() {
            return None;
        }
        let template = self
            .templates
            .iter()
            .find(|t| t.server_type.name == type_name)
            .cloned();
        let server = self
            .generator
            .create_server(template.as_ref(), custom_name, config);
        self.refresh_servers();
        Some(server)
    }

    pub fn update_server_status(&mut self, id: i64, status: ServerStatus) -> bool {
        self.apply_patch(
            id,
            ServerPatch {
                status: Some(status),
                ..Default::default()
            },
        )
    }

    pub fn update_server_protection(&mut self, id: i64, delete: bool, rebuild: bool) -> bool {
        self.apply_patch(
            id,
            ServerPatch {
                protection: Some(sd_store::models::Protection { delete, rebuild }),
                ..Default::default()
            },
        )
    }

    pub fn update_server(&mut self, id: i64, patch: ServerPatch) -> bool {
        self.apply_patch(id, patch)
    }

    pub fn delete_server(&mut self, id: i64) -> bool {
        if !self.ensure_mock() {
            return false;
        }
        self.storage.delete_server(id);
        self.refresh_servers();
        true
    }

    fn apply_patch(&mut self, id: i64, patch: ServerPatch) -> bool {
        if !self.ensure_mock() {
            return false;
        }
        self.storage.update_server(id, &patch);
        self.refresh_servers();
        true
    }

    /// Read-after-write: every successful mutation re-derives the
    /// exposed collection from storage.
    fn refresh_servers(&mut self) {
        self.servers = self.storage.get_servers(self.mode);
    }

    fn ensure_mock(&mut self) -> bool {
        if self.mode == ApiMode::Mock {
            return true;
        }
        warn!(mode = %self.mode, "write rejected outside mock mode");
        self.restricted = true;
        false
    }

    // ── Internals ───────────────────────────────────────────────────

    fn source(&self) -> Arc<dyn ResourceSource> {
        match self.mode {
            ApiMode::Mock => Arc::clone(&self.mock),
            ApiMode::Real => Arc::clone(&self.live),
        }
    }

    fn set_state(&mut self, kind: ResourceKind, state: LoadState) {
        self.load_states.insert(kind, state);
    }

    fn record_live_call(&mut self, kind: ResourceKind, outcome: &cloud_api::Result<ApiResponse>) {
        if self.mode != ApiMode::Real {
            return;
        }
        let status = match outcome {
            Ok(resp) => resp.status,
            Err(cloud_api::Error::Api { status, .. }) => *status,
            // Transport failures never produced a status line.
            Err(_) => 0,
        };
        let endpoint = self.live.endpoint(kind);
        self.push_call(EndpointCall {
            status,
            method: "GET",
            endpoint,
            at: Utc::now(),
        });
    }

    fn push_call(&mut self, call: EndpointCall) {
        self.endpoint_log.push_back(call);
        while self.endpoint_log.len() > ENDPOINT_LOG_CAP {
            self.endpoint_log.pop_front();
        }
    }
}
