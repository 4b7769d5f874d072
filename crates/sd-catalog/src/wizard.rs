//! Step-completion state machine for the server-creation wizard.
//!
//! Pure client-side form state: each step exposes a named completion
//! predicate derived from the current selections, and `can_create()`
//! combines the four required steps. Only the firewall selection is
//! persisted; everything else lives and dies with the wizard session.

use std::sync::Arc;

use tracing::warn;

use sd_store::keys::WIZARD_FIREWALLS;
use sd_store::KeyValueStore;

use crate::generator::CreateConfig;
use crate::labels::parse_labels;
use crate::naming::validate_server_name;

const DEFAULT_CPU_ARCHITECTURE: &str = "x86";
const DEFAULT_BACKUP_WINDOW: &str = "22-02";

pub struct WizardState {
    store: Arc<dyn KeyValueStore>,

    pub architecture: Option<String>,
    pub cpu_architecture: String,
    pub server_type: Option<String>,
    pub location: Option<String>,
    pub image: Option<String>,
    pub firewalls: Vec<i64>,
    pub backups_enabled: bool,
    pub backup_window: String,
    pub enable_ipv4: bool,
    pub enable_ipv6: bool,
    pub labels_text: String,
    pub name: String,
    pub name_touched: bool,
}

impl WizardState {
    /// Fresh wizard with documented defaults; the persisted firewall
    /// selection is restored from the store.
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        let firewalls = load_firewalls(&*store);
        Self {
            store,
            architecture: None,
            cpu_architecture: DEFAULT_CPU_ARCHITECTURE.into(),
            server_type: None,
            location: None,
            image: None,
            firewalls,
            backups_enabled: false,
            backup_window: DEFAULT_BACKUP_WINDOW.into(),
            enable_ipv4: true,
            enable_ipv6: true,
            labels_text: String::new(),
            name: String::new(),
            name_touched: false,
        }
    }

    // ── Mutations ───────────────────────────────────────────────────

    pub fn select_architecture(&mut self, family: impl Into<String>) {
        self.architecture = Some(family.into());
    }

    pub fn select_server_type(&mut self, name: impl Into<String>) {
        self.server_type = Some(name.into());
    }

    pub fn select_location(&mut self, name: impl Into<String>) {
        self.location = Some(name.into());
    }

    pub fn select_image(&mut self, name: impl Into<String>) {
        self.image = Some(name.into());
    }

    /// Add or remove a firewall id; the selection is persisted so it
    /// survives beyond this wizard session.
    pub fn toggle_firewall(&mut self, id: i64) {
        match self.firewalls.iter().position(|&fw| fw == id) {
            Some(pos) => {
                self.firewalls.remove(pos);
            }
            None => self.firewalls.push(id),
        }
        self.persist_firewalls();
    }

    pub fn set_backups(&mut self, enabled: bool) {
        self.backups_enabled = enabled;
    }

    pub fn set_backup_window(&mut self, window: impl Into<String>) {
        self.backup_window = window.into();
    }

    pub fn set_labels_text(&mut self, text: impl Into<String>) {
        self.labels_text = text.into();
    }

    /// Marks the name step as touched. Empty input stays valid and
    /// means "auto-generate a name on create".
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
        self.name_touched = true;
    }

    /// Restore every field to its default. The persisted firewall
    /// selection is reloaded rather than cleared, since it outlives the
    /// wizard session by design.
    pub fn reset(&mut self) {
        let store = Arc::clone(&self.store);
        *self = Self::new(store);
    }

    // ── Step completion ─────────────────────────────────────────────

    pub fn architecture_complete(&self) -> bool {
        self.architecture.is_some() && self.server_type.is_some()
    }

    pub fn location_complete(&self) -> bool {
        self.location.as_deref().is_some_and(|l| !l.is_empty())
    }

    pub fn image_complete(&self) -> bool {
        self.image.as_deref().is_some_and(|i| !i.is_empty())
    }

    pub fn networking_complete(&self) -> bool {
        self.enable_ipv4 || self.enable_ipv6
    }

    pub fn security_complete(&self) -> bool {
        !self.firewalls.is_empty()
    }

    pub fn backups_complete(&self) -> bool {
        self.backups_enabled
    }

    pub fn labels_complete(&self) -> bool {
        !parse_labels(&self.labels_text).is_empty()
    }

    /// Complete once touched and currently valid; touched-but-empty
    /// counts (auto-generate), untouched never does.
    pub fn name_complete(&self) -> bool {
        self.name_touched && validate_server_name(&self.name).is_empty()
    }

    /// The four required steps. Networking, security, backups and
    /// labels are optional.
    pub fn can_create(&self) -> bool {
        self.architecture_complete()
            && self.location_complete()
            && self.image_complete()
            && self.name_complete()
    }

    /// Snapshot the wizard's choices as a creation config.
    pub fn create_config(&self) -> CreateConfig {
        CreateConfig {
            enable_ipv4: self.enable_ipv4,
            enable_ipv6: self.enable_ipv6,
            backups: self.backups_enabled,
            backup_window: self
                .backups_enabled
                .then(|| self.backup_window.clone()),
            firewall_ids: self.firewalls.clone(),
            labels: parse_labels(&self.labels_text).into_iter().collect(),
        }
    }

    fn persist_firewalls(&self) {
        let raw = match serde_json::to_string(&self.firewalls) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(error = %e, "failed to encode firewall selection");
                return;
            }
        };
        if let Err(e) = self.store.set(WIZARD_FIREWALLS, &raw) {
            warn!(error = %e, "failed to persist firewall selection");
        }
    }
}

/// Stored firewall selection; malformed or unavailable storage degrades
/// to an empty selection.
fn load_firewalls(store: &dyn KeyValueStore) -> Vec<i64> {
    let raw = match store.get(WIZARD_FIREWALLS) {
        Ok(Some(raw)) => raw,
        Ok(None) => return Vec::new(),
        Err(e) => {
            warn!(error = %e, "failed to read firewall selection");
            return Vec::new();
        }
    };
    match serde_json::from_str(&raw) {
        Ok(ids) => ids,
        Err(e) => {
            warn!(error = %e, "malformed firewall selection, ignoring");
            Vec::new()
        }
    }
}
