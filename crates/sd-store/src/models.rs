use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ── ApiMode ─────────────────────────────────────────────────────────

/// Which data source every load consults: static mock fixtures or the
/// live provider API. Exactly one mode is active at a time; write
/// operations are only permitted under `Mock`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApiMode {
    #[default]
    Mock,
    Real,
}

impl ApiMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mock => "mock",
            Self::Real => "real",
        }
    }
}

impl fmt::Display for ApiMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ApiMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, String> {
        match s {
            "mock" => Ok(Self::Mock),
            "real" => Ok(Self::Real),
            other => Err(format!("unknown api mode: {other}")),
        }
    }
}

// ── Server ──────────────────────────────────────────────────────────

/// Lifecycle state of a server record. `Available` is reserved for
/// catalog templates and never appears on an owned instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServerStatus {
    Running,
    Stopped,
    Error,
    Available,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Server {
    pub id: i64,
    pub name: String,
    pub status: ServerStatus,
    pub server_type: ServerType,
    #[serde(default)]
    pub datacenter: Option<Datacenter>,
    #[serde(default)]
    pub image: Option<Image>,
    #[serde(default)]
    pub public_net: PublicNet,
    #[serde(default)]
    pub private_net: Vec<PrivateNetRef>,
    #[serde(default)]
    pub firewalls: Vec<FirewallRef>,
    #[serde(default)]
    pub load_balancers: Vec<i64>,
    #[serde(default)]
    pub protection: Protection,
    /// Backup time-range token (`"22-02"`) or `None` when backups are off.
    #[serde(default)]
    pub backup_window: Option<String>,
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
    #[serde(default = "Utc::now")]
    pub created: DateTime<Utc>,

    // Derived at read time from the specification, never source of truth.
    #[serde(default)]
    pub price_monthly: Option<f64>,
    #[serde(default)]
    pub outgoing_traffic: Option<u64>,
    #[serde(default)]
    pub ingoing_traffic: Option<u64>,
    #[serde(default)]
    pub included_traffic: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServerType {
    pub id: i64,
    pub name: String,
    pub cores: u32,
    /// Memory in GB. Fractional sizes exist in the catalog (e.g. 0.5).
    pub memory: f64,
    pub disk: u32,
    #[serde(default)]
    pub architecture: String,
    #[serde(default)]
    pub prices: Vec<PriceTier>,
}

/// Location-specific price for a server type. Gross values are decimal
/// strings exactly as the catalog delivers them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PriceTier {
    pub location: String,
    pub price_monthly: String,
    #[serde(default)]
    pub price_hourly: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub network_zone: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Datacenter {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub location: Option<Location>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Image {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub os_flavor: String,
}

// ── Networking ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PublicNet {
    #[serde(default)]
    pub ipv4: Option<Ipv4Config>,
    #[serde(default)]
    pub ipv6: Option<Ipv6Config>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Ipv4Config {
    pub ip: String,
    #[serde(default)]
    pub blocked: bool,
    #[serde(default)]
    pub dns_ptr: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Ipv6Config {
    pub ip: String,
    #[serde(default)]
    pub blocked: bool,
    #[serde(default)]
    pub dns_ptr: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PrivateNetRef {
    pub network: i64,
    #[serde(default)]
    pub ip: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FirewallRef {
    pub id: i64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Protection {
    #[serde(default)]
    pub delete: bool,
    #[serde(default)]
    pub rebuild: bool,
}

// ── Other resource collections ──────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Firewall {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub applied_to: Vec<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActionRecord {
    pub id: i64,
    pub command: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub started: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FloatingIp {
    pub id: i64,
    pub ip: String,
    #[serde(default, rename = "type")]
    pub ip_type: String,
    #[serde(default)]
    pub server: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LoadBalancer {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub targets: Vec<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Network {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub ip_range: String,
}

// ── Partial update ──────────────────────────────────────────────────

/// Shallow-merge update for a stored server. Every field is optional;
/// `backup_window` is doubly optional so "disable backups" (set to
/// `None`) and "leave alone" stay distinct.
#[derive(Debug, Clone, Default)]
pub struct ServerPatch {
    pub name: Option<String>,
    pub status: Option<ServerStatus>,
    pub protection: Option<Protection>,
    pub backup_window: Option<Option<String>>,
    pub labels: Option<BTreeMap<String, String>>,
    pub price_monthly: Option<f64>,
}

impl ServerPatch {
    /// Apply the set fields onto `server`, leaving the rest untouched.
    pub fn apply(&self, server: &mut Server) {
        if let Some(name) = &self.name {
            server.name = name.clone();
        }
        if let Some(status) = self.status {
            server.status = status;
        }
        if let Some(protection) = self.protection {
            server.protection = protection;
        }
        if let Some(window) = &self.backup_window {
            server.backup_window = window.clone();
        }
        if let Some(labels) = &self.labels {
            server.labels = labels.clone();
        }
        if let Some(price) = self.price_monthly {
            server.price_monthly = Some(price);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn server() -> Server {
        Server {
            id: 1,
            name: "web-01".into(),
            status: ServerStatus::Running,
            server_type: ServerType::default(),
            datacenter: None,
            image: None,
            public_net: PublicNet::default(),
            private_net: vec![],
            firewalls: vec![],
            load_balancers: vec![],
            protection: Protection::default(),
            backup_window: Some("22-02".into()),
            labels: BTreeMap::new(),
            created: Utc::now(),
            price_monthly: None,
            outgoing_traffic: None,
            ingoing_traffic: None,
            included_traffic: None,
        }
    }

    #[test]
    fn patch_merges_only_set_fields() {
        let mut s = server();
        let patch = ServerPatch {
            status: Some(ServerStatus::Stopped),
            ..Default::default()
        };
        patch.apply(&mut s);
        assert_eq!(s.status, ServerStatus::Stopped);
        assert_eq!(s.name, "web-01");
        assert_eq!(s.backup_window.as_deref(), Some("22-02"));
    }

    #[test]
    fn patch_can_clear_backup_window() {
        let mut s = server();
        let patch = ServerPatch {
            backup_window: Some(None),
            ..Default::default()
        };
        patch.apply(&mut s);
        assert_eq!(s.backup_window, None);
    }

    #[test]
    fn mode_parses_and_displays() {
        assert_eq!("mock".parse::<ApiMode>().unwrap(), ApiMode::Mock);
        assert_eq!("real".parse::<ApiMode>().unwrap(), ApiMode::Real);
        assert!("live".parse::<ApiMode>().is_err());
        assert_eq!(ApiMode::Real.to_string(), "real");
    }

    #[test]
    fn server_deserializes_with_missing_optional_fields() {
        let json = r#"{
            "id": 7,
            "name": "minimal",
            "status": "stopped",
            "server_type": {"id": 1, "name": "cx22", "cores": 2, "memory": 4.0, "disk": 40}
        }"#;
        let s: Server = serde_json::from_str(json).unwrap();
        assert_eq!(s.id, 7);
        assert_eq!(s.status, ServerStatus::Stopped);
        assert!(s.public_net.ipv4.is_none());
        assert!(s.labels.is_empty());
    }
}
