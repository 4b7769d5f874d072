//! Synthesizes server records: user creations from a wizard template,
//! and catalog server types reshaped into selectable pseudo-servers.

use std::collections::{BTreeMap, HashSet};

use chrono::Utc;
use rand::Rng;
use tracing::info;

use sd_store::ResourceStorage;
use sd_store::models::{
    ApiMode, Datacenter, FirewallRef, Image, Ipv4Config, Ipv6Config, Location, PriceTier,
    Protection, PublicNet, Server, ServerStatus, ServerType,
};

/// Synthetic ids for catalog templates start here; low enough to never
/// collide with a time-derived creation id.
pub const TEMPLATE_ID_BASE: i64 = 900_000;

const DEFAULT_BACKUP_WINDOW: &str = "22-02";

/// Estimated monthly price from a specification, two-decimal currency
/// units: memory at 0.75/GB plus cores at 1.50 each.
pub fn estimate_monthly_price(cores: u32, memory_gb: f64) -> f64 {
    ((memory_gb * 0.75 + cores as f64 * 1.5) * 100.0).round() / 100.0
}

/// Cosmetic random IPv4. First octet avoids 0 so the address always
/// looks routable; no reachability or collision guarantees.
pub fn random_ipv4() -> String {
    let mut rng = rand::rng();
    format!(
        "{}.{}.{}.{}",
        rng.random_range(1..=255u8),
        rng.random_range(0..=255u8),
        rng.random_range(0..=255u8),
        rng.random_range(0..=255u8),
    )
}

/// Cosmetic random IPv6: eight random 16-bit groups.
pub fn random_ipv6() -> String {
    let mut rng = rand::rng();
    (0..8)
        .map(|_| format!("{:x}", rng.random_range(0..=0xffffu32)))
        .collect::<Vec<_>>()
        .join(":")
}

/// Networking, backup, firewall and label choices for a creation.
#[derive(Debug, Clone)]
pub struct CreateConfig {
    pub enable_ipv4: bool,
    pub enable_ipv6: bool,
    pub backups: bool,
    pub backup_window: Option<String>,
    pub firewall_ids: Vec<i64>,
    pub labels: BTreeMap<String, String>,
}

impl Default for CreateConfig {
    fn default() -> Self {
        Self {
            enable_ipv4: true,
            enable_ipv6: true,
            backups: false,
            backup_window: None,
            firewall_ids: Vec::new(),
            labels: BTreeMap::new(),
        }
    }
}

/// Builds complete server records and persists user creations.
#[derive(Clone)]
pub struct ResourceGenerator {
    storage: ResourceStorage,
}

impl ResourceGenerator {
    pub fn new(storage: ResourceStorage) -> Self {
        Self { storage }
    }

    /// Build a server from a creation template, falling back to
    /// hard-coded defaults for any field the template lacks, persist it
    /// to the user-created collection, and return it.
    pub fn create_server(
        &self,
        template: Option<&Server>,
        custom_name: Option<&str>,
        config: &CreateConfig,
    ) -> Server {
        let server_type = template
            .map(|t| t.server_type.clone())
            .unwrap_or_else(default_server_type);
        let datacenter = template
            .and_then(|t| t.datacenter.clone())
            .unwrap_or_else(default_datacenter);
        let image = template
            .and_then(|t| t.image.clone())
            .unwrap_or_else(default_image);

        let id = self.next_id();
        let name = match custom_name.map(str::trim) {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => format!("server-{id}"),
        };

        let public_net = PublicNet {
            ipv4: config.enable_ipv4.then(|| Ipv4Config {
                ip: random_ipv4(),
                blocked: false,
                dns_ptr: format!("{name}.skydeck.example"),
            }),
            ipv6: config.enable_ipv6.then(|| Ipv6Config {
                ip: random_ipv6(),
                blocked: false,
                dns_ptr: None,
            }),
        };

        let backup_window = config.backups.then(|| {
            config
                .backup_window
                .clone()
                .unwrap_or_else(|| DEFAULT_BACKUP_WINDOW.to_string())
        });

        let price_monthly = estimate_monthly_price(server_type.cores, server_type.memory);

        let server = Server {
            id,
            name,
            status: ServerStatus::Running,
            server_type,
            datacenter: Some(datacenter),
            image: Some(image),
            public_net,
            private_net: Vec::new(),
            firewalls: config
                .firewall_ids
                .iter()
                .map(|&id| FirewallRef { id })
                .collect(),
            load_balancers: Vec::new(),
            protection: Protection::default(),
            backup_window,
            labels: config.labels.clone(),
            created: Utc::now(),
            price_monthly: Some(price_monthly),
            outgoing_traffic: Some(0),
            ingoing_traffic: Some(0),
            included_traffic: Some(20 * 1024 * 1024 * 1024 * 1024),
        };

        self.storage.add_server(server.clone());
        info!(server_id = server.id, name = %server.name, "created server");
        server
    }

    /// Reshape catalog server types into selectable pseudo-servers:
    /// synthetic id, status `available`, no datacenter or image. Pure,
    /// no storage interaction; regenerated on every catalog reload.
    pub fn transform_server_types_to_servers(types: &[ServerType]) -> Vec<Server> {
        types
            .iter()
            .enumerate()
            .map(|(index, st)| Server {
                id: TEMPLATE_ID_BASE + index as i64,
                name: st.name.clone(),
                status: ServerStatus::Available,
                server_type: st.clone(),
                datacenter: None,
                image: None,
                public_net: PublicNet::default(),
                private_net: Vec::new(),
                firewalls: Vec::new(),
                load_balancers: Vec::new(),
                protection: Protection::default(),
                backup_window: None,
                labels: BTreeMap::new(),
                created: Utc::now(),
                price_monthly: Some(estimate_monthly_price(st.cores, st.memory)),
                outgoing_traffic: None,
                ingoing_traffic: None,
                included_traffic: None,
            })
            .collect()
    }

    /// Current time millis plus a random offset, re-rolled until it
    /// misses every id already in storage.
    fn next_id(&self) -> i64 {
        let existing: HashSet<i64> = self
            .storage
            .get_servers(ApiMode::Mock)
            .iter()
            .map(|s| s.id)
            .collect();
        let mut rng = rand::rng();
        loop {
            let id = Utc::now().timestamp_millis() + rng.random_range(0..1000);
            if !existing.contains(&id) {
                return id;
            }
        }
    }
}

fn default_server_type() -> ServerType {
    ServerType {
        id: 1,
        name: "cx22".into(),
        cores: 2,
        memory: 4.0,
        disk: 40,
        architecture: "x86".into(),
        prices: vec![PriceTier {
            location: "fsn1".into(),
            price_monthly: "4.50".into(),
            price_hourly: Some("0.0074".into()),
        }],
    }
}

fn default_datacenter() -> Datacenter {
    Datacenter {
        id: 1,
        name: "fsn1-dc14".into(),
        description: "Falkenstein 1 virtual DC 14".into(),
        location: Some(Location {
            id: 1,
            name: "fsn1".into(),
            city: "Falkenstein".into(),
            country: "DE".into(),
            network_zone: "eu-central".into(),
        }),
    }
}

fn default_image() -> Image {
    Image {
        id: 1,
        name: "ubuntu-24.04".into(),
        description: "Ubuntu 24.04 LTS".into(),
        os_flavor: "ubuntu".into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use sd_store::MemoryStore;

    fn generator() -> (ResourceGenerator, ResourceStorage) {
        let storage = ResourceStorage::new(
            Arc::new(MemoryStore::new()),
            Arc::new(MemoryStore::new()),
        );
        (ResourceGenerator::new(storage.clone()), storage)
    }

    fn server_type(name: &str, cores: u32, memory: f64) -> ServerType {
        ServerType {
            id: 10,
            name: name.into(),
            cores,
            memory,
            disk: 80,
            architecture: "x86".into(),
            prices: vec![],
        }
    }

    #[test]
    fn price_formula_matches_reference_values() {
        assert_eq!(estimate_monthly_price(4, 8.0), 12.0);
        assert_eq!(estimate_monthly_price(2, 4.0), 4.5);
        assert_eq!(estimate_monthly_price(1, 0.5), 1.88);
    }

    #[test]
    fn created_server_is_running_and_persisted_first() {
        let (generator, storage) = generator();
        let template = ResourceGenerator::transform_server_types_to_servers(&[server_type(
            "cpx31", 4, 8.0,
        )])
        .remove(0);

        let server = generator.create_server(Some(&template), Some("web-01"), &CreateConfig::default());

        assert_eq!(server.name, "web-01");
        assert_eq!(server.status, ServerStatus::Running);
        assert!(server.public_net.ipv4.is_some());
        assert!(server.public_net.ipv6.is_some());
        assert_eq!(server.price_monthly, Some(12.0));

        let merged = storage.get_servers(ApiMode::Mock);
        assert_eq!(merged[0], server);
    }

    #[test]
    fn missing_template_falls_back_to_defaults() {
        let (generator, _) = generator();
        let server = generator.create_server(None, None, &CreateConfig::default());

        assert_eq!(server.server_type.name, "cx22");
        assert!(server.datacenter.is_some());
        assert!(server.image.is_some());
        assert!(server.name.starts_with("server-"));
        assert_eq!(server.price_monthly, Some(4.5));
    }

    #[test]
    fn networking_flags_are_honored() {
        let (generator, _) = generator();
        let config = CreateConfig {
            enable_ipv4: false,
            enable_ipv6: true,
            ..Default::default()
        };
        let server = generator.create_server(None, None, &config);
        assert!(server.public_net.ipv4.is_none());
        assert!(server.public_net.ipv6.is_some());
    }

    #[test]
    fn backups_apply_the_default_window() {
        let (generator, _) = generator();
        let config = CreateConfig {
            backups: true,
            ..Default::default()
        };
        let server = generator.create_server(None, None, &config);
        assert_eq!(server.backup_window.as_deref(), Some("22-02"));

        let off = generator.create_server(None, None, &CreateConfig::default());
        assert_eq!(off.backup_window, None);
    }

    #[test]
    fn created_ids_are_unique() {
        let (generator, _) = generator();
        let a = generator.create_server(None, None, &CreateConfig::default());
        let b = generator.create_server(None, None, &CreateConfig::default());
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn templates_get_sequential_synthetic_ids() {
        let types = vec![server_type("cx22", 2, 4.0), server_type("cpx31", 4, 8.0)];
        let templates = ResourceGenerator::transform_server_types_to_servers(&types);

        assert_eq!(templates.len(), 2);
        assert_eq!(templates[0].id, TEMPLATE_ID_BASE);
        assert_eq!(templates[1].id, TEMPLATE_ID_BASE + 1);
        assert!(templates.iter().all(|t| t.status == ServerStatus::Available));
        assert!(templates.iter().all(|t| t.datacenter.is_none() && t.image.is_none()));
    }

    #[test]
    fn random_addresses_have_the_right_shape() {
        let v4 = random_ipv4();
        let octets: Vec<u16> = v4.split('.').map(|o| o.parse().unwrap()).collect();
        assert_eq!(octets.len(), 4);
        assert!(octets[0] >= 1);
        assert!(octets.iter().all(|&o| o <= 255));

        let v6 = random_ipv6();
        let groups: Vec<&str> = v6.split(':').collect();
        assert_eq!(groups.len(), 8);
        assert!(groups.iter().all(|g| u32::from_str_radix(g, 16).unwrap() <= 0xffff));
    }
}
