//! Storage keys and the resource-kind enumeration.
//!
//! Keys are stable across reloads: the UI relies on finding the same data
//! under the same key in a later session.

/// Servers the user created locally, kept apart from the
/// provider-supplied collection. Unprefixed for historical reasons.
pub const USER_SERVERS: &str = "user-servers";

/// Active API mode. Lives in the persistent store so it survives reloads,
/// unlike every resource collection.
pub const API_MODE: &str = "api-mode";

/// Bearer token for the live API. Persistent, like the mode.
pub const API_TOKEN: &str = "api-token";

/// Firewall ids selected in the creation wizard, the only wizard state
/// that survives beyond a session.
pub const WIZARD_FIREWALLS: &str = "wizard-firewalls";

/// Every resource collection the console caches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Servers,
    ServerTypes,
    Locations,
    Datacenters,
    Images,
    Firewalls,
    Actions,
    FloatingIps,
    LoadBalancers,
    Networks,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 10] = [
        Self::Servers,
        Self::ServerTypes,
        Self::Locations,
        Self::Datacenters,
        Self::Images,
        Self::Firewalls,
        Self::Actions,
        Self::FloatingIps,
        Self::LoadBalancers,
        Self::Networks,
    ];

    /// Storage key for the provider-supplied collection of this kind.
    pub fn storage_key(&self) -> &'static str {
        match self {
            Self::Servers => "servers",
            Self::ServerTypes => "server-types",
            Self::Locations => "locations",
            Self::Datacenters => "datacenters",
            Self::Images => "images",
            Self::Firewalls => "firewalls",
            Self::Actions => "actions",
            Self::FloatingIps => "floating-ips",
            Self::LoadBalancers => "load-balancers",
            Self::Networks => "networks",
        }
    }

    /// Path segment under the API base (and the mock fixture file stem).
    pub fn api_path(&self) -> &'static str {
        match self {
            Self::Servers => "servers",
            Self::ServerTypes => "server_types",
            Self::Locations => "locations",
            Self::Datacenters => "datacenters",
            Self::Images => "images",
            Self::Firewalls => "firewalls",
            Self::Actions => "actions",
            Self::FloatingIps => "floating_ips",
            Self::LoadBalancers => "load_balancers",
            Self::Networks => "networks",
        }
    }

    /// Field holding the collection in a list response envelope.
    /// Same spelling as the path segment (`{"servers": [...]}`).
    pub fn envelope_field(&self) -> &'static str {
        self.api_path()
    }

    /// Field holding a single record in a get-one response envelope.
    pub fn singular_field(&self) -> &'static str {
        match self {
            Self::Servers => "server",
            Self::ServerTypes => "server_type",
            Self::Locations => "location",
            Self::Datacenters => "datacenter",
            Self::Images => "image",
            Self::Firewalls => "firewall",
            Self::Actions => "action",
            Self::FloatingIps => "floating_ip",
            Self::LoadBalancers => "load_balancer",
            Self::Networks => "network",
        }
    }
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.storage_key())
    }
}
