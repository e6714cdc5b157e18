//! Request and response payloads for the GTM management API.

use gtm_core::{GtmDeployment, VirtualServer};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Session token returned by the login endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AuthToken {
    /// Opaque token value sent in the auth header.
    pub token: String,
    /// Token name.
    pub name: String,
    /// Owning user.
    pub user_name: String,
    /// Provider that issued the token.
    pub auth_provider_name: String,
    /// Lifetime in seconds, when the device reports one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,
}

impl AuthToken {
    /// Create a token with no metadata.
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            ..Self::default()
        }
    }
}

/// Login response envelope.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AuthResponse {
    /// Logged-in user.
    pub username: String,
    /// Provider used for the login.
    pub login_provider_name: String,
    /// Issued token.
    pub token: AuthToken,
}

/// Login request body.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest<'a> {
    /// Login username.
    pub username: &'a str,
    /// Login password.
    pub password: &'a str,
    /// Optional login provider.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub login_provider_name: Option<&'a str>,
}

/// Generic `{kind, items}` collection envelope.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct GtmCollection {
    /// Collection kind.
    pub kind: String,
    /// Collection items, left unmodelled.
    pub items: Vec<Map<String, Value>>,
}

/// Server address entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerAddress {
    /// IP address.
    pub name: String,
    /// Device name the address belongs to.
    pub device_name: String,
}

/// Payload for creating a GTM server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerDescriptor {
    /// Server name.
    pub name: String,
    /// Datacenter.
    pub datacenter: String,
    /// Product type.
    pub product: String,
    /// Health monitor.
    pub monitor: String,
    /// Addresses.
    pub addresses: Vec<ServerAddress>,
    /// Virtual servers.
    pub virtual_servers: Vec<VirtualServer>,
}

impl ServerDescriptor {
    /// Derive the server payload from a deployment.
    #[must_use]
    pub fn from_deployment(deployment: &GtmDeployment) -> Self {
        Self {
            name: deployment.server_name.clone(),
            datacenter: deployment.datacenter.clone(),
            product: deployment.product.clone(),
            monitor: deployment.monitor.clone(),
            addresses: vec![ServerAddress {
                name: deployment.ip.clone(),
                device_name: deployment.server_name.clone(),
            }],
            virtual_servers: deployment.virtual_servers.clone(),
        }
    }
}

/// `{name}` reference to another object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameRef {
    /// Referenced object name.
    pub name: String,
}

impl NameRef {
    /// Create a reference.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// Payload for creating an A-record pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolDescriptor {
    /// Pool name.
    pub name: String,
    /// Partition.
    pub partition: String,
    /// Health monitor.
    pub monitor: String,
    /// DNS TTL.
    pub ttl: u32,
    /// Fallback load-balancing mode.
    pub alternate_mode: String,
    /// Preferred load-balancing mode.
    pub load_balancing_mode: String,
    /// Members as `server:virtual-server` references.
    pub members: Vec<NameRef>,
}

impl PoolDescriptor {
    /// Derive the pool payload from a deployment.
    #[must_use]
    pub fn from_deployment(deployment: &GtmDeployment) -> Self {
        Self {
            name: deployment.pool_name.clone(),
            partition: deployment.partition.clone(),
            monitor: deployment.monitor.clone(),
            ttl: deployment.ttl,
            alternate_mode: deployment.load_balancing_mode.clone(),
            load_balancing_mode: deployment.load_balancing_mode.clone(),
            members: deployment
                .pool_member_names()
                .into_iter()
                .map(NameRef::new)
                .collect(),
        }
    }
}

/// Payload for creating an A-record wide-IP.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WideIpDescriptor {
    /// Domain name.
    pub name: String,
    /// Partition.
    pub partition: String,
    /// Pool selection mode.
    pub pool_lb_mode: String,
    /// DNS TTL.
    pub ttl: u32,
    /// Description.
    pub description: String,
    /// Pools behind the wide-IP.
    pub pools: Vec<NameRef>,
}

impl WideIpDescriptor {
    /// Derive the wide-IP payload from a deployment.
    #[must_use]
    pub fn from_deployment(deployment: &GtmDeployment) -> Self {
        Self {
            name: deployment.domain.clone(),
            partition: deployment.partition.clone(),
            pool_lb_mode: deployment.load_balancing_mode.clone(),
            ttl: deployment.ttl,
            description: deployment.wideip_description(),
            pools: vec![NameRef::new(deployment.pool_name.clone())],
        }
    }
}

/// Raw responses collected by one provisioning run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProvisionReport {
    /// Body returned by the pool creation call.
    pub pool_response: String,
    /// Body returned by the wide-IP creation call.
    pub wideip_response: String,
}
