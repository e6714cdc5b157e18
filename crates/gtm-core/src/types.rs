//! Core GTM domain types.
//!
//! This module enumerates the management endpoints the client talks to and
//! the virtual server pair shared by configuration and request payloads.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Header carrying the session token on every management request.
pub const AUTH_TOKEN_HEADER: &str = "X-F5-Auth-Token";

/// Management endpoints used by the provisioning client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GtmEndpoint {
    /// Token login
    Login,
    /// GTM server collection
    Servers,
    /// GTM pools of type A
    PoolsA,
    /// GTM wide-IPs of type A
    WideIpsA,
}

impl GtmEndpoint {
    /// Returns the path of the endpoint relative to the device host.
    #[must_use]
    pub const fn path(&self) -> &'static str {
        match self {
            Self::Login => "/mgmt/shared/authn/login",
            Self::Servers => "/mgmt/tm/gtm/server",
            Self::PoolsA => "/mgmt/tm/gtm/pool/a",
            Self::WideIpsA => "/mgmt/tm/gtm/wideip/a",
        }
    }
}

impl fmt::Display for GtmEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

/// A virtual server on a managed server: a name plus an `ip:port` destination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VirtualServer {
    /// Virtual server name, e.g. `vs_1.1.2.1:80`
    pub name: String,
    /// Destination `ip:port`
    pub destination: String,
}

impl VirtualServer {
    /// Create a new virtual server pair.
    #[must_use]
    pub fn new(name: impl Into<String>, destination: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            destination: destination.into(),
        }
    }
}

/// Parses `name=destination`.
///
/// Both halves may contain `:`, so the first `=` is the separator.
impl FromStr for VirtualServer {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let (name, destination) = s.trim().split_once('=').ok_or_else(|| {
            Error::ConfigError(format!(
                "Invalid virtual server `{s}`: expected `name=destination`"
            ))
        })?;

        let (name, destination) = (name.trim(), destination.trim());
        if name.is_empty() || destination.is_empty() {
            return Err(Error::ConfigError(format!(
                "Invalid virtual server `{s}`: name and destination must be non-empty"
            )));
        }

        Ok(Self::new(name, destination))
    }
}
