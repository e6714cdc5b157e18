//! Configuration structures for GTM clients.
//!
//! A [`GtmConfig`] carries everything that used to be fixed at build time:
//! where the device lives, how to log in to it, how the transport behaves,
//! and the [`GtmDeployment`] that the server, pool and wide-IP payloads are
//! derived from. It can be loaded from environment variables or a JSON file.

use crate::client::ClientConfig;
use crate::types::VirtualServer;
use crate::{Error, Result};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use validator::Validate;

/// Environment variable holding the device base URL.
pub const ENV_HOST: &str = "GTM_HOST";
/// Environment variable holding the login username.
pub const ENV_USERNAME: &str = "GTM_USERNAME";
/// Environment variable holding the login password.
pub const ENV_PASSWORD: &str = "GTM_PASSWORD";
/// Environment variable holding the optional login provider name.
pub const ENV_LOGIN_PROVIDER: &str = "GTM_LOGIN_PROVIDER";
/// Environment variable opting out of TLS certificate verification.
pub const ENV_INSECURE_SKIP_TLS_VERIFY: &str = "GTM_INSECURE_SKIP_TLS_VERIFY";
/// Environment variable holding the request timeout in seconds.
pub const ENV_TIMEOUT_SECS: &str = "GTM_TIMEOUT_SECS";
/// Environment variable enabling token reuse across calls.
pub const ENV_REUSE_TOKEN: &str = "GTM_REUSE_TOKEN";

/// Login credentials for the management API.
#[derive(Debug, Deserialize, Validate)]
pub struct Credentials {
    /// Login username
    #[validate(length(min = 1))]
    pub username: String,

    /// Login password
    pub password: SecretString,

    /// Optional authentication provider (sent as `loginProviderName`)
    #[serde(default)]
    pub login_provider: Option<String>,
}

impl Credentials {
    /// Create new credentials.
    #[must_use]
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        let password: String = password.into();
        Self {
            username: username.into(),
            password: SecretString::from(password),
            login_provider: None,
        }
    }

    /// Set the login provider name.
    #[must_use]
    pub fn with_login_provider(mut self, provider: impl Into<String>) -> Self {
        self.login_provider = Some(provider.into());
        self
    }
}

/// Description of the objects provisioned on the device.
///
/// `Default` yields the demo deployment: one generic host with two virtual
/// servers, one pool over them and one wide-IP over the pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GtmDeployment {
    /// Datacenter the server belongs to
    pub datacenter: String,
    /// Server product type
    pub product: String,
    /// Health monitor reference
    pub monitor: String,
    /// Administrative partition
    pub partition: String,
    /// Load-balancing mode used for pools and wide-IPs
    pub load_balancing_mode: String,
    /// Wide-IP domain name
    pub domain: String,
    /// Server object name
    pub server_name: String,
    /// Pool name
    pub pool_name: String,
    /// Server address
    pub ip: String,
    /// DNS TTL in seconds
    pub ttl: u32,
    /// Virtual servers on the server
    pub virtual_servers: Vec<VirtualServer>,
    /// Wide-IP description; derived from the domain when absent
    pub wideip_description: Option<String>,
}

impl Default for GtmDeployment {
    fn default() -> Self {
        Self {
            datacenter: "DATACENTER_NAME".to_string(),
            product: "generic-host".to_string(),
            monitor: "/Common/tcp".to_string(),
            partition: "Common".to_string(),
            load_balancing_mode: "round-robin".to_string(),
            domain: "demo.com".to_string(),
            server_name: "server_1.1.2.1".to_string(),
            pool_name: "pool_demo.com".to_string(),
            ip: "1.1.2.1".to_string(),
            ttl: 30,
            virtual_servers: vec![
                VirtualServer::new("vs_1.1.2.1:80", "1.1.2.1:80"),
                VirtualServer::new("vs_1.1.2.1:81", "1.1.2.1:81"),
            ],
            wideip_description: None,
        }
    }
}

impl GtmDeployment {
    /// Wide-IP description, falling back to `"<domain>'s description"`.
    #[must_use]
    pub fn wideip_description(&self) -> String {
        self.wideip_description
            .clone()
            .unwrap_or_else(|| format!("{}'s description", self.domain))
    }

    /// Pool member references, one `server:virtual-server` key per virtual server.
    #[must_use]
    pub fn pool_member_names(&self) -> Vec<String> {
        self.virtual_servers
            .iter()
            .map(|vs| format!("{}:{}", self.server_name, vs.name))
            .collect()
    }

    fn apply_lookup<F>(&mut self, lookup: &F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let strings: [(&str, &mut String); 9] = [
            ("GTM_DATACENTER", &mut self.datacenter),
            ("GTM_PRODUCT", &mut self.product),
            ("GTM_MONITOR", &mut self.monitor),
            ("GTM_PARTITION", &mut self.partition),
            ("GTM_LB_MODE", &mut self.load_balancing_mode),
            ("GTM_DOMAIN", &mut self.domain),
            ("GTM_SERVER_NAME", &mut self.server_name),
            ("GTM_POOL_NAME", &mut self.pool_name),
            ("GTM_IP", &mut self.ip),
        ];
        for (key, field) in strings {
            if let Some(value) = lookup(key) {
                *field = value;
            }
        }

        if let Some(ttl) = parse_var(lookup, "GTM_TTL")? {
            self.ttl = ttl;
        }

        if let Some(list) = lookup("GTM_VIRTUAL_SERVERS") {
            self.virtual_servers = list
                .split(',')
                .filter(|entry| !entry.trim().is_empty())
                .map(str::parse)
                .collect::<Result<Vec<VirtualServer>>>()?;
        }

        if let Some(description) = lookup("GTM_WIDEIP_DESCRIPTION") {
            self.wideip_description = Some(description);
        }

        Ok(())
    }
}

/// Configuration for a GTM client instance.
#[derive(Debug, Deserialize, Validate)]
pub struct GtmConfig {
    /// Device base URL, e.g. `https://gtm.example.com`
    #[validate(url)]
    pub host: String,

    /// Login credentials
    #[serde(flatten)]
    #[validate(nested)]
    pub credentials: Credentials,

    /// Skip TLS certificate verification. Accepts any server certificate.
    #[serde(default)]
    pub insecure_skip_tls_verify: bool,

    /// Request timeout in seconds; no timeout when absent
    #[validate(range(min = 1, max = 300))]
    #[serde(default)]
    pub timeout_secs: Option<u64>,

    /// Reuse one token across calls instead of logging in per call
    #[serde(default)]
    pub reuse_token: bool,

    /// Objects to provision
    #[serde(default)]
    pub deployment: GtmDeployment,
}

impl GtmConfig {
    /// Create a configuration with the demo deployment.
    ///
    /// # Errors
    ///
    /// Returns an error if the host is not a valid URL or validation fails.
    pub fn new(host: impl Into<String>, credentials: Credentials) -> Result<Self> {
        let config = Self {
            host: host.into(),
            credentials,
            insecure_skip_tls_verify: false,
            timeout_secs: None,
            reuse_token: false,
            deployment: GtmDeployment::default(),
        };

        config.validate()?;
        Ok(config)
    }

    /// Load the configuration from process environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if a required variable is missing or a value is invalid.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load the configuration from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Returns an error if a required key is missing or a value is invalid.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| {
            lookup(key)
                .ok_or_else(|| Error::ConfigError(format!("{key} environment variable is required")))
        };

        let mut credentials = Credentials::new(required(ENV_USERNAME)?, required(ENV_PASSWORD)?);
        credentials.login_provider = lookup(ENV_LOGIN_PROVIDER);

        let mut deployment = GtmDeployment::default();
        deployment.apply_lookup(&lookup)?;

        let config = Self {
            host: required(ENV_HOST)?,
            credentials,
            insecure_skip_tls_verify: parse_flag(&lookup, ENV_INSECURE_SKIP_TLS_VERIFY)?,
            timeout_secs: parse_var(&lookup, ENV_TIMEOUT_SECS)?,
            reuse_token: parse_flag(&lookup, ENV_REUSE_TOKEN)?,
            deployment,
        };

        config.validate()?;
        Ok(config)
    }

    /// Load the configuration from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed or validated.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|err| {
            Error::ConfigError(format!("Failed to read {}: {err}", path.display()))
        })?;
        Self::from_json_str(&contents)
    }

    /// Parse the configuration from a JSON document.
    ///
    /// # Errors
    ///
    /// Returns an error if the document is malformed or validation fails.
    pub fn from_json_str(contents: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(contents)
            .map_err(|err| Error::ConfigError(format!("Invalid configuration file: {err}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Opt out of TLS certificate verification.
    #[must_use]
    pub const fn with_insecure_skip_tls_verify(mut self, insecure: bool) -> Self {
        self.insecure_skip_tls_verify = insecure;
        self
    }

    /// Set request timeout in seconds.
    #[must_use]
    pub const fn with_timeout(mut self, seconds: u64) -> Self {
        self.timeout_secs = Some(seconds);
        self
    }

    /// Enable or disable token reuse.
    #[must_use]
    pub const fn with_reuse_token(mut self, reuse: bool) -> Self {
        self.reuse_token = reuse;
        self
    }

    /// Replace the deployment description.
    #[must_use]
    pub fn with_deployment(mut self, deployment: GtmDeployment) -> Self {
        self.deployment = deployment;
        self
    }

    /// Get the request timeout as a Duration.
    #[must_use]
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }

    /// HTTP client settings derived from this configuration.
    #[must_use]
    pub fn client_config(&self) -> ClientConfig {
        let config = ClientConfig::new().danger_accept_invalid_certs(self.insecure_skip_tls_verify);
        match self.timeout() {
            Some(timeout) => config.with_timeout(timeout),
            None => config,
        }
    }
}

fn parse_var<T, F>(lookup: &F, key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: Display,
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|value| {
            value
                .trim()
                .parse::<T>()
                .map_err(|err| Error::ConfigError(format!("Failed to parse {key}={value}: {err}")))
        })
        .transpose()
}

fn parse_flag<F>(lookup: &F, key: &str) -> Result<bool>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key).as_deref().map(str::trim) {
        None | Some("") => Ok(false),
        Some(v) if ["1", "true", "yes", "on"].iter().any(|t| v.eq_ignore_ascii_case(t)) => Ok(true),
        Some(v) if ["0", "false", "no", "off"].iter().any(|f| v.eq_ignore_ascii_case(f)) => Ok(false),
        Some(v) => Err(Error::ConfigError(format!(
            "Failed to parse {key}={v}: expected a boolean"
        ))),
    }
}
