//! Asynchronous GTM management client.

use crate::auth::{Authenticator, CachedTokenSource, TokenSource};
use crate::models::{
    GtmCollection, PoolDescriptor, ProvisionReport, ServerDescriptor, WideIpDescriptor,
};
use crate::Result;
use gtm_core::client::{build_http_client, build_request, endpoint_url, ClientConfig};
use gtm_core::{Error, GtmConfig, GtmDeployment, GtmEndpoint};
use reqwest::{Client, Method};
use serde::Serialize;
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{info, warn};

const USER_AGENT: &str = concat!("gtm-api/", env!("CARGO_PKG_VERSION"));

/// Builder for [`GtmClient`].
pub struct GtmClientBuilder {
    config: GtmConfig,
    http_config: ClientConfig,
    token_source: Option<Arc<dyn TokenSource>>,
}

impl GtmClientBuilder {
    /// Create a builder from a [`GtmConfig`].
    #[must_use]
    pub fn new(config: GtmConfig) -> Self {
        let http_config = config.client_config().with_user_agent(USER_AGENT);
        Self {
            config,
            http_config,
            token_source: None,
        }
    }

    /// Use a custom token source instead of logging in with the configured
    /// credentials.
    #[must_use]
    pub fn with_token_source(mut self, source: Arc<dyn TokenSource>) -> Self {
        self.token_source = Some(source);
        self
    }

    /// Build the client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client or the login URL cannot be built.
    pub fn build(self) -> Result<GtmClient> {
        let http = build_http_client(&self.http_config)?;
        let GtmConfig {
            host,
            credentials,
            reuse_token,
            deployment,
            ..
        } = self.config;

        let tokens = match self.token_source {
            Some(source) => source,
            None => {
                let auth: Arc<dyn TokenSource> =
                    Arc::new(Authenticator::new(http.clone(), &host, credentials)?);
                if reuse_token {
                    Arc::new(CachedTokenSource::new(auth))
                } else {
                    auth
                }
            }
        };

        Ok(GtmClient {
            http,
            host,
            tokens,
            deployment,
        })
    }
}

/// Asynchronous GTM client.
///
/// Every call asks the token source for a token first; with the default
/// source that is a fresh login per call.
#[derive(Clone)]
pub struct GtmClient {
    http: Client,
    host: String,
    tokens: Arc<dyn TokenSource>,
    deployment: GtmDeployment,
}

impl GtmClient {
    /// Construct a client directly from the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client or the login URL cannot be built.
    pub fn from_config(config: GtmConfig) -> Result<Self> {
        GtmClientBuilder::new(config).build()
    }

    /// Start a builder from the configuration.
    #[must_use]
    pub fn builder(config: GtmConfig) -> GtmClientBuilder {
        GtmClientBuilder::new(config)
    }

    /// Device host the client talks to.
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Deployment the create operations are derived from.
    #[must_use]
    pub fn deployment(&self) -> &GtmDeployment {
        &self.deployment
    }

    /// List GTM servers; each item is returned as raw JSON.
    pub async fn list_servers(&self) -> Result<Vec<Map<String, Value>>> {
        let text = self
            .send::<()>(Method::GET, GtmEndpoint::Servers, None)
            .await?;
        let collection: GtmCollection = serde_json::from_str(&text).map_err(|err| {
            Error::DecodeError(format!("Failed to decode server collection: {err}"))
        })?;
        Ok(collection.items)
    }

    /// Create the server with its address and virtual servers.
    pub async fn create_server(&self) -> Result<()> {
        let descriptor = ServerDescriptor::from_deployment(&self.deployment);
        self.send(Method::POST, GtmEndpoint::Servers, Some(&descriptor))
            .await
            .map(|_| ())
    }

    /// Create the A pool over the server's virtual servers.
    ///
    /// Returns the raw response body.
    pub async fn create_pool(&self) -> Result<String> {
        let descriptor = PoolDescriptor::from_deployment(&self.deployment);
        self.send(Method::POST, GtmEndpoint::PoolsA, Some(&descriptor))
            .await
    }

    /// Create the A wide-IP over the pool.
    ///
    /// Returns the raw response body.
    pub async fn create_wideip(&self) -> Result<String> {
        let descriptor = WideIpDescriptor::from_deployment(&self.deployment);
        self.send(Method::POST, GtmEndpoint::WideIpsA, Some(&descriptor))
            .await
    }

    /// Create server, pool and wide-IP in that order, stopping at the first
    /// error.
    pub async fn provision(&self) -> Result<ProvisionReport> {
        info!(
            server = %self.deployment.server_name,
            pool = %self.deployment.pool_name,
            domain = %self.deployment.domain,
            "Provisioning GTM deployment"
        );

        self.create_server().await?;
        let pool_response = self.create_pool().await?;
        let wideip_response = self.create_wideip().await?;

        Ok(ProvisionReport {
            pool_response,
            wideip_response,
        })
    }

    /// Send a request and return the body as text.
    ///
    /// Non-success statuses are logged but not turned into errors.
    async fn send<B>(&self, method: Method, endpoint: GtmEndpoint, body: Option<&B>) -> Result<String>
    where
        B: Serialize + ?Sized,
    {
        let token = self.tokens.token().await?;
        let url = endpoint_url(&self.host, endpoint)?;
        let request = build_request(&self.http, method.clone(), url, Some(&token.token), body)?;

        info!(%method, path = endpoint.path(), "Sending GTM request");

        let response = self.http.execute(request).await?;
        let status = response.status();
        if !status.is_success() {
            warn!(%method, path = endpoint.path(), %status, "GTM request returned non-success status");
        }

        response.text().await.map_err(Error::from)
    }
}
