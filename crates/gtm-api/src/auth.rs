//! Token-based authentication against the management API.
//!
//! [`Authenticator`] logs in on every call. [`CachedTokenSource`] wraps any
//! [`TokenSource`] and hands out the same token until shortly before the
//! device would expire it.

use crate::models::{AuthResponse, AuthToken, LoginRequest};
use crate::Result;
use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use gtm_core::client::{build_request, endpoint_url};
use gtm_core::{Credentials, Error, GtmEndpoint};
use reqwest::{Client, Method};
use secrecy::ExposeSecret;
use std::fmt;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use url::Url;

/// Lifetime assumed for tokens that do not report a timeout (seconds).
pub const DEFAULT_TOKEN_LIFETIME_SECS: i64 = 1200;

/// Longest lifetime the device grants a token (seconds).
pub const MAX_TOKEN_LIFETIME_SECS: i64 = 36_000;

/// How long before expiry a cached token is refreshed (seconds).
pub const TOKEN_REFRESH_MARGIN_SECS: i64 = 60;

/// Source of session tokens for management requests.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TokenSource: Send + Sync {
    /// Return a token valid for the next request.
    async fn token(&self) -> Result<AuthToken>;
}

/// Exchanges credentials for a session token.
#[derive(Debug)]
pub struct Authenticator {
    http: Client,
    login_url: Url,
    credentials: Credentials,
}

impl Authenticator {
    /// Create an authenticator for the given device host.
    ///
    /// # Errors
    ///
    /// Returns an error if the login URL cannot be built from `host`.
    pub fn new(http: Client, host: &str, credentials: Credentials) -> Result<Self> {
        Ok(Self {
            http,
            login_url: endpoint_url(host, GtmEndpoint::Login)?,
            credentials,
        })
    }

    /// Log in and return the token string.
    ///
    /// # Errors
    ///
    /// Transport failures, an undecodable response or an empty token.
    pub async fn authenticate(&self) -> Result<String> {
        self.login().await.map(|token| token.token)
    }

    /// Log in and return the full token.
    ///
    /// The HTTP status is not checked: a rejected login carries no token and
    /// surfaces as [`Error::EmptyToken`].
    ///
    /// # Errors
    ///
    /// Transport failures, an undecodable response or an empty token.
    pub async fn login(&self) -> Result<AuthToken> {
        let body = LoginRequest {
            username: &self.credentials.username,
            password: self.credentials.password.expose_secret(),
            login_provider_name: self.credentials.login_provider.as_deref(),
        };
        let request = build_request(
            &self.http,
            Method::POST,
            self.login_url.clone(),
            None,
            Some(&body),
        )?;

        info!(user = %self.credentials.username, "Requesting GTM auth token");

        let response = self.http.execute(request).await?;
        let status = response.status();
        let text = response.text().await?;

        let auth: AuthResponse = serde_json::from_str(&text).map_err(|err| {
            Error::DecodeError(format!("Failed to decode login response: {err}"))
        })?;

        if auth.token.token.is_empty() {
            if !status.is_success() {
                warn!(%status, "GTM login rejected");
            }
            return Err(Error::EmptyToken);
        }

        debug!(provider = %auth.token.auth_provider_name, "GTM auth token issued");
        Ok(auth.token)
    }
}

#[async_trait]
impl TokenSource for Authenticator {
    async fn token(&self) -> Result<AuthToken> {
        self.login().await
    }
}

struct CachedToken {
    token: AuthToken,
    refresh_at: DateTime<Utc>,
}

/// Reuses a token from an inner source until it is close to expiry.
///
/// A token is refreshed [`TOKEN_REFRESH_MARGIN_SECS`] before its reported
/// `timeout` elapses, or before [`DEFAULT_TOKEN_LIFETIME_SECS`] when the
/// device reports none.
pub struct CachedTokenSource {
    inner: Arc<dyn TokenSource>,
    cached: Mutex<Option<CachedToken>>,
}

impl CachedTokenSource {
    /// Wrap a token source.
    #[must_use]
    pub fn new(inner: Arc<dyn TokenSource>) -> Self {
        Self {
            inner,
            cached: Mutex::new(None),
        }
    }

    /// Drop the cached token so the next call fetches a fresh one.
    pub async fn invalidate(&self) {
        self.cached.lock().await.take();
    }

    fn refresh_at(token: &AuthToken, issued_at: DateTime<Utc>) -> DateTime<Utc> {
        let lifetime = token.timeout.map_or(DEFAULT_TOKEN_LIFETIME_SECS, |secs| {
            i64::try_from(secs).map_or(MAX_TOKEN_LIFETIME_SECS, |secs| {
                secs.min(MAX_TOKEN_LIFETIME_SECS)
            })
        });
        issued_at + TimeDelta::seconds(lifetime - TOKEN_REFRESH_MARGIN_SECS)
    }
}

// The cached token itself is never printed.
impl fmt::Debug for CachedTokenSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let refresh_at = self
            .cached
            .try_lock()
            .ok()
            .and_then(|cached| cached.as_ref().map(|entry| entry.refresh_at));
        f.debug_struct("CachedTokenSource")
            .field("refresh_at", &refresh_at)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl TokenSource for CachedTokenSource {
    async fn token(&self) -> Result<AuthToken> {
        let mut cached = self.cached.lock().await;

        if let Some(entry) = cached.as_ref() {
            if Utc::now() < entry.refresh_at {
                debug!("Reusing cached GTM auth token");
                return Ok(entry.token.clone());
            }
        }

        let token = self.inner.token().await?;
        *cached = Some(CachedToken {
            refresh_at: Self::refresh_at(&token, Utc::now()),
            token: token.clone(),
        });
        Ok(token)
    }
}
