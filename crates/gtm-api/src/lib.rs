//! GTM management client.
//!
//! Provides typed payloads and an asynchronous client that logs in to a
//! Global Traffic Manager and creates a server, an A pool and an A wide-IP
//! from a [`gtm_core::GtmDeployment`].

#![warn(missing_docs)]

pub mod auth;
pub mod client;
pub mod models;

pub use auth::{Authenticator, CachedTokenSource, TokenSource};
pub use client::{GtmClient, GtmClientBuilder};
pub use models::{
    AuthResponse, AuthToken, GtmCollection, NameRef, PoolDescriptor, ProvisionReport,
    ServerAddress, ServerDescriptor, WideIpDescriptor,
};

/// Convenient result alias that reuses the shared GTM error type.
pub type Result<T> = gtm_core::Result<T>;
