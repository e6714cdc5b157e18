//! # gtm-core
//!
//! Core types and utilities for provisioning a Global Traffic Manager.
//!
//! This crate provides the error type, configuration and HTTP transport
//! helpers shared by the GTM management client.
//!
//! ## Modules
//!
//! - [`error`] - Error types and conversions
//! - [`types`] - Management endpoints and virtual server pairs
//! - [`config`] - Configuration loaded from the environment or a JSON file
//! - [`client`] - HTTP client construction and request building

#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod client;
pub mod config;
pub mod error;
pub mod types;

// Re-export commonly used types
pub use config::{Credentials, GtmConfig, GtmDeployment};
pub use error::{Error, Result};
pub use types::{GtmEndpoint, VirtualServer};
