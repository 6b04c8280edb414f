//! # API Shared
//!
//! Shared utilities and definitions for HashVault APIs.
//!
//! Contains:
//! - Request and response bodies (`dto` module), serialised as camelCase JSON
//! - Shared services like `HealthService`
//! - API-key checking for routes that spend the server wallet's gas
//!
//! Used by `api-rest` on the server side and by the `hv` client.

pub mod auth;
pub mod dto;
pub mod health;

pub use dto::*;
pub use health::HealthService;
