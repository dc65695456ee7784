//! Core types for the relay.
//!
//! This module provides foundational types used throughout the crate:
//! - **IDs**: Strongly-typed identifiers (ContextId, SubscriptionId)
//! - **Errors**: Application error types with thiserror derives
//! - **Config**: Configuration structures for observability and relay dispatch

mod config;
mod errors;
mod ids;

pub use config::{Config, ObservabilityConfig, RelayConfig};
pub use errors::{status, Error, Result};
pub use ids::{ContextId, SubscriptionId};
