//! # Unity Message Relay
//!
//! Forwards text messages from an embedded Unity runtime to the host
//! application as `"UnityMessage"` events, so application code can react to
//! engine signals without linking against the engine.
//!
//! - Relay module `"UnityMessageReceiver"` with a single inbound call
//! - Host context owning the event bus, module registry and dispatch loop
//! - Process-wide registry so engine-native code can find the live relay
//! - C ABI entry points for engine plugins
//! - Listener helper for application code
//!
//! ## Architecture
//!
//! ```text
//!   engine thread                     host runtime
//!  ┌────────────┐   ┌──────────┐    ┌─────────────────────────────┐
//!  │ C ABI /    │──▶│ Registry │──▶ │ UnityMessageReceiver        │
//!  │ direct call│   └──────────┘    │   │ emit("UnityMessage")    │
//!  └────────────┘                   │   ▼                         │
//!                                   │ Dispatcher ─▶ EventBus ─▶ listeners
//!                                   └─────────────────────────────┘
//! ```

// Enforce strict safety at compile time
#![deny(unsafe_code)]
#![warn(missing_debug_implementations)]
#![warn(rust_2018_idioms)]

pub mod commbus;
pub mod host;
pub mod listener;
pub mod relay;
pub mod types;

#[allow(unsafe_code)]
pub mod ffi;

// Internal utilities
pub mod observability;

pub use host::HostContext;
pub use listener::MessageListener;
pub use relay::{EventPayload, Registry, RelayState, UnityMessageReceiver, EVENT_NAME, MODULE_NAME};
pub use types::{Config, Error, Result};
