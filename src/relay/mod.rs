//! Engine → host message relay.
//!
//! [`UnityMessageReceiver`] is the module the engine side calls into. Each
//! call wraps the text in an [`EventPayload`] and emits it on the owning host
//! context as the `"UnityMessage"` event. The relay never inspects, splits or
//! rewrites the text.
//!
//! The relay holds only a weak back-reference to its host: it never keeps a
//! torn-down context alive, and a call that arrives after teardown fails with
//! [`Error::ContextUnavailable`] instead of being dropped.

pub mod registry;

use serde::{Deserialize, Serialize};
use std::sync::{Arc, Weak};

use crate::host::{HostContext, NativeModule};
use crate::types::{ContextId, Error, Result};

pub use registry::Registry;

/// Name under which the relay is registered in the host module registry.
pub const MODULE_NAME: &str = "UnityMessageReceiver";

/// Event name the relay emits on the host bus.
pub const EVENT_NAME: &str = "UnityMessage";

/// Payload of a `"UnityMessage"` event: `{ "message": <text> }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventPayload {
    pub message: String,
}

/// Whether a relay can currently reach its host context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RelayState {
    Bound,
    Unbound,
}

/// Adapter that turns engine calls into host events.
#[derive(Debug)]
pub struct UnityMessageReceiver {
    context_id: ContextId,
    host: Weak<HostContext>,
}

impl UnityMessageReceiver {
    pub(crate) fn new(context_id: ContextId, host: Weak<HostContext>) -> Self {
        Self { context_id, host }
    }

    /// Module identity, constant for the life of the process.
    pub fn name(&self) -> &'static str {
        MODULE_NAME
    }

    /// Context this relay was created for.
    pub fn context_id(&self) -> &ContextId {
        &self.context_id
    }

    /// `Bound` only while calls can succeed: the host is alive, not
    /// destroyed, and its dispatch loop is still running.
    pub fn state(&self) -> RelayState {
        if self.live_host().is_some_and(|host| host.can_dispatch()) {
            RelayState::Bound
        } else {
            RelayState::Unbound
        }
    }

    pub fn is_bound(&self) -> bool {
        self.state() == RelayState::Bound
    }

    /// Forward one engine message to the host as a `"UnityMessage"` event.
    ///
    /// Safe to call from any thread. Returns once the event has been handed
    /// to the host's dispatcher; listeners are notified on the host runtime.
    pub fn on_engine_message(&self, message: &str) -> Result<()> {
        let Some(host) = self.live_host() else {
            tracing::warn!(
                context = %self.context_id,
                len = message.len(),
                "engine message arrived after host context was torn down"
            );
            return Err(Error::context_unavailable(format!(
                "relay for context {} is not bound",
                self.context_id
            )));
        };

        let payload = serde_json::to_value(EventPayload {
            message: message.to_owned(),
        })?;

        host.emit(EVENT_NAME, payload).map_err(|err| {
            tracing::error!(context = %self.context_id, error = %err, "failed to relay engine message");
            err
        })?;

        tracing::trace!(context = %self.context_id, len = message.len(), "relayed engine message");
        Ok(())
    }

    fn live_host(&self) -> Option<Arc<HostContext>> {
        self.host.upgrade().filter(|host| !host.is_destroyed())
    }
}

impl NativeModule for UnityMessageReceiver {
    fn name(&self) -> &str {
        MODULE_NAME
    }

    fn supported_events(&self) -> &[&'static str] {
        &[EVENT_NAME]
    }
}
