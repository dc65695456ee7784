//! Process-wide lookup of live relays.
//!
//! Engine-native code does not take part in the host module system, so it
//! reaches the relay through this registry instead. Each host context binds
//! its own relay under its [`ContextId`]; one of them may also be the
//! *current* relay, used by callers that do not know a context id.
//!
//! Lookups only ever return relays whose host is still live. A stale entry
//! (host dropped without unbinding) is reported as not bound.

use std::collections::HashMap;
use std::sync::{Arc, OnceLock, PoisonError, RwLock};

use super::UnityMessageReceiver;
use crate::types::{ContextId, Error, Result};

static GLOBAL: OnceLock<Arc<Registry>> = OnceLock::new();

#[derive(Debug, Default)]
struct RegistryState {
    relays: HashMap<ContextId, Arc<UnityMessageReceiver>>,
    current: Option<ContextId>,
}

/// Registry of relays keyed by host context.
#[derive(Debug, Default)]
pub struct Registry {
    state: RwLock<RegistryState>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide registry used by [`crate::ffi`] and
    /// [`crate::host::HostContext::new`].
    pub fn global() -> Arc<Registry> {
        GLOBAL.get_or_init(|| Arc::new(Registry::new())).clone()
    }

    /// Record `relay` under its context id, optionally making it current.
    pub fn bind(&self, relay: Arc<UnityMessageReceiver>, make_current: bool) {
        let context_id = relay.context_id().clone();
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        state.relays.insert(context_id.clone(), relay);
        if make_current {
            state.current = Some(context_id.clone());
        }
        tracing::debug!(context = %context_id, make_current, "relay bound");
    }

    /// Remove the relay for `context_id`. Returns whether one was bound.
    ///
    /// Unbinding the current relay clears the current slot.
    pub fn unbind(&self, context_id: &ContextId) -> bool {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        let removed = state.relays.remove(context_id).is_some();
        if state.current.as_ref() == Some(context_id) {
            state.current = None;
        }
        if removed {
            tracing::debug!(context = %context_id, "relay unbound");
        }
        removed
    }

    /// Make an already bound relay the current one.
    pub fn set_current(&self, context_id: &ContextId) -> Result<()> {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        if !state.relays.contains_key(context_id) {
            return Err(Error::not_found(format!("no relay bound for context {context_id}")));
        }
        state.current = Some(context_id.clone());
        Ok(())
    }

    /// The current relay, if it is still bound to a live host.
    pub fn current(&self) -> Result<Arc<UnityMessageReceiver>> {
        let relay = {
            let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
            state
                .current
                .as_ref()
                .and_then(|id| state.relays.get(id))
                .cloned()
        };
        match relay {
            Some(relay) if relay.is_bound() => Ok(relay),
            _ => Err(Error::context_unavailable("no relay is bound")),
        }
    }

    /// The relay bound for `context_id`, if its host is still live.
    pub fn get(&self, context_id: &ContextId) -> Result<Arc<UnityMessageReceiver>> {
        let relay = self
            .state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .relays
            .get(context_id)
            .cloned();
        match relay {
            Some(relay) if relay.is_bound() => Ok(relay),
            _ => Err(Error::context_unavailable(format!(
                "no live relay for context {context_id}"
            ))),
        }
    }

    /// Context ids with a live relay.
    pub fn bound_contexts(&self) -> Vec<ContextId> {
        // Liveness is checked after the lock is released: upgrading a host
        // reference may end up running its Drop, which unbinds.
        let relays: Vec<_> = self
            .state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .relays
            .values()
            .cloned()
            .collect();
        relays
            .into_iter()
            .filter(|relay| relay.is_bound())
            .map(|relay| relay.context_id().clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.bound_contexts().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
