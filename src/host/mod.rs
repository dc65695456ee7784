//! Host application context.
//!
//! A [`HostContext`] stands for one running host (one engine view). It owns
//! the event bus listeners subscribe to, the module registry, the dispatch
//! loop, and the [`UnityMessageReceiver`] relay bound to it. Creating a
//! context binds its relay in a [`Registry`]; destroying or dropping the
//! context unbinds it.

mod dispatch;
mod modules;

pub use dispatch::Dispatcher;
pub use modules::{ModuleRegistry, NativeModule};

use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use tokio::runtime::Handle;

use crate::commbus::{Event, EventBus};
use crate::relay::{Registry, UnityMessageReceiver};
use crate::types::{Config, ContextId, Error, Result};

/// One live host application context.
#[derive(Debug)]
pub struct HostContext {
    id: ContextId,
    config: Config,
    bus: Arc<EventBus>,
    dispatcher: Dispatcher,
    modules: RwLock<ModuleRegistry>,
    relay: Arc<UnityMessageReceiver>,
    registry: Arc<Registry>,
    destroyed: AtomicBool,
}

impl HostContext {
    /// Create a context bound in the process-wide [`Registry::global`].
    ///
    /// Must be called from within a tokio runtime; the dispatch loop is
    /// spawned on it.
    pub fn new(config: Config) -> Result<Arc<Self>> {
        Self::with_registry(config, Registry::global())
    }

    /// Create a context bound in `registry`.
    pub fn with_registry(config: Config, registry: Arc<Registry>) -> Result<Arc<Self>> {
        let runtime = Handle::try_current().map_err(|_| {
            Error::internal("host context must be created inside a tokio runtime")
        })?;

        let id = ContextId::new();
        let bus = Arc::new(EventBus::new());
        let dispatcher = Dispatcher::spawn(
            &runtime,
            id.clone(),
            bus.clone(),
            config.relay.drain_on_shutdown,
        );

        let host = Arc::new_cyclic(|weak| {
            let relay = Arc::new(UnityMessageReceiver::new(id.clone(), weak.clone()));

            Self {
                id,
                config,
                bus,
                dispatcher,
                modules: RwLock::new(ModuleRegistry::new()),
                relay,
                registry,
                destroyed: AtomicBool::new(false),
            }
        });

        host.register_module(host.relay.clone())?;
        host.registry
            .bind(host.relay.clone(), host.config.relay.make_current_on_bind);
        tracing::info!(context = %host.id, "host context created");

        Ok(host)
    }

    pub fn id(&self) -> &ContextId {
        &self.id
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The bus application listeners subscribe to.
    pub fn bus(&self) -> Arc<EventBus> {
        self.bus.clone()
    }

    /// The relay bound to this context.
    pub fn relay(&self) -> Arc<UnityMessageReceiver> {
        self.relay.clone()
    }

    pub fn register_module(&self, module: Arc<dyn NativeModule>) -> Result<()> {
        self.modules
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .register(module)
    }

    /// Look up a module by name.
    pub fn module(&self, name: &str) -> Result<Arc<dyn NativeModule>> {
        self.modules
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .ok_or_else(|| Error::not_found(format!("module {name}")))
    }

    pub fn module_names(&self) -> Vec<String> {
        self.modules
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .names()
    }

    /// Hand an event to the dispatch loop.
    ///
    /// Callable from any thread. Fails if the context is destroyed, if the
    /// event is not declared by any module (when enforced), or if the
    /// dispatch loop has stopped.
    pub fn emit(&self, event_name: &str, payload: Value) -> Result<()> {
        if self.is_destroyed() {
            return Err(Error::context_unavailable(format!(
                "host context {} is destroyed",
                self.id
            )));
        }

        if self.config.relay.enforce_supported_events && !self.supports_event(event_name) {
            return Err(Error::emission(format!(
                "event {event_name} is not declared by any registered module"
            )));
        }

        self.dispatcher
            .dispatch(Event::new(event_name, payload, self.id.as_str()))?;
        tracing::debug!(context = %self.id, event_name, "event dispatched");
        Ok(())
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed.load(Ordering::Acquire)
    }

    /// Whether events emitted now can reach the bus: the context is not
    /// destroyed and its dispatch loop is still accepting.
    pub fn can_dispatch(&self) -> bool {
        !self.is_destroyed() && self.dispatcher.is_open()
    }

    /// Tear the context down: the relay becomes unbound, it leaves the
    /// registry, and the dispatch loop is told to stop. Idempotent.
    pub fn destroy(&self) {
        if self.destroyed.swap(true, Ordering::AcqRel) {
            return;
        }
        self.registry.unbind(&self.id);
        self.dispatcher.shutdown();
        tracing::info!(context = %self.id, "host context destroyed");
    }

    /// [`HostContext::destroy`], then wait for the dispatch loop to finish
    /// within `relay.shutdown_timeout`.
    pub async fn shutdown(&self) -> Result<()> {
        self.destroy();
        self.dispatcher
            .join(self.config.relay.shutdown_timeout)
            .await
    }

    fn supports_event(&self, event_name: &str) -> bool {
        self.modules
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .supports_event(event_name)
    }
}

impl Drop for HostContext {
    fn drop(&mut self) {
        self.destroy();
    }
}
