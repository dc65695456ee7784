//! Host module registry.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::types::{Error, Result};

/// A module the host application can look up by name.
pub trait NativeModule: Send + Sync + fmt::Debug {
    /// Lookup name, unique within a host context.
    fn name(&self) -> &str;

    /// Event names this module may emit on the host bus.
    fn supported_events(&self) -> &[&'static str] {
        &[]
    }
}

/// Name → module map owned by a host context.
#[derive(Debug, Default)]
pub struct ModuleRegistry {
    modules: HashMap<String, Arc<dyn NativeModule>>,
}

impl ModuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a module. Names are unique.
    pub fn register(&mut self, module: Arc<dyn NativeModule>) -> Result<()> {
        let name = module.name().to_string();
        if self.modules.contains_key(&name) {
            return Err(Error::validation(format!(
                "module already registered: {name}"
            )));
        }
        tracing::debug!(module = %name, "module registered");
        self.modules.insert(name, module);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn NativeModule>> {
        self.modules.get(name).cloned()
    }

    /// Whether any registered module declares `event_name`.
    pub fn supports_event(&self, event_name: &str) -> bool {
        self.modules
            .values()
            .any(|m| m.supported_events().contains(&event_name))
    }

    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.modules.keys().cloned().collect();
        names.sort();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Telemetry;

    impl NativeModule for Telemetry {
        fn name(&self) -> &str {
            "Telemetry"
        }

        fn supported_events(&self) -> &[&'static str] {
            &["TelemetrySample"]
        }
    }

    #[derive(Debug)]
    struct Silent;

    impl NativeModule for Silent {
        fn name(&self) -> &str {
            "Silent"
        }
    }

    #[test]
    fn test_register_and_lookup() {
        let mut registry = ModuleRegistry::new();
        registry.register(Arc::new(Telemetry)).unwrap();
        registry.register(Arc::new(Silent)).unwrap();

        assert_eq!(registry.get("Telemetry").unwrap().name(), "Telemetry");
        assert!(registry.get("Missing").is_none());
        assert_eq!(registry.names(), vec!["Silent", "Telemetry"]);
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let mut registry = ModuleRegistry::new();
        registry.register(Arc::new(Telemetry)).unwrap();

        let err = registry.register(Arc::new(Telemetry)).unwrap_err();
        assert!(err.to_string().contains("already registered"));
    }

    #[test]
    fn test_supports_event() {
        let mut registry = ModuleRegistry::new();
        registry.register(Arc::new(Silent)).unwrap();
        assert!(!registry.supports_event("TelemetrySample"));

        registry.register(Arc::new(Telemetry)).unwrap();
        assert!(registry.supports_event("TelemetrySample"));
    }
}
