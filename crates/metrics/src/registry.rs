use std::borrow::Cow;
use std::sync::{Arc, OnceLock, PoisonError, RwLock};

use prometheus_client::registry::Registry;

/// A prometheus registry shared between all the components of a node.
///
/// When a moniker is set, every metric registered through [`SharedRegistry::with_prefix`]
/// is labelled with it, so that several nodes can share one registry in tests.
#[derive(Clone, Debug)]
pub struct SharedRegistry {
    moniker: Option<String>,
    registry: Arc<RwLock<Registry>>,
}

impl SharedRegistry {
    pub fn new(registry: Registry, moniker: Option<String>) -> Self {
        Self {
            moniker,
            registry: Arc::new(RwLock::new(registry)),
        }
    }

    pub fn global() -> &'static Self {
        global_registry()
    }

    pub fn with_moniker(&self, moniker: impl Into<String>) -> Self {
        Self {
            moniker: Some(moniker.into()),
            registry: Arc::clone(&self.registry),
        }
    }

    pub fn with_prefix<A>(&self, prefix: impl AsRef<str>, f: impl FnOnce(&mut Registry) -> A) -> A {
        if let Some(moniker) = &self.moniker {
            self.write(|reg| {
                f(reg
                    .sub_registry_with_prefix(prefix)
                    .sub_registry_with_label((
                        Cow::Borrowed("moniker"),
                        Cow::Owned(moniker.to_string()),
                    )))
            })
        } else {
            self.write(|reg| f(reg.sub_registry_with_prefix(prefix)))
        }
    }

    /// Encode all the metrics of this registry in the prometheus text format.
    pub fn encode<W: core::fmt::Write>(&self, writer: &mut W) -> core::fmt::Result {
        self.read(|registry| prometheus_client::encoding::text::encode(writer, registry))
    }

    // A panic while holding the lock cannot leave the registry half-updated,
    // so a poisoned lock is still safe to use.
    fn read<A>(&self, f: impl FnOnce(&Registry) -> A) -> A {
        f(&self.registry.read().unwrap_or_else(PoisonError::into_inner))
    }

    fn write<A>(&self, f: impl FnOnce(&mut Registry) -> A) -> A {
        f(&mut self.registry.write().unwrap_or_else(PoisonError::into_inner))
    }
}

fn global_registry() -> &'static SharedRegistry {
    static REGISTRY: OnceLock<SharedRegistry> = OnceLock::new();
    REGISTRY.get_or_init(|| SharedRegistry::new(Registry::default(), None))
}

/// Encode the metrics of the global registry in the prometheus text format.
pub fn export<W: core::fmt::Write>(writer: &mut W) -> core::fmt::Result {
    SharedRegistry::global().encode(writer)
}
