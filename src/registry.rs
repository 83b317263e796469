//! The set of active package sources.

use std::sync::Arc;

use tracing::{debug, info};

use crate::configuration::OrbitConfig;
use crate::data::SourceKind;
use crate::invoker::ToolInvoker;
use crate::sources::{
    AppImageSource, AptSource, DnfSource, FlatpakSource, PackageAdapter, PacmanSource,
    SnapSource,
};

/// At most one adapter per [`SourceKind`], kept in registration order.
///
/// Registration order decides the order of packages with equal names after sorting, so it
/// is preserved rather than hashed away.
#[derive(Default)]
pub struct AdapterRegistry {
    adapters: Vec<Box<dyn PackageAdapter>>,
}

impl AdapterRegistry {
    pub fn new() -> Self {
        AdapterRegistry::default()
    }

    /// Registers every built-in source the configuration does not disable.
    pub fn with_defaults(config: &OrbitConfig, invoker: Arc<dyn ToolInvoker>) -> Self {
        let mut registry = AdapterRegistry::new();
        let privilege = config.privilege_command.as_str();

        for kind in SourceKind::ALL {
            if !config.is_source_enabled(kind) {
                info!(source = %kind, "Source disabled by configuration");
                continue;
            }
            let adapter: Box<dyn PackageAdapter> = match kind {
                SourceKind::Apt => Box::new(AptSource::new(invoker.clone(), privilege)),
                SourceKind::Flatpak => Box::new(FlatpakSource::new(invoker.clone())),
                SourceKind::Snap => Box::new(SnapSource::new(invoker.clone(), privilege)),
                SourceKind::AppImage => {
                    Box::new(AppImageSource::new(config.appimage_scan_dirs.clone()))
                }
                SourceKind::Pacman => Box::new(PacmanSource::new(invoker.clone(), privilege)),
                SourceKind::Dnf => Box::new(DnfSource::new(invoker.clone(), privilege)),
            };
            registry.register(adapter);
        }

        registry
    }

    /// Adds an adapter, replacing any adapter already registered for the same source.
    /// A replacement keeps the original position.
    pub fn register(&mut self, adapter: Box<dyn PackageAdapter>) {
        let source = adapter.source();
        match self.adapters.iter_mut().find(|a| a.source() == source) {
            Some(slot) => {
                debug!(source = %source, "Replacing registered adapter");
                *slot = adapter;
            }
            None => {
                debug!(source = %source, "Registered adapter");
                self.adapters.push(adapter);
            }
        }
    }

    pub fn get(&self, source: SourceKind) -> Option<&dyn PackageAdapter> {
        self.adapters
            .iter()
            .find(|a| a.source() == source)
            .map(|a| -> &dyn PackageAdapter { a.as_ref() })
    }

    /// Adapters in registration order.
    pub fn all(&self) -> impl Iterator<Item = &dyn PackageAdapter> {
        self.adapters
            .iter()
            .map(|a| -> &dyn PackageAdapter { a.as_ref() })
    }

    pub fn sources(&self) -> Vec<SourceKind> {
        self.adapters.iter().map(|a| a.source()).collect()
    }

    pub fn len(&self) -> usize {
        self.adapters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.adapters.is_empty()
    }
}
