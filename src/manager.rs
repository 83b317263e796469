//! The orchestrator: owns the snapshot and routes every operation to its adapter.

use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::batch::{BatchResult, BatchRunner};
use crate::conflicts::detect_conflicts;
use crate::data::{Package, SourceKind, UpdateStatus};
use crate::errors::{OrbitError, Result};
use crate::registry::AdapterRegistry;
use crate::statistics::StatsSummary;

/// Availability of one registered source, for diagnostics.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct SourceStatus {
    pub source: SourceKind,
    pub available: bool,
    pub supports_install: bool,
}

/// Aggregates every registered source behind one interface.
///
/// Calls are blocking and sequential. The manager holds no locks, so callers that share it
/// across threads must serialize access themselves.
pub struct OrbitManager {
    registry: AdapterRegistry,
    snapshot: Option<Vec<Package>>,
}

impl OrbitManager {
    pub fn new(registry: AdapterRegistry) -> Self {
        OrbitManager {
            registry,
            snapshot: None,
        }
    }

    pub fn registry(&self) -> &AdapterRegistry {
        &self.registry
    }

    /// Lists every source, merges the results and annotates name conflicts.
    ///
    /// A source that fails contributes nothing. The merged list is sorted by name,
    /// ignoring case; equal names keep registration order.
    pub fn refresh(&mut self) -> &[Package] {
        info!(sources = self.registry.len(), "Refreshing installed packages");
        let mut packages = Vec::new();

        for adapter in self.registry.all() {
            let source = adapter.source();
            match adapter.list_installed() {
                Ok(found) => {
                    debug!(source = %source, count = found.len(), "Source listed");
                    packages.extend(found);
                }
                Err(e) => {
                    error!(
                        source = %source,
                        category = e.category(),
                        error = %e,
                        "Source failed to list packages"
                    );
                }
            }
        }

        packages.sort_by_key(|pkg| pkg.name.to_lowercase());
        let conflicts = detect_conflicts(&mut packages);
        info!(count = packages.len(), conflicts, "Refresh complete");

        self.snapshot.insert(packages)
    }

    /// The current snapshot, refreshing first if there is none yet.
    pub fn snapshot(&mut self) -> &[Package] {
        if self.snapshot.is_none() {
            self.refresh();
        }
        self.snapshot.as_deref().unwrap_or_default()
    }

    /// The current snapshot without triggering a refresh.
    pub fn cached(&self) -> Option<&[Package]> {
        self.snapshot.as_deref()
    }

    /// Searches one source, or all of them in registration order.
    pub fn search(&self, query: &str, source: Option<SourceKind>) -> Vec<Package> {
        let adapters: Vec<_> = match source {
            Some(kind) => self.registry.get(kind).into_iter().collect(),
            None => self.registry.all().collect(),
        };

        let mut results = Vec::new();
        for adapter in adapters {
            match adapter.search(query) {
                Ok(found) => {
                    debug!(source = %adapter.source(), query, count = found.len(), "Source searched");
                    results.extend(found);
                }
                Err(e) => {
                    error!(source = %adapter.source(), query, error = %e, "Source failed to search");
                }
            }
        }
        info!(query, count = results.len(), "Search complete");
        results
    }

    /// Upgrades one package through the source that owns it.
    ///
    /// `Ok(false)` when the source is not registered or the tool failed; `Err` only for
    /// [`OrbitError::Operation`].
    pub fn update(&self, package: &Package) -> Result<bool> {
        let Some(adapter) = self.registry.get(package.source()) else {
            warn!(package = %package, "No adapter registered for source");
            return Ok(false);
        };
        let outcome = adapter
            .update(&package.id)
            .map_err(|e| OrbitError::operation("update", &package.id, e))?;
        Self::log_outcome("update", package, outcome);
        Ok(outcome)
    }

    pub fn remove(&self, package: &Package) -> Result<bool> {
        let Some(adapter) = self.registry.get(package.source()) else {
            warn!(package = %package, "No adapter registered for source");
            return Ok(false);
        };
        let outcome = adapter
            .remove(&package.id)
            .map_err(|e| OrbitError::operation("remove", &package.id, e))?;
        Self::log_outcome("remove", package, outcome);
        Ok(outcome)
    }

    /// Installs a catalog package. Sources without an install capability return `Ok(false)`
    /// without running anything.
    pub fn install(&self, package: &Package) -> Result<bool> {
        let Some(installer) = self
            .registry
            .get(package.source())
            .and_then(|adapter| adapter.installer())
        else {
            warn!(package = %package, "Source cannot install packages");
            return Ok(false);
        };
        let outcome = installer
            .install(&package.id)
            .map_err(|e| OrbitError::operation("install", &package.id, e))?;
        Self::log_outcome("install", package, outcome);
        Ok(outcome)
    }

    /// Fills optional fields of `package` from its source. Lookup failures leave it as is.
    pub fn details(&self, package: &mut Package) {
        let Some(adapter) = self.registry.get(package.source()) else {
            return;
        };
        if let Err(e) = adapter.get_details(package) {
            warn!(package = %package, error = %e, "Failed to load package details");
        }
    }

    /// Updates every snapshot package marked [`UpdateStatus::UpdateAvailable`].
    ///
    /// Uses the snapshot as it is; without a snapshot there is nothing to update.
    pub fn update_all(&self, mut runner: BatchRunner<'_>) -> BatchResult {
        let pending: Vec<Package> = self
            .cached()
            .unwrap_or_default()
            .iter()
            .filter(|pkg| pkg.update_status == UpdateStatus::UpdateAvailable)
            .cloned()
            .collect();
        runner.run("update", &pending, |pkg| self.update(pkg))
    }

    /// Removes the given packages one after another.
    pub fn remove_multiple(&self, packages: &[Package], mut runner: BatchRunner<'_>) -> BatchResult {
        runner.run("remove", packages, |pkg| self.remove(pkg))
    }

    /// Counters over the current snapshot; empty when there is none.
    pub fn statistics(&self) -> StatsSummary {
        StatsSummary::from_packages(self.cached().unwrap_or_default())
    }

    /// Registered sources and whether their tools are present.
    pub fn sources(&self) -> Vec<SourceStatus> {
        self.registry
            .all()
            .map(|adapter| SourceStatus {
                source: adapter.source(),
                available: adapter.is_available(),
                supports_install: adapter.supports_install(),
            })
            .collect()
    }

    fn log_outcome(action: &str, package: &Package, success: bool) {
        if success {
            info!(action, package = %package, "Operation succeeded");
        } else {
            warn!(action, package = %package, "Operation failed");
        }
    }
}
