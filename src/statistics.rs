//! Summary counters over a snapshot.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::data::{Package, SourceKind, UpdateStatus};

/// Counters derived from a snapshot. Computing them never touches the packages.
#[derive(Serialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct StatsSummary {
    pub total: usize,
    pub by_source: BTreeMap<SourceKind, usize>,
    pub updates_available: usize,
    pub sandboxed: usize,
    pub conflicts: usize,
}

impl StatsSummary {
    #[must_use]
    pub fn from_packages(packages: &[Package]) -> Self {
        let mut stats = StatsSummary {
            total: packages.len(),
            ..Default::default()
        };

        for pkg in packages {
            *stats.by_source.entry(pkg.source()).or_default() += 1;

            if pkg.update_status == UpdateStatus::UpdateAvailable {
                stats.updates_available += 1;
            }
            if pkg.sandboxed {
                stats.sandboxed += 1;
            }
            if pkg.has_conflict() {
                stats.conflicts += 1;
            }
        }

        stats
    }

    /// Count for one source, zero when absent.
    #[must_use]
    pub fn count_for(&self, source: SourceKind) -> usize {
        self.by_source.get(&source).copied().unwrap_or(0)
    }
}
