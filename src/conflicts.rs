//! Cross-source conflict detection.
//!
//! Two packages conflict when their display names are exactly equal (case-sensitive).
//! Conflicting packages stay in the snapshot; each one is annotated with the number of
//! other sources that carry the same name.

use std::collections::{BTreeMap, HashMap};

use tracing::warn;

use crate::data::Package;

/// Summary prefix written onto every member of a conflict group.
#[must_use]
pub fn conflict_warning(others: usize) -> String {
    if others == 1 {
        "⚠️ 1 other source provides an application with this name. ".to_string()
    } else {
        format!("⚠️ {others} other sources provide an application with this name. ")
    }
}

/// Annotates every package whose name is shared with another package.
///
/// Re-running on an already annotated set yields the same result. Returns the number of
/// conflict groups found.
pub fn detect_conflicts(packages: &mut [Package]) -> usize {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for pkg in packages.iter() {
        *counts.entry(pkg.name.clone()).or_default() += 1;
    }

    for pkg in packages.iter_mut() {
        let group = counts.get(&pkg.name).copied().unwrap_or(1);
        pkg.set_conflict((group > 1).then(|| group - 1));
    }

    let mut groups = 0;
    for (name, size) in counts.iter().filter(|(_, size)| **size > 1) {
        warn!(name = %name, sources = size, "Conflict detected");
        groups += 1;
    }
    groups
}

/// Groups conflicting packages by name, in name order.
#[must_use]
pub fn conflict_groups(packages: &[Package]) -> BTreeMap<&str, Vec<&Package>> {
    let mut groups: BTreeMap<&str, Vec<&Package>> = BTreeMap::new();
    for pkg in packages {
        groups.entry(pkg.name.as_str()).or_default().push(pkg);
    }
    groups.retain(|_, members| members.len() > 1);
    groups
}
