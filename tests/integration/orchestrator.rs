//! End-to-end orchestrator behaviour over mock sources
//!
//! Covers refresh merging, conflict annotation, batch updates that hit faults, searches
//! across absent tools and per-source dispatch of mutations.

use std::sync::Arc;

use super::{CallLog, CannedInvoker, MockAdapter};
use orbit::data::{Package, SourceKind, UpdateStatus};
use orbit::sources::{AptSource, DnfSource};
use orbit::{AdapterRegistry, BatchRunner, CancellationToken, OrbitError, OrbitManager};

fn manager_with(adapters: Vec<MockAdapter>) -> OrbitManager {
    let mut registry = AdapterRegistry::new();
    for adapter in adapters {
        registry.register(Box::new(adapter));
    }
    OrbitManager::new(registry)
}

#[test]
fn test_refresh_merges_present_backend_sorted() {
    let invoker = Arc::new(
        CannedInvoker::new().with_tool("dpkg-query", "foo\t1.0\tFoo tool\nbar\t2.1\tBar tool\n"),
    );
    let mut registry = AdapterRegistry::new();
    registry.register(Box::new(DnfSource::new(invoker.clone(), "pkexec")));
    registry.register(Box::new(AptSource::new(invoker, "pkexec")));
    let mut manager = OrbitManager::new(registry);

    let snapshot = manager.refresh();
    let names: Vec<&str> = snapshot.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, ["bar", "foo"]);
    assert!(snapshot.iter().all(|p| p.source() == SourceKind::Apt));
    assert!(snapshot.iter().all(|p| !p.has_conflict()));
    assert_eq!(snapshot[0].version, "2.1");
    assert_eq!(snapshot[1].summary, "Foo tool");
}

#[test]
fn test_same_name_across_sources_is_flagged() {
    let mut manager = manager_with(vec![
        MockAdapter::new(SourceKind::Flatpak).with_installed("org.example.Editor", "Editor"),
        MockAdapter::new(SourceKind::Snap).with_installed("editor", "Editor"),
        MockAdapter::new(SourceKind::Apt).with_installed("editor-cli", "editor"),
    ]);

    let snapshot = manager.refresh().to_vec();
    let flagged: Vec<&Package> = snapshot.iter().filter(|p| p.has_conflict()).collect();
    assert_eq!(flagged.len(), 2);
    for pkg in &flagged {
        assert_eq!(pkg.name, "Editor");
        assert!(pkg.summary.contains("1 other source"));
        assert_eq!(pkg.conflicts_with(), Some(1));
    }
    assert_eq!(manager.statistics().conflicts, 2);

    // refreshing again must not stack a second warning
    let again = manager.refresh().to_vec();
    assert_eq!(again, snapshot);
}

fn outdated(id: &str) -> Package {
    Package::new(id, id, SourceKind::Apt, "1").with_update_status(UpdateStatus::UpdateAvailable)
}

#[test]
fn test_update_all_survives_faulting_item() {
    let calls = CallLog::default();
    let mut manager = manager_with(vec![MockAdapter::new(SourceKind::Apt)
        .with_package(outdated("alpha"))
        .with_package(outdated("beta"))
        .with_package(outdated("gamma"))
        .with_package(
            Package::new("delta", "delta", SourceKind::Apt, "1")
                .with_update_status(UpdateStatus::UpToDate),
        )
        .with_fault("beta")
        .logging_to(&calls)]);

    manager.refresh();
    let mut progress = Vec::new();
    let result = manager.update_all(BatchRunner::new().on_progress(|index, total, name| {
        progress.push(format!("{index}/{total} {name}"))
    }));

    assert_eq!(result.success, 2);
    assert_eq!(result.failed, 1);
    assert_eq!(result.total, 3);
    assert_eq!(result.success + result.failed + result.skipped, result.total);
    assert_eq!(*calls.borrow(), ["update alpha", "update beta", "update gamma"]);
    assert_eq!(progress, ["1/3 alpha", "2/3 beta", "3/3 gamma"]);
}

#[test]
fn test_update_all_without_snapshot_does_nothing() {
    let calls = CallLog::default();
    let manager = manager_with(vec![MockAdapter::new(SourceKind::Apt)
        .with_package(outdated("alpha"))
        .logging_to(&calls)]);

    let result = manager.update_all(BatchRunner::new());
    assert_eq!(result.total, 0);
    assert!(calls.borrow().is_empty());
}

#[test]
fn test_cancelled_batch_skips_remaining() {
    let calls = CallLog::default();
    let manager = manager_with(vec![MockAdapter::new(SourceKind::Snap).logging_to(&calls)]);
    let token = CancellationToken::new();
    token.cancel();

    let packages = vec![
        Package::new("vlc", "Vlc", SourceKind::Snap, "3"),
        Package::new("gimp", "Gimp", SourceKind::Snap, "2"),
    ];
    let result = manager.remove_multiple(&packages, BatchRunner::new().with_cancellation(token));
    assert_eq!(result.skipped, 2);
    assert_eq!(result.total, 2);
    assert!(calls.borrow().is_empty());
}

#[test]
fn test_search_ignores_absent_tool() {
    let manager = manager_with(vec![
        MockAdapter::new(SourceKind::Flatpak)
            .with_catalog("org.gnome.Calculator", "Calculator")
            .with_catalog("io.github.Qalculate", "Qalculate! Calc")
            .with_catalog("org.kde.kcalc", "KCalc")
            .with_catalog("org.gnome.Maps", "Maps"),
        MockAdapter::new(SourceKind::Snap)
            .with_catalog("gnome-calculator", "GNOME Calculator")
            .absent(),
    ]);

    let results = manager.search("calc", None);
    assert_eq!(results.len(), 3);
    assert!(results.iter().all(|p| p.source() == SourceKind::Flatpak));
    assert!(results.iter().all(|p| !p.is_installed));
}

#[test]
fn test_search_restricted_to_one_source() {
    let manager = manager_with(vec![
        MockAdapter::new(SourceKind::Flatpak).with_catalog("org.videolan.VLC", "VLC"),
        MockAdapter::new(SourceKind::Snap).with_catalog("vlc", "VLC"),
    ]);

    let results = manager.search("vlc", Some(SourceKind::Snap));
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].id, "vlc");
    assert!(manager.search("vlc", Some(SourceKind::Dnf)).is_empty());
}

#[test]
fn test_mutations_reach_only_the_owning_source() {
    let flatpak_calls = CallLog::default();
    let snap_calls = CallLog::default();
    let manager = manager_with(vec![
        MockAdapter::new(SourceKind::Flatpak).installing().logging_to(&flatpak_calls),
        MockAdapter::new(SourceKind::Snap).installing().logging_to(&snap_calls),
    ]);

    let vlc = Package::new("vlc", "VLC", SourceKind::Snap, "3.0");
    assert!(manager.update(&vlc).unwrap());
    assert!(manager.remove(&vlc).unwrap());
    assert!(manager.install(&vlc.clone().available()).unwrap());

    assert!(flatpak_calls.borrow().is_empty());
    assert_eq!(*snap_calls.borrow(), ["update vlc", "remove vlc", "install vlc"]);
}

#[test]
fn test_install_without_capability_is_clean_failure() {
    let calls = CallLog::default();
    let manager = manager_with(vec![MockAdapter::new(SourceKind::Apt).logging_to(&calls)]);

    let pkg = Package::new("vim", "vim", SourceKind::Apt, "").available();
    assert!(!manager.install(&pkg).unwrap());
    assert!(calls.borrow().is_empty());
}

#[test]
fn test_unregistered_source_is_clean_failure() {
    let manager = manager_with(vec![MockAdapter::new(SourceKind::Apt)]);
    let pkg = Package::new("vlc", "VLC", SourceKind::Snap, "3.0");
    assert!(!manager.update(&pkg).unwrap());
    assert!(!manager.remove(&pkg).unwrap());
}

#[test]
fn test_fault_is_wrapped_as_operation_error() {
    let manager = manager_with(vec![MockAdapter::new(SourceKind::Pacman).with_fault("linux")]);
    let pkg = Package::new("linux", "linux", SourceKind::Pacman, "6.9");

    let err = manager.remove(&pkg).unwrap_err();
    assert!(err.is_operation_fault());
    assert!(matches!(err, OrbitError::Operation { action: "remove", .. }));
    assert!(err.to_string().contains("linux"));
}

#[test]
fn test_snapshot_refreshes_lazily_once() {
    let mut manager =
        manager_with(vec![MockAdapter::new(SourceKind::Dnf).with_installed("htop", "htop")]);
    assert!(manager.cached().is_none());
    assert_eq!(manager.snapshot().len(), 1);
    assert!(manager.cached().is_some());
    assert_eq!(manager.statistics().total, 1);
}
