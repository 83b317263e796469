//! Command implementations for the Orbit CLI.
//!
//! Every command writes its output to the supplied writer so it can be captured in tests.
//! Mutating commands return whether the operation succeeded; the binary turns `false` into
//! a non-zero exit status.
//!
//! # Commands
//!
//! - [`list_command`]: Installed packages across all sources
//! - [`search_command`]: Catalog search
//! - [`install_command`], [`update_command`], [`remove_command`]: Single-source mutations
//! - [`update_all_command`]: Batch update of everything marked as outdated
//! - [`info_command`]: Detailed view of one installed package
//! - [`stats_command`], [`doctor_command`]: Summaries and diagnostics
//! - [`backup_export_command`] and friends: Backup management
//! - [`config_command`]: Effective configuration

use std::io::Write;
use std::path::Path;

use colored::Colorize;
use dialoguer::{theme::ColorfulTheme, Confirm};
use tabular::{Row, Table};
use tracing::debug;

use crate::backup::BackupManager;
use crate::batch::{BatchResult, BatchRunner};
use crate::configuration::OrbitConfig;
use crate::conflicts::conflict_groups;
use crate::data::{Package, SourceKind, UpdateStatus};
use crate::errors::{OrbitError, Result};
use crate::manager::OrbitManager;
use crate::notifications::{announce_updates, Notifier};
use crate::traits::Exportable;


/// Where command output goes and how the user is consulted.
pub struct Console<'a> {
    pub out: &'a mut dyn Write,
    /// Skip confirmation prompts and proceed.
    pub assume_yes: bool,
}

impl<'a> Console<'a> {
    pub fn new(out: &'a mut dyn Write, assume_yes: bool) -> Self {
        Console { out, assume_yes }
    }

    fn confirm(&mut self, prompt: &str) -> Result<bool> {
        if self.assume_yes {
            return Ok(true);
        }
        Confirm::with_theme(&ColorfulTheme::default())
            .with_prompt(prompt)
            .default(false)
            .interact()
            .map_err(|e| OrbitError::Io(std::io::Error::other(e.to_string())))
    }
}

fn export_error(e: impl std::fmt::Display) -> OrbitError {
    OrbitError::command_failed("export", e.to_string())
}

fn status_label(status: UpdateStatus) -> &'static str {
    match status {
        UpdateStatus::UpToDate => "up to date",
        UpdateStatus::UpdateAvailable => "update available",
        UpdateStatus::Manual => "manual",
        UpdateStatus::Unknown => "",
    }
}

fn package_table(packages: &[Package]) -> Table {
    let mut table = Table::new("{:<}  {:<}  {:<}  {:<}  {:<}");
    table.add_row(
        Row::new()
            .with_cell("NAME")
            .with_cell("ID")
            .with_cell("VERSION")
            .with_cell("SOURCE")
            .with_cell("STATUS"),
    );
    for pkg in packages {
        let name = if pkg.has_conflict() {
            format!("{} ⚠️", pkg.name)
        } else {
            pkg.name.clone()
        };
        table.add_row(
            Row::new()
                .with_cell(name)
                .with_cell(&pkg.id)
                .with_cell(&pkg.version)
                .with_cell(format!("{} {}", pkg.source().emoji(), pkg.source()))
                .with_cell(status_label(pkg.update_status)),
        );
    }
    table
}

/// Lists installed packages, optionally limited to one source or to name conflicts.
pub fn list_command(
    manager: &mut OrbitManager,
    console: &mut Console<'_>,
    notifier: Option<&dyn Notifier>,
    source: Option<SourceKind>,
    conflicts_only: bool,
    json: bool,
) -> Result<()> {
    let snapshot = manager.refresh().to_vec();
    if let Some(notifier) = notifier {
        let pending = manager.statistics().updates_available;
        announce_updates(notifier, true, pending);
    }

    let packages: Vec<Package> = snapshot
        .into_iter()
        .filter(|pkg| source.map_or(true, |kind| pkg.source() == kind))
        .filter(|pkg| !conflicts_only || pkg.has_conflict())
        .collect();
    debug!(count = packages.len(), "Listing packages");

    if json {
        writeln!(console.out, "{}", packages.export_json().map_err(export_error)?)?;
        return Ok(());
    }

    if packages.is_empty() {
        writeln!(console.out, "No packages found.")?;
        return Ok(());
    }

    if conflicts_only {
        for (name, members) in conflict_groups(&packages) {
            writeln!(console.out, "{}", name.bold())?;
            for pkg in members {
                writeln!(console.out, "  {} {} ({})", pkg.source().emoji(), pkg.source(), pkg.id)?;
            }
        }
        return Ok(());
    }

    write!(console.out, "{}", package_table(&packages))?;
    writeln!(console.out, "\n{} packages", packages.len())?;
    Ok(())
}

/// Searches the catalogs of one or all sources.
pub fn search_command(
    manager: &OrbitManager,
    console: &mut Console<'_>,
    query: &str,
    source: Option<SourceKind>,
    json: bool,
) -> Result<()> {
    let results = manager.search(query, source);

    if json {
        writeln!(console.out, "{}", results.export_json().map_err(export_error)?)?;
        return Ok(());
    }

    if results.is_empty() {
        writeln!(console.out, "No results for '{query}'.")?;
        return Ok(());
    }

    let mut table = Table::new("{:<}  {:<}  {:<}  {:<}  {:<}");
    for pkg in &results {
        table.add_row(
            Row::new()
                .with_cell(&pkg.name)
                .with_cell(&pkg.id)
                .with_cell(&pkg.version)
                .with_cell(pkg.source())
                .with_cell(&pkg.summary),
        );
    }
    write!(console.out, "{table}")?;
    Ok(())
}

fn report(console: &mut Console<'_>, action: &str, pkg: &Package, success: bool) -> Result<bool> {
    if success {
        writeln!(console.out, "{} {action} {}", "✓".green(), pkg)?;
    } else {
        writeln!(console.out, "{} Failed to {action} {}", "✗".red(), pkg)?;
    }
    Ok(success)
}

pub fn install_command(
    manager: &OrbitManager,
    console: &mut Console<'_>,
    id: &str,
    source: SourceKind,
) -> Result<bool> {
    let pkg = Package::new(id, id, source, "").available();
    match manager.registry().get(source) {
        None => {
            writeln!(console.out, "{source} is not enabled.")?;
            return Ok(false);
        }
        Some(adapter) if !adapter.supports_install() => {
            writeln!(console.out, "{source} does not support installing packages.")?;
            return Ok(false);
        }
        Some(_) => {}
    }
    let success = manager.install(&pkg)?;
    report(console, "install", &pkg, success)
}

pub fn update_command(
    manager: &OrbitManager,
    console: &mut Console<'_>,
    id: &str,
    source: SourceKind,
) -> Result<bool> {
    let pkg = Package::new(id, id, source, "");
    let success = manager.update(&pkg)?;
    report(console, "update", &pkg, success)
}

fn print_batch(console: &mut Console<'_>, action: &str, result: &BatchResult) -> Result<()> {
    let mut line = format!(
        "{action}: {} succeeded, {} failed of {}",
        result.success, result.failed, result.total
    );
    if result.skipped > 0 {
        line.push_str(&format!(", {} skipped", result.skipped));
    }
    writeln!(console.out, "{line}")?;
    Ok(())
}

fn progress_printer(out: &mut dyn Write) -> impl FnMut(usize, usize, &str) + '_ {
    move |current, total, name| {
        if let Err(e) = writeln!(out, "[{current}/{total}] {name}") {
            debug!(error = %e, "Failed to write progress");
        }
    }
}

/// Refreshes, then updates every package with a pending update.
pub fn update_all_command(
    manager: &mut OrbitManager,
    console: &mut Console<'_>,
    notifier: Option<&dyn Notifier>,
) -> Result<bool> {
    manager.refresh();
    let pending = manager.statistics().updates_available;
    if pending == 0 {
        writeln!(console.out, "Everything is up to date.")?;
        return Ok(true);
    }
    if !console.confirm(&format!("Update {pending} package(s)?"))? {
        writeln!(console.out, "Aborted.")?;
        return Ok(false);
    }

    let result = manager.update_all(BatchRunner::new().on_progress(progress_printer(console.out)));
    print_batch(console, "Update all", &result)?;
    if let Some(notifier) = notifier {
        notifier.operation_complete("Update all", result.is_complete_success());
    }
    Ok(result.is_complete_success())
}

/// Removes one or more packages from a single source.
pub fn remove_command(
    manager: &OrbitManager,
    console: &mut Console<'_>,
    ids: &[String],
    source: SourceKind,
) -> Result<bool> {
    let packages: Vec<Package> = ids
        .iter()
        .map(|id| Package::new(id.as_str(), id.as_str(), source, ""))
        .collect();
    let names = ids.join(", ");
    if !console.confirm(&format!("Remove {names} from {source}?"))? {
        writeln!(console.out, "Aborted.")?;
        return Ok(false);
    }

    if let [pkg] = packages.as_slice() {
        let success = manager.remove(pkg)?;
        return report(console, "remove", pkg, success);
    }

    let result = manager.remove_multiple(
        &packages,
        BatchRunner::new().on_progress(progress_printer(console.out)),
    );
    print_batch(console, "Remove", &result)?;
    Ok(result.is_complete_success())
}

/// Shows everything known about one installed package.
pub fn info_command(
    manager: &mut OrbitManager,
    console: &mut Console<'_>,
    id: &str,
    source: Option<SourceKind>,
) -> Result<bool> {
    let found = manager
        .snapshot()
        .iter()
        .find(|pkg| pkg.id == id && source.map_or(true, |kind| pkg.source() == kind))
        .cloned();
    let Some(mut pkg) = found else {
        writeln!(console.out, "Package '{id}' is not installed.")?;
        return Ok(false);
    };
    manager.details(&mut pkg);

    let fields = [
        ("Name", pkg.name.clone()),
        ("ID", pkg.id.clone()),
        ("Source", pkg.source().to_string()),
        ("Version", pkg.version.clone()),
        ("Status", status_label(pkg.update_status).to_string()),
        ("Summary", pkg.summary.clone()),
        ("Description", pkg.description.clone()),
        ("Size", pkg.size.clone()),
        ("Developer", pkg.developer.clone()),
        ("License", pkg.license.clone()),
        ("Homepage", pkg.homepage.clone()),
        ("Installed", pkg.installed_date.clone()),
        ("Launch", pkg.launch_command.clone()),
        ("Sandboxed", if pkg.sandboxed { "yes" } else { "no" }.to_string()),
    ];
    for (label, value) in fields.iter().filter(|(_, value)| !value.is_empty()) {
        writeln!(console.out, "{}: {value}", label.bold())?;
    }
    if !pkg.dependencies.is_empty() {
        writeln!(console.out, "{}:", "Dependencies".bold())?;
        for dep in &pkg.dependencies {
            writeln!(console.out, "  {dep}")?;
        }
    }
    Ok(true)
}

pub fn stats_command(manager: &mut OrbitManager, console: &mut Console<'_>, json: bool) -> Result<()> {
    manager.snapshot();
    let stats = manager.statistics();

    if json {
        writeln!(console.out, "{}", stats.export_json().map_err(export_error)?)?;
        return Ok(());
    }

    let mut table = Table::new("{:<}  {:>}");
    table.add_row(Row::new().with_cell("Total").with_cell(stats.total));
    for (source, count) in &stats.by_source {
        table.add_row(
            Row::new()
                .with_cell(format!("  {} {source}", source.emoji()))
                .with_cell(count),
        );
    }
    table.add_row(Row::new().with_cell("Updates available").with_cell(stats.updates_available));
    table.add_row(Row::new().with_cell("Sandboxed").with_cell(stats.sandboxed));
    table.add_row(Row::new().with_cell("Conflicts").with_cell(stats.conflicts));
    write!(console.out, "{table}")?;
    Ok(())
}

/// Reports which sources are registered and whether their tools are installed.
pub fn doctor_command(manager: &OrbitManager, console: &mut Console<'_>) -> Result<()> {
    let statuses = manager.sources();
    if statuses.is_empty() {
        writeln!(console.out, "No sources are enabled.")?;
        return Ok(());
    }

    let mut table = Table::new("{:<}  {:<}  {:<}");
    for status in &statuses {
        let available = if status.available {
            "available".green()
        } else {
            "not found".red()
        };
        let install = if status.supports_install { "install" } else { "" };
        table.add_row(
            Row::new()
                .with_cell(format!("{} {}", status.source.emoji(), status.source))
                .with_cell(available)
                .with_cell(install),
        );
    }
    write!(console.out, "{table}")?;
    let ready = statuses.iter().filter(|s| s.available).count();
    writeln!(console.out, "\n{ready} of {} sources available", statuses.len())?;
    Ok(())
}

pub fn backup_export_command(
    manager: &mut OrbitManager,
    backups: &BackupManager,
    console: &mut Console<'_>,
    filename: Option<&str>,
) -> Result<()> {
    let snapshot = manager.refresh().to_vec();
    let path = backups.export(&snapshot, filename)?;
    writeln!(
        console.out,
        "Backed up {} packages to {}",
        snapshot.len(),
        path.display()
    )?;
    Ok(())
}

pub fn backup_list_command(backups: &BackupManager, console: &mut Console<'_>) -> Result<()> {
    let list = backups.list()?;
    if list.is_empty() {
        writeln!(console.out, "No backups in {}", backups.dir().display())?;
        return Ok(());
    }
    let mut table = Table::new("{:<}  {:<}  {:>}");
    for info in &list {
        table.add_row(
            Row::new()
                .with_cell(&info.filename)
                .with_cell(&info.created_at)
                .with_cell(info.total_apps),
        );
    }
    write!(console.out, "{table}")?;
    Ok(())
}

pub fn backup_import_command(
    backups: &BackupManager,
    console: &mut Console<'_>,
    path: &Path,
) -> Result<()> {
    let entries = backups.import(path)?;
    let mut table = Table::new("{:<}  {:<}  {:<}  {:<}");
    for entry in &entries {
        table.add_row(
            Row::new()
                .with_cell(&entry.name)
                .with_cell(&entry.id)
                .with_cell(&entry.version)
                .with_cell(entry.source),
        );
    }
    write!(console.out, "{table}")?;
    writeln!(console.out, "\n{} packages in backup", entries.len())?;
    Ok(())
}

pub fn backup_delete_command(
    backups: &BackupManager,
    console: &mut Console<'_>,
    path: &Path,
) -> Result<bool> {
    if !console.confirm(&format!("Delete {}?", path.display()))? {
        return Ok(false);
    }
    let deleted = backups.delete(path);
    if deleted {
        writeln!(console.out, "Deleted {}", path.display())?;
    } else {
        writeln!(console.out, "Could not delete {}", path.display())?;
    }
    Ok(deleted)
}

/// Prints the effective configuration as YAML.
pub fn config_command(config: &OrbitConfig, console: &mut Console<'_>) -> Result<()> {
    let yaml = config.export().map_err(export_error)?;
    write!(console.out, "{yaml}")?;
    Ok(())
}
