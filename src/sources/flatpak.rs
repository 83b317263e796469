use std::sync::Arc;

use tracing::debug;

use super::parsing::{column, data_lines, tab_columns};
use super::{query_output, run_mutation, validate_package_id, InstallCapable, PackageAdapter};
use crate::data::{Package, SourceKind};
use crate::errors::Result;
use crate::invoker::{ToolCommand, ToolInvoker};

/// Sandboxed applications from Flatpak remotes.
pub struct FlatpakSource {
    invoker: Arc<dyn ToolInvoker>,
}

impl FlatpakSource {
    pub fn new(invoker: Arc<dyn ToolInvoker>) -> Self {
        FlatpakSource { invoker }
    }

    /// Columns: application, name, version, options.
    fn parse_installed(output: &str) -> Vec<Package> {
        data_lines(output, 0)
            .filter_map(|line| {
                let cols = tab_columns(line);
                if cols.len() < 3 {
                    return None;
                }
                Some(Package::new(
                    column(&cols, 0),
                    column(&cols, 1),
                    SourceKind::Flatpak,
                    column(&cols, 2),
                ))
            })
            .collect()
    }

    /// Columns: application, name, version, description.
    fn parse_search(output: &str) -> Vec<Package> {
        data_lines(output, 0)
            .filter_map(|line| {
                let cols = tab_columns(line);
                if cols.len() < 2 {
                    return None;
                }
                Some(
                    Package::new(
                        column(&cols, 0),
                        column(&cols, 1),
                        SourceKind::Flatpak,
                        column(&cols, 2),
                    )
                    .with_summary(column(&cols, 3))
                    .available(),
                )
            })
            .collect()
    }
}

impl PackageAdapter for FlatpakSource {
    fn source(&self) -> SourceKind {
        SourceKind::Flatpak
    }

    fn is_available(&self) -> bool {
        self.invoker.is_available("flatpak")
    }

    fn list_installed(&self) -> Result<Vec<Package>> {
        let command = ToolCommand::new("flatpak")
            .args(["list", "--columns=application,name,version,options"]);
        let packages = query_output(self.invoker.as_ref(), "flatpak", &command)
            .map(|out| Self::parse_installed(&out))
            .unwrap_or_default();
        debug!(source = %self.source(), count = packages.len(), "Listed installed packages");
        Ok(packages)
    }

    fn search(&self, query: &str) -> Result<Vec<Package>> {
        let command = ToolCommand::new("flatpak").args([
            "search",
            "--columns=application,name,version,description",
            query,
        ]);
        let packages = query_output(self.invoker.as_ref(), "flatpak", &command)
            .map(|out| Self::parse_search(&out))
            .unwrap_or_default();
        debug!(source = %self.source(), query, count = packages.len(), "Searched catalog");
        Ok(packages)
    }

    fn update(&self, id: &str) -> Result<bool> {
        validate_package_id(id)?;
        let command = ToolCommand::new("flatpak").args(["update", "-y", id]);
        run_mutation(self.invoker.as_ref(), &command)
    }

    fn remove(&self, id: &str) -> Result<bool> {
        validate_package_id(id)?;
        let command = ToolCommand::new("flatpak").args(["uninstall", "-y", id]);
        run_mutation(self.invoker.as_ref(), &command)
    }

    fn installer(&self) -> Option<&dyn InstallCapable> {
        Some(self)
    }
}

impl InstallCapable for FlatpakSource {
    fn install(&self, id: &str) -> Result<bool> {
        validate_package_id(id)?;
        let command = ToolCommand::new("flatpak").args(["install", "-y", "--noninteractive", id]);
        run_mutation(self.invoker.as_ref(), &command)
    }
}
