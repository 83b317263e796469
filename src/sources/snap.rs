use std::sync::Arc;

use tracing::debug;

use super::parsing::{capitalize, column, data_lines, whitespace_columns};
use super::{query_output, run_mutation, validate_package_id, InstallCapable, PackageAdapter};
use crate::data::{Package, SourceKind};
use crate::errors::Result;
use crate::invoker::{ToolCommand, ToolInvoker};

/// Applications from the Snap store.
pub struct SnapSource {
    invoker: Arc<dyn ToolInvoker>,
    privilege: String,
}

impl SnapSource {
    pub fn new<S: Into<String>>(invoker: Arc<dyn ToolInvoker>, privilege: S) -> Self {
        SnapSource {
            invoker,
            privilege: privilege.into(),
        }
    }

    /// Columns: Name, Version, Rev, Tracking, Publisher, Notes.
    fn parse_installed(output: &str) -> Vec<Package> {
        data_lines(output, 1)
            .filter_map(|line| {
                let cols = whitespace_columns(line);
                if cols.len() < 3 {
                    return None;
                }
                let id = column(&cols, 0);
                Some(Package::new(id, capitalize(id), SourceKind::Snap, column(&cols, 1)))
            })
            .collect()
    }

    /// Columns: Name, Version, Publisher, Notes, Summary (free text).
    fn parse_search(output: &str) -> Vec<Package> {
        data_lines(output, 1)
            .filter_map(|line| {
                let cols = whitespace_columns(line);
                if cols.len() < 3 {
                    return None;
                }
                let id = column(&cols, 0);
                let summary = cols.get(4..).map(|rest| rest.join(" ")).unwrap_or_default();
                Some(
                    Package::new(id, capitalize(id), SourceKind::Snap, column(&cols, 1))
                        .with_summary(summary)
                        .available(),
                )
            })
            .collect()
    }
}

impl PackageAdapter for SnapSource {
    fn source(&self) -> SourceKind {
        SourceKind::Snap
    }

    fn is_available(&self) -> bool {
        self.invoker.is_available("snap")
    }

    fn list_installed(&self) -> Result<Vec<Package>> {
        let command = ToolCommand::new("snap").arg("list");
        let packages = query_output(self.invoker.as_ref(), "snap", &command)
            .map(|out| Self::parse_installed(&out))
            .unwrap_or_default();
        debug!(source = %self.source(), count = packages.len(), "Listed installed packages");
        Ok(packages)
    }

    fn search(&self, query: &str) -> Result<Vec<Package>> {
        let command = ToolCommand::new("snap").args(["find", query]);
        let packages = query_output(self.invoker.as_ref(), "snap", &command)
            .map(|out| Self::parse_search(&out))
            .unwrap_or_default();
        debug!(source = %self.source(), query, count = packages.len(), "Searched catalog");
        Ok(packages)
    }

    fn update(&self, id: &str) -> Result<bool> {
        validate_package_id(id)?;
        let command = ToolCommand::privileged(&self.privilege, "snap").args(["refresh", id]);
        run_mutation(self.invoker.as_ref(), &command)
    }

    fn remove(&self, id: &str) -> Result<bool> {
        validate_package_id(id)?;
        let command = ToolCommand::new("snap").args(["remove", id]);
        run_mutation(self.invoker.as_ref(), &command)
    }

    fn installer(&self) -> Option<&dyn InstallCapable> {
        Some(self)
    }
}

impl InstallCapable for SnapSource {
    fn install(&self, id: &str) -> Result<bool> {
        validate_package_id(id)?;
        let command = ToolCommand::privileged(&self.privilege, "snap").args(["install", id]);
        run_mutation(self.invoker.as_ref(), &command)
    }
}
