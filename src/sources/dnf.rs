use std::sync::Arc;

use tracing::debug;

use super::parsing::{column, data_lines, whitespace_columns};
use super::{query_output, run_mutation, validate_package_id, PackageAdapter};
use crate::data::{Package, SourceKind};
use crate::errors::Result;
use crate::invoker::{ToolCommand, ToolInvoker};

/// Fedora-family packages managed by `dnf`.
pub struct DnfSource {
    invoker: Arc<dyn ToolInvoker>,
    privilege: String,
}

impl DnfSource {
    pub fn new<S: Into<String>>(invoker: Arc<dyn ToolInvoker>, privilege: S) -> Self {
        DnfSource {
            invoker,
            privilege: privilege.into(),
        }
    }

    /// `bash.x86_64` becomes `bash`; `python3.12.noarch` becomes `python3.12`.
    fn strip_arch(name: &str) -> &str {
        name.rsplit_once('.').map_or(name, |(base, _arch)| base)
    }

    /// Piped output wraps a long `name.arch` onto its own line; the indented line after it
    /// carries the version and repository.
    fn parse_installed(output: &str) -> Vec<Package> {
        let mut packages = Vec::new();
        let mut wrapped: Option<&str> = None;

        // First line is the "Installed Packages" banner.
        for line in data_lines(output, 1) {
            let mut cols = whitespace_columns(line);
            let continuation = line.starts_with(char::is_whitespace);
            match (wrapped.take(), continuation) {
                (Some(name), true) => cols.insert(0, name),
                (_, true) => continue,
                (_, false) => {}
            }
            if cols.len() == 1 {
                wrapped = Some(cols[0]);
                continue;
            }
            let name = Self::strip_arch(column(&cols, 0));
            packages.push(Package::new(name, name, SourceKind::Dnf, column(&cols, 1)));
        }
        packages
    }
}

impl PackageAdapter for DnfSource {
    fn source(&self) -> SourceKind {
        SourceKind::Dnf
    }

    fn is_available(&self) -> bool {
        self.invoker.is_available("dnf")
    }

    fn list_installed(&self) -> Result<Vec<Package>> {
        let command = ToolCommand::new("dnf").args(["list", "installed", "--quiet"]);
        let packages = query_output(self.invoker.as_ref(), "dnf", &command)
            .map(|out| Self::parse_installed(&out))
            .unwrap_or_default();
        debug!(source = %self.source(), count = packages.len(), "Listed installed packages");
        Ok(packages)
    }

    fn search(&self, _query: &str) -> Result<Vec<Package>> {
        Ok(Vec::new())
    }

    fn update(&self, id: &str) -> Result<bool> {
        validate_package_id(id)?;
        let command = ToolCommand::privileged(&self.privilege, "dnf").args(["upgrade", "-y", id]);
        run_mutation(self.invoker.as_ref(), &command)
    }

    fn remove(&self, id: &str) -> Result<bool> {
        validate_package_id(id)?;
        let command = ToolCommand::privileged(&self.privilege, "dnf").args(["remove", "-y", id]);
        run_mutation(self.invoker.as_ref(), &command)
    }
}
