use std::sync::Arc;

use tracing::debug;

use super::parsing::{column, data_lines, dependency_list, key_values, whitespace_columns};
use super::{query_output, run_mutation, validate_package_id, PackageAdapter};
use crate::data::{Package, SourceKind};
use crate::errors::Result;
use crate::invoker::{ToolCommand, ToolInvoker};

/// Explicitly installed packages on Arch-style systems.
pub struct PacmanSource {
    invoker: Arc<dyn ToolInvoker>,
    privilege: String,
}

impl PacmanSource {
    pub fn new<S: Into<String>>(invoker: Arc<dyn ToolInvoker>, privilege: S) -> Self {
        PacmanSource {
            invoker,
            privilege: privilege.into(),
        }
    }

    fn parse_installed(output: &str) -> Vec<Package> {
        data_lines(output, 0)
            .filter_map(|line| {
                let cols = whitespace_columns(line);
                if cols.len() < 2 {
                    return None;
                }
                let name = column(&cols, 0);
                Some(Package::new(name, name, SourceKind::Pacman, column(&cols, 1)))
            })
            .collect()
    }

    fn apply_details(package: &mut Package, output: &str) {
        let info = key_values(output);
        let fields: [(&str, &mut String); 6] = [
            ("Description", &mut package.description),
            ("Licenses", &mut package.license),
            ("Installed Size", &mut package.size),
            ("URL", &mut package.homepage),
            ("Packager", &mut package.developer),
            ("Install Date", &mut package.installed_date),
        ];
        for (key, field) in fields {
            if let Some(value) = info.get(key) {
                *field = value.clone();
            }
        }
        if let Some(depends) = info.get("Depends On") {
            package.dependencies = dependency_list(depends);
        }
    }
}

impl PackageAdapter for PacmanSource {
    fn source(&self) -> SourceKind {
        SourceKind::Pacman
    }

    fn is_available(&self) -> bool {
        self.invoker.is_available("pacman")
    }

    fn list_installed(&self) -> Result<Vec<Package>> {
        let command = ToolCommand::new("pacman").arg("-Qe");
        let packages = query_output(self.invoker.as_ref(), "pacman", &command)
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
        let command =
            ToolCommand::privileged(&self.privilege, "pacman").args(["-S", "--noconfirm", id]);
        run_mutation(self.invoker.as_ref(), &command)
    }

    /// Removes the package together with dependencies nothing else needs.
    fn remove(&self, id: &str) -> Result<bool> {
        validate_package_id(id)?;
        let command =
            ToolCommand::privileged(&self.privilege, "pacman").args(["-Rs", "--noconfirm", id]);
        run_mutation(self.invoker.as_ref(), &command)
    }

    fn get_details(&self, package: &mut Package) -> Result<()> {
        let command = ToolCommand::new("pacman").args(["-Qi", package.id.as_str()]);
        if let Some(output) = query_output(self.invoker.as_ref(), "pacman", &command) {
            Self::apply_details(package, &output);
        }
        Ok(())
    }
}
