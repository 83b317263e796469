use std::sync::Arc;

use tracing::debug;

use super::parsing::{column, data_lines, dependency_list, key_values, tab_columns};
use super::{query_output, run_mutation, validate_package_id, PackageAdapter};
use crate::data::{Package, SourceKind};
use crate::errors::Result;
use crate::invoker::{ToolCommand, ToolInvoker};

const LIST_FORMAT: &str = "-f=${Package}\t${Version}\t${Description}\n";

/// Debian-family packages, listed with `dpkg-query` and changed with `apt-get`.
pub struct AptSource {
    invoker: Arc<dyn ToolInvoker>,
    privilege: String,
}

impl AptSource {
    pub fn new<S: Into<String>>(invoker: Arc<dyn ToolInvoker>, privilege: S) -> Self {
        AptSource {
            invoker,
            privilege: privilege.into(),
        }
    }

    fn parse_installed(output: &str) -> Vec<Package> {
        data_lines(output, 0)
            .filter_map(|line| {
                let cols = tab_columns(line);
                if cols.len() < 2 {
                    return None;
                }
                let name = column(&cols, 0).trim();
                Some(
                    Package::new(name, name, SourceKind::Apt, column(&cols, 1).trim())
                        .with_summary(column(&cols, 2).trim()),
                )
            })
            .collect()
    }

    fn apply_details(package: &mut Package, output: &str) {
        let info = key_values(output);
        if let Some(description) = info.get("Description") {
            package.description = description.clone();
        }
        if let Some(size) = info.get("Installed-Size") {
            package.size = format!("{size} KiB");
        }
        if let Some(maintainer) = info.get("Maintainer") {
            package.developer = maintainer.clone();
        }
        if let Some(homepage) = info.get("Homepage") {
            package.homepage = homepage.clone();
        }
        if let Some(depends) = info.get("Depends") {
            package.dependencies = dependency_list(depends);
        }
    }
}

impl PackageAdapter for AptSource {
    fn source(&self) -> SourceKind {
        SourceKind::Apt
    }

    fn is_available(&self) -> bool {
        self.invoker.is_available("dpkg-query")
    }

    fn list_installed(&self) -> Result<Vec<Package>> {
        let command = ToolCommand::new("dpkg-query").args(["-W", LIST_FORMAT]);
        let packages = query_output(self.invoker.as_ref(), "dpkg-query", &command)
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
        let command = ToolCommand::privileged(&self.privilege, "apt-get")
            .args(["install", "--only-upgrade", "-y", id]);
        run_mutation(self.invoker.as_ref(), &command)
    }

    fn remove(&self, id: &str) -> Result<bool> {
        validate_package_id(id)?;
        let command =
            ToolCommand::privileged(&self.privilege, "apt-get").args(["remove", "-y", id]);
        run_mutation(self.invoker.as_ref(), &command)
    }

    fn get_details(&self, package: &mut Package) -> Result<()> {
        let command = ToolCommand::new("dpkg-query").args(["-s", package.id.as_str()]);
        if let Some(output) = query_output(self.invoker.as_ref(), "dpkg-query", &command) {
            Self::apply_details(package, &output);
        }
        Ok(())
    }
}
