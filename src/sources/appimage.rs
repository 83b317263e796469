use std::fs;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};

use super::parsing::{capitalize, format_bytes};
use super::PackageAdapter;
use crate::data::{Package, SourceKind, UNKNOWN_VERSION};
use crate::errors::Result;

const EXTENSION: &str = ".AppImage";
const ID_LENGTH: usize = 12;

/// Standalone `*.AppImage` executables found in a fixed set of directories.
///
/// There is no backing tool: listing is a directory scan, update is unsupported and
/// removal deletes the file. Identifiers are derived from the file path, so the same file
/// keeps the same id across scans.
pub struct AppImageSource {
    scan_dirs: Vec<PathBuf>,
}

impl AppImageSource {
    pub fn new(scan_dirs: Vec<PathBuf>) -> Self {
        AppImageSource { scan_dirs }
    }

    pub fn scan_dirs(&self) -> &[PathBuf] {
        &self.scan_dirs
    }

    /// First 12 hex characters of the SHA-256 of the full path.
    pub fn id_for(path: &Path) -> String {
        let digest = format!("{:x}", Sha256::digest(path.to_string_lossy().as_bytes()));
        digest[..ID_LENGTH].to_string()
    }

    /// `my-tool.AppImage` becomes `My tool`.
    fn display_name(file_name: &str) -> String {
        capitalize(&file_name.replace(EXTENSION, "").replace('-', " "))
    }

    /// AppImage files directly inside the scan directories. Missing directories are skipped.
    fn scan(&self) -> Vec<PathBuf> {
        let mut found = Vec::new();
        for dir in &self.scan_dirs {
            let entries = match fs::read_dir(dir) {
                Ok(entries) => entries,
                Err(e) => {
                    debug!(dir = %dir.display(), error = %e, "Skipping AppImage directory");
                    continue;
                }
            };
            let mut paths: Vec<PathBuf> = entries
                .filter_map(|entry| entry.ok())
                .map(|entry| entry.path())
                .filter(|path| path.is_file())
                .filter(|path| {
                    path.file_name()
                        .and_then(|name| name.to_str())
                        .is_some_and(|name| name.ends_with(EXTENSION))
                })
                .collect();
            paths.sort();
            found.extend(paths);
        }
        found
    }

    fn to_package(path: &Path) -> Package {
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        let display = path.display().to_string();
        let mut package = Package::new(
            Self::id_for(path),
            Self::display_name(&file_name),
            SourceKind::AppImage,
            UNKNOWN_VERSION,
        )
        .with_summary(format!("Path: {display}"));
        package.launch_command = display;
        if let Ok(metadata) = fs::metadata(path) {
            package.size = format_bytes(metadata.len());
        }
        package
    }
}

impl PackageAdapter for AppImageSource {
    fn source(&self) -> SourceKind {
        SourceKind::AppImage
    }

    fn is_available(&self) -> bool {
        true
    }

    fn list_installed(&self) -> Result<Vec<Package>> {
        let packages: Vec<Package> = self.scan().iter().map(|p| Self::to_package(p)).collect();
        debug!(source = %self.source(), count = packages.len(), "Listed installed packages");
        Ok(packages)
    }

    fn search(&self, _query: &str) -> Result<Vec<Package>> {
        Ok(Vec::new())
    }

    fn update(&self, id: &str) -> Result<bool> {
        debug!(package = id, "AppImages are updated manually");
        Ok(false)
    }

    fn remove(&self, id: &str) -> Result<bool> {
        let Some(path) = self.scan().into_iter().find(|path| Self::id_for(path) == id) else {
            warn!(package = id, "No AppImage with this id");
            return Ok(false);
        };
        match fs::remove_file(&path) {
            Ok(()) => {
                info!(package = id, path = %path.display(), "Removed AppImage");
                Ok(true)
            }
            Err(e) => {
                warn!(package = id, path = %path.display(), error = %e, "Failed to remove AppImage");
                Ok(false)
            }
        }
    }
}
