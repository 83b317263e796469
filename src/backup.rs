//! Versioned JSON backups of package lists.
//!
//! A backup only records what was installed. Restoring reads the entries back; it never
//! installs anything.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::data::{Package, SourceKind};
use crate::errors::{OrbitError, Result};

pub const BACKUP_FORMAT_VERSION: &str = "1.0";
const FILE_PREFIX: &str = "orbit_backup_";
const FILE_SUFFIX: &str = ".json";

/// One package as stored in a backup file.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct BackupEntry {
    pub id: String,
    pub name: String,
    pub source: SourceKind,
    pub version: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub icon: String,
    #[serde(default)]
    pub sandboxed: bool,
    #[serde(default)]
    pub size: String,
}

impl From<&Package> for BackupEntry {
    fn from(pkg: &Package) -> Self {
        BackupEntry {
            id: pkg.id.clone(),
            name: pkg.name.clone(),
            source: pkg.source(),
            version: pkg.version.clone(),
            summary: pkg.summary.clone(),
            icon: pkg.icon.clone(),
            sandboxed: pkg.sandboxed,
            size: pkg.size.clone(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct BackupRecord {
    pub version: String,
    pub created_at: DateTime<Local>,
    pub total_apps: usize,
    pub apps: Vec<BackupEntry>,
}

/// Metadata of a backup file on disk.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct BackupInfo {
    pub filename: String,
    pub path: PathBuf,
    pub created_at: String,
    pub total_apps: usize,
}

/// Only the fields needed for listing; anything else in the file is ignored.
#[derive(Deserialize)]
struct BackupHeader {
    #[serde(default)]
    created_at: Option<String>,
    #[serde(default)]
    total_apps: usize,
}

#[derive(Deserialize)]
struct BackupBody {
    #[serde(default)]
    apps: Vec<BackupEntry>,
}

/// A caller-chosen name must stay inside the backup directory.
fn validate_filename(name: &str) -> Result<()> {
    let plain = !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\'])
        && !Path::new(name).is_absolute();
    if plain {
        Ok(())
    } else {
        Err(OrbitError::Backup(format!(
            "Invalid backup name '{name}': expected a plain file name"
        )))
    }
}

pub struct BackupManager {
    dir: PathBuf,
}

impl BackupManager {
    pub fn new<P: Into<PathBuf>>(dir: P) -> Self {
        BackupManager { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Writes `packages` to a new backup file and returns its path.
    ///
    /// Without `filename` the name is `orbit_backup_<YYYYmmdd_HHMMSS>.json`.
    pub fn export(&self, packages: &[Package], filename: Option<&str>) -> Result<PathBuf> {
        let created_at = Local::now();
        let filename = match filename {
            Some(name) => {
                validate_filename(name)?;
                name.to_string()
            }
            None => format!(
                "{FILE_PREFIX}{}{FILE_SUFFIX}",
                created_at.format("%Y%m%d_%H%M%S")
            ),
        };

        let record = BackupRecord {
            version: BACKUP_FORMAT_VERSION.to_string(),
            created_at,
            total_apps: packages.len(),
            apps: packages.iter().map(BackupEntry::from).collect(),
        };

        fs::create_dir_all(&self.dir)?;
        let path = self.dir.join(filename);
        fs::write(&path, serde_json::to_string_pretty(&record)?)?;
        info!(path = %path.display(), count = record.total_apps, "Backup written");
        Ok(path)
    }

    /// Reads the package entries of a backup file.
    pub fn import(&self, path: &Path) -> Result<Vec<BackupEntry>> {
        let contents = fs::read_to_string(path).map_err(|e| {
            OrbitError::Backup(format!("Failed to read {}: {e}", path.display()))
        })?;
        let body: BackupBody = serde_json::from_str(&contents)?;
        debug!(path = %path.display(), count = body.apps.len(), "Backup read");
        Ok(body.apps)
    }

    /// Backups in the directory, newest first. Files that cannot be parsed are skipped.
    pub fn list(&self) -> Result<Vec<BackupInfo>> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut backups = Vec::new();
        for entry in entries.filter_map(|entry| entry.ok()) {
            let filename = entry.file_name().to_string_lossy().into_owned();
            if !(filename.starts_with(FILE_PREFIX) && filename.ends_with(FILE_SUFFIX)) {
                continue;
            }
            let path = entry.path();
            let header = fs::read_to_string(&path)
                .ok()
                .and_then(|contents| serde_json::from_str::<BackupHeader>(&contents).ok());
            let Some(header) = header else {
                warn!(path = %path.display(), "Skipping unreadable backup");
                continue;
            };
            backups.push(BackupInfo {
                filename,
                path,
                created_at: header.created_at.unwrap_or_else(|| "Unknown".to_string()),
                total_apps: header.total_apps,
            });
        }

        backups.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(backups)
    }

    /// Deletes a backup file. Returns false when it could not be removed.
    pub fn delete(&self, path: &Path) -> bool {
        match fs::remove_file(path) {
            Ok(()) => {
                info!(path = %path.display(), "Backup deleted");
                true
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to delete backup");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample() -> Vec<Package> {
        let mut vlc = Package::new("vlc", "Vlc", SourceKind::Snap, "3.0.20").with_summary("Media player");
        vlc.size = "1.2 GiB".to_string();
        vec![
            vlc,
            Package::new("org.gnome.Gedit", "Gedit", SourceKind::Flatpak, "46.2"),
        ]
    }

    #[test]
    fn test_export_writes_versioned_record() {
        let dir = TempDir::new().unwrap();
        let manager = BackupManager::new(dir.path().join("backups"));
        let path = manager.export(&sample(), None).unwrap();

        let filename = path.file_name().unwrap().to_string_lossy().into_owned();
        assert!(filename.starts_with("orbit_backup_"));
        assert!(filename.ends_with(".json"));

        let json: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(json["version"], "1.0");
        assert_eq!(json["total_apps"], 2);
        assert_eq!(json["apps"][0]["source"], "Snap");
        assert_eq!(json["apps"][0]["size"], "1.2 GiB");
        assert_eq!(json["apps"][1]["sandboxed"], true);
        assert!(json["created_at"].is_string());
    }

    #[test]
    fn test_import_reads_entries_back() {
        let dir = TempDir::new().unwrap();
        let manager = BackupManager::new(dir.path());
        let path = manager.export(&sample(), Some("mine.json")).unwrap();

        let entries = manager.import(&path).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0], BackupEntry::from(&sample()[0]));
    }

    #[test]
    fn test_export_rejects_names_outside_the_directory() {
        let dir = TempDir::new().unwrap();
        let backups = dir.path().join("backups");
        let manager = BackupManager::new(&backups);

        for name in ["../escape.json", "/tmp/orbit-escape.json", "nested/x.json", "..", ""] {
            let err = manager.export(&sample(), Some(name)).unwrap_err();
            assert!(matches!(err, OrbitError::Backup(_)), "{name} was accepted");
        }
        assert!(!dir.path().join("escape.json").exists());
        assert!(!backups.exists());
    }

    #[test]
    fn test_import_missing_file_is_backup_error() {
        let dir = TempDir::new().unwrap();
        let manager = BackupManager::new(dir.path());
        let err = manager.import(&dir.path().join("nope.json")).unwrap_err();
        assert!(matches!(err, OrbitError::Backup(_)));
    }

    #[test]
    fn test_list_is_newest_first_and_skips_garbage() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("orbit_backup_20240101_000000.json"),
            r#"{"created_at": "2024-01-01T00:00:00+00:00", "total_apps": 4}"#,
        )
        .unwrap();
        fs::write(
            dir.path().join("orbit_backup_20250101_000000.json"),
            r#"{"created_at": "2025-01-01T00:00:00+00:00", "total_apps": 7}"#,
        )
        .unwrap();
        fs::write(dir.path().join("orbit_backup_broken.json"), "{not json").unwrap();
        fs::write(dir.path().join("unrelated.json"), "{}").unwrap();

        let backups = BackupManager::new(dir.path()).list().unwrap();
        assert_eq!(backups.len(), 2);
        assert_eq!(backups[0].total_apps, 7);
        assert_eq!(backups[1].filename, "orbit_backup_20240101_000000.json");
    }

    #[test]
    fn test_list_missing_directory_is_empty() {
        let dir = TempDir::new().unwrap();
        let manager = BackupManager::new(dir.path().join("never-created"));
        assert!(manager.list().unwrap().is_empty());
    }

    #[test]
    fn test_delete() {
        let dir = TempDir::new().unwrap();
        let manager = BackupManager::new(dir.path());
        let path = manager.export(&sample(), None).unwrap();
        assert!(manager.delete(&path));
        assert!(!path.exists());
        assert!(!manager.delete(&path));
    }
}
