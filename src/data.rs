//! Core data model shared by every package source.

use serde::{Deserialize, Serialize};
use serde_enum_str::{Deserialize_enum_str, Serialize_enum_str};

use crate::conflicts::conflict_warning;

/// The backend ecosystems a package can originate from.
#[derive(
    Serialize_enum_str, Deserialize_enum_str, Debug, Clone, Copy, Eq, PartialEq, Hash, Ord, PartialOrd,
)]
pub enum SourceKind {
    #[serde(rename = "APT")]
    Apt,
    #[serde(rename = "Flatpak")]
    Flatpak,
    #[serde(rename = "Snap")]
    Snap,
    #[serde(rename = "AppImage")]
    AppImage,
    #[serde(rename = "Pacman")]
    Pacman,
    #[serde(rename = "DNF")]
    Dnf,
}

impl SourceKind {
    /// Every source, in default registration order.
    pub const ALL: [SourceKind; 6] = [
        SourceKind::Apt,
        SourceKind::Flatpak,
        SourceKind::Snap,
        SourceKind::AppImage,
        SourceKind::Pacman,
        SourceKind::Dnf,
    ];

    /// Whether packages from this source run sandboxed.
    #[must_use]
    pub fn is_sandboxed(&self) -> bool {
        matches!(self, SourceKind::Flatpak | SourceKind::Snap)
    }

    /// An icon that represents the source in terminal output.
    #[must_use]
    pub fn emoji(&self) -> &'static str {
        match self {
            SourceKind::Apt => "📦",
            SourceKind::Flatpak => "🧊",
            SourceKind::Snap => "🫰",
            SourceKind::AppImage => "💿",
            SourceKind::Pacman => "👻",
            SourceKind::Dnf => "🎩",
        }
    }

    /// Case-insensitive lookup by display name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<SourceKind> {
        SourceKind::ALL
            .into_iter()
            .find(|kind| kind.to_string().eq_ignore_ascii_case(name))
    }
}

/// Update state of a package.
///
/// Orbit never derives `UpToDate`/`UpdateAvailable` from version comparison itself; these
/// are set by whoever enriches the package.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Eq, PartialEq, Hash, Default)]
#[serde(rename_all = "camelCase")]
pub enum UpdateStatus {
    UpToDate,
    UpdateAvailable,
    Manual,
    #[default]
    Unknown,
}

/// Version sentinel for packages whose version cannot be determined.
pub const UNKNOWN_VERSION: &str = "Unknown";

/// A single installed (or installable) application.
///
/// `id` is only unique within its `source`; the pair addresses the package for every
/// mutation.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Package {
    pub id: String,
    pub name: String,
    source: SourceKind,
    pub version: String,
    #[serde(default)]
    pub update_status: UpdateStatus,
    #[serde(default)]
    pub is_installed: bool,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub icon: String,
    #[serde(default)]
    pub size: String,
    #[serde(default)]
    pub developer: String,
    #[serde(default)]
    pub license: String,
    #[serde(default)]
    pub homepage: String,
    #[serde(default)]
    pub installed_date: String,
    #[serde(default)]
    pub launch_command: String,
    #[serde(default)]
    pub sandboxed: bool,
    #[serde(default)]
    pub dependencies: Vec<String>,
    /// Number of other sources carrying the same display name, set by conflict detection.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    conflicts_with: Option<usize>,
}

impl Package {
    /// Creates an installed package with empty enrichment fields.
    pub fn new<I, N, V>(id: I, name: N, source: SourceKind, version: V) -> Self
    where
        I: Into<String>,
        N: Into<String>,
        V: Into<String>,
    {
        Package {
            id: id.into(),
            name: name.into(),
            source,
            version: version.into(),
            update_status: UpdateStatus::Unknown,
            is_installed: true,
            summary: String::new(),
            description: String::new(),
            icon: String::new(),
            size: String::new(),
            developer: String::new(),
            license: String::new(),
            homepage: String::new(),
            installed_date: String::new(),
            launch_command: String::new(),
            sandboxed: source.is_sandboxed(),
            dependencies: Vec::new(),
            conflicts_with: None,
        }
    }

    #[must_use]
    pub fn with_summary<S: Into<String>>(mut self, summary: S) -> Self {
        self.summary = summary.into();
        self
    }

    #[must_use]
    pub fn with_update_status(mut self, status: UpdateStatus) -> Self {
        self.update_status = status;
        self
    }

    /// Marks the package as a catalog result rather than an installed one.
    #[must_use]
    pub fn available(mut self) -> Self {
        self.is_installed = false;
        self
    }

    /// The source this package belongs to. Fixed at construction.
    #[must_use]
    pub fn source(&self) -> SourceKind {
        self.source
    }

    /// Whether another source carries a package with the exact same name.
    #[must_use]
    pub fn has_conflict(&self) -> bool {
        self.conflicts_with.is_some()
    }

    /// How many other sources carry the same name, if any.
    #[must_use]
    pub fn conflicts_with(&self) -> Option<usize> {
        self.conflicts_with
    }

    /// Records the conflict state and keeps the summary prefix in sync.
    ///
    /// Any previously written warning is removed first, so applying the same state twice
    /// leaves the summary unchanged.
    pub(crate) fn set_conflict(&mut self, others: Option<usize>) {
        if let Some(previous) = self.conflicts_with.take() {
            let warning = conflict_warning(previous);
            if let Some(rest) = self.summary.strip_prefix(warning.as_str()) {
                self.summary = rest.to_string();
            }
        }
        if let Some(count) = others {
            self.summary = format!("{}{}", conflict_warning(count), self.summary);
            self.conflicts_with = Some(count);
        }
    }
}

impl std::fmt::Display for Package {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.name, self.source)
    }
}
