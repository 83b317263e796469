use crate::data::{Package, SourceKind};
use crate::errors::Result;

/// The capability set every package source exposes.
///
/// Listing and searching never fail because a backend is missing: a source whose tool is
/// not installed reports no packages. Mutations return `Ok(false)` when the tool ran and
/// failed; `Err` is reserved for faults outside that contract.
pub trait PackageAdapter {
    /// The source tag every package from this adapter carries.
    fn source(&self) -> SourceKind;

    /// Whether the backend can be used on this system.
    fn is_available(&self) -> bool;

    fn list_installed(&self) -> Result<Vec<Package>>;

    /// Queries the backend's catalog. Sources without one return an empty list.
    fn search(&self, query: &str) -> Result<Vec<Package>>;

    fn update(&self, id: &str) -> Result<bool>;

    fn remove(&self, id: &str) -> Result<bool>;

    /// The install capability, for sources backed by a catalog.
    fn installer(&self) -> Option<&dyn InstallCapable> {
        None
    }

    /// Fills optional fields of `package` in place. Defaults to leaving it unchanged.
    fn get_details(&self, _package: &mut Package) -> Result<()> {
        Ok(())
    }

    fn supports_install(&self) -> bool {
        self.installer().is_some()
    }
}

/// Sources that can install new packages from their catalog.
pub trait InstallCapable {
    fn install(&self, id: &str) -> Result<bool>;
}
