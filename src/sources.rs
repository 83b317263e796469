//! Package source adapters.
//!
//! Each adapter translates the [`PackageAdapter`] contract into one backend's command
//! line and parses that backend's text output into [`Package`](crate::data::Package)
//! values.
//!
//! | Source | Listing | Search | Install |
//! |---|---|---|---|
//! | [`AptSource`] | `dpkg-query -W` | no | no |
//! | [`DnfSource`] | `dnf list installed` | no | no |
//! | [`PacmanSource`] | `pacman -Qe` | no | no |
//! | [`FlatpakSource`] | `flatpak list` | `flatpak search` | yes |
//! | [`SnapSource`] | `snap list` | `snap find` | yes |
//! | [`AppImageSource`] | directory scan | no | no |

use tracing::{debug, info, warn};

use crate::errors::{OrbitError, Result};
use crate::invoker::{ToolCommand, ToolInvoker};

pub mod appimage;
pub mod apt;
pub mod dnf;
pub mod flatpak;
pub mod pacman;
pub mod parsing;
pub mod snap;
pub mod traits;

pub use appimage::AppImageSource;
pub use apt::AptSource;
pub use dnf::DnfSource;
pub use flatpak::FlatpakSource;
pub use pacman::PacmanSource;
pub use snap::SnapSource;
pub use traits::{InstallCapable, PackageAdapter};

/// Default privilege-escalation program for system-wide changes.
pub const DEFAULT_PRIVILEGE_COMMAND: &str = "pkexec";

/// Runs a read-only query and returns its stdout.
///
/// Returns `None` when `tool` is not installed, when the process cannot be run, or when it
/// exits non-zero. Callers treat all three as "nothing found".
pub(crate) fn query_output(
    invoker: &dyn ToolInvoker,
    tool: &str,
    command: &ToolCommand,
) -> Option<String> {
    if !invoker.is_available(tool) {
        debug!(tool, "Tool not installed, skipping query");
        return None;
    }

    match invoker.run(command) {
        Ok(output) if output.success => Some(output.stdout),
        Ok(output) => {
            debug!(
                command = %command,
                code = ?output.code,
                stderr = %output.stderr.trim(),
                "Query exited unsuccessfully"
            );
            None
        }
        Err(e) => {
            warn!(command = %command, error = %e, "Query could not be run");
            None
        }
    }
}

/// Runs a mutating command; `Ok(false)` when the tool exits non-zero.
pub(crate) fn run_mutation(invoker: &dyn ToolInvoker, command: &ToolCommand) -> Result<bool> {
    info!(command = %command, "Running package operation");
    let output = invoker.run(command)?;
    if !output.success {
        warn!(
            command = %command,
            code = ?output.code,
            stderr = %output.stderr.trim(),
            "Package operation failed"
        );
    }
    Ok(output.success)
}

/// Rejects identifiers that could be read as options or break argument boundaries.
pub fn validate_package_id(id: &str) -> Result<()> {
    if id.is_empty() {
        return Err(OrbitError::invalid_package(id, "empty identifier"));
    }
    if id.starts_with('-') {
        return Err(OrbitError::invalid_package(id, "identifier starts with '-'"));
    }
    if id.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return Err(OrbitError::invalid_package(
            id,
            "identifier contains whitespace or control characters",
        ));
    }
    Ok(())
}
