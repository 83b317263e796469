//! Orbit - one interface over the Linux package managers on a system
//!
//! This library lists, searches, installs, updates and removes software across APT, DNF,
//! Pacman, Flatpak, Snap and loose AppImage files without the caller knowing which backend
//! owns a given package.
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use orbit::{AdapterRegistry, OrbitConfig, OrbitManager, ProcessInvoker};
//!
//! # fn example() -> Result<(), orbit::OrbitError> {
//! let config = OrbitConfig::load()?;
//! let invoker = Arc::new(ProcessInvoker::new()?.with_timeout(config.command_timeout()));
//! let mut manager = OrbitManager::new(AdapterRegistry::with_defaults(&config, invoker));
//!
//! for package in manager.refresh() {
//!     println!("{package}");
//! }
//! # Ok(())
//! # }
//! ```

pub mod backup;
pub mod batch;
pub mod commands;
pub mod configuration;
pub mod conflicts;
pub mod data;
pub mod errors;
pub mod invoker;
pub mod manager;
pub mod notifications;
pub mod registry;
pub mod sources;
pub mod statistics;
pub mod traits;

// Re-export commonly used types
pub use batch::{BatchResult, BatchRunner};
pub use configuration::OrbitConfig;
pub use data::{Package, SourceKind, UpdateStatus};
pub use errors::{OrbitError, Result};
pub use invoker::{CancellationToken, ProcessInvoker, ToolInvoker};
pub use manager::OrbitManager;
pub use registry::AdapterRegistry;
pub use statistics::StatsSummary;
pub use traits::Exportable;
