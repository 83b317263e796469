//! Integration tests for the Orbit orchestrator
//!
//! These tests drive `OrbitManager` through the public API with mock adapters and a
//! canned tool invoker, so no real package manager is ever executed.

pub mod orchestrator;

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use orbit::data::{Package, SourceKind};
use orbit::errors::{OrbitError, Result};
use orbit::invoker::{CommandOutput, ToolCommand, ToolInvoker};
use orbit::sources::{InstallCapable, PackageAdapter};

/// Shared record of every mutation call, as `"<action> <id>"`.
pub type CallLog = Rc<RefCell<Vec<String>>>;

/// Mock package source that never spawns a process
pub struct MockAdapter {
    pub source: SourceKind,
    pub installed: Vec<Package>,
    pub catalog: Vec<Package>,
    /// Ids whose mutations raise an unexpected fault instead of returning a result
    pub faulty: Vec<String>,
    pub can_install: bool,
    pub tool_absent: bool,
    pub calls: CallLog,
}

impl MockAdapter {
    pub fn new(source: SourceKind) -> Self {
        Self {
            source,
            installed: Vec::new(),
            catalog: Vec::new(),
            faulty: Vec::new(),
            can_install: false,
            tool_absent: false,
            calls: CallLog::default(),
        }
    }

    pub fn with_installed(mut self, id: &str, name: &str) -> Self {
        self.installed.push(Package::new(id, name, self.source, "1.0"));
        self
    }

    pub fn with_package(mut self, package: Package) -> Self {
        self.installed.push(package);
        self
    }

    pub fn with_catalog(mut self, id: &str, name: &str) -> Self {
        self.catalog.push(Package::new(id, name, self.source, "2.0").available());
        self
    }

    pub fn with_fault(mut self, id: &str) -> Self {
        self.faulty.push(id.to_string());
        self
    }

    pub fn installing(mut self) -> Self {
        self.can_install = true;
        self
    }

    /// Behaves like a source whose tool is not installed.
    pub fn absent(mut self) -> Self {
        self.tool_absent = true;
        self
    }

    pub fn logging_to(mut self, calls: &CallLog) -> Self {
        self.calls = Rc::clone(calls);
        self
    }

    fn mutate(&self, action: &str, id: &str) -> Result<bool> {
        self.calls.borrow_mut().push(format!("{action} {id}"));
        if self.faulty.iter().any(|f| f == id) {
            return Err(OrbitError::command_failed(
                format!("mock {action} {id}"),
                "connection reset",
            ));
        }
        Ok(!self.tool_absent)
    }
}

impl PackageAdapter for MockAdapter {
    fn source(&self) -> SourceKind {
        self.source
    }

    fn is_available(&self) -> bool {
        !self.tool_absent
    }

    fn list_installed(&self) -> Result<Vec<Package>> {
        if self.tool_absent {
            return Ok(Vec::new());
        }
        Ok(self.installed.clone())
    }

    fn search(&self, query: &str) -> Result<Vec<Package>> {
        if self.tool_absent {
            return Ok(Vec::new());
        }
        let query = query.to_lowercase();
        Ok(self
            .catalog
            .iter()
            .filter(|pkg| {
                pkg.id.to_lowercase().contains(&query) || pkg.name.to_lowercase().contains(&query)
            })
            .cloned()
            .collect())
    }

    fn update(&self, id: &str) -> Result<bool> {
        self.mutate("update", id)
    }

    fn remove(&self, id: &str) -> Result<bool> {
        self.mutate("remove", id)
    }

    fn installer(&self) -> Option<&dyn InstallCapable> {
        self.can_install.then_some(self as &dyn InstallCapable)
    }
}

impl InstallCapable for MockAdapter {
    fn install(&self, id: &str) -> Result<bool> {
        self.mutate("install", id)
    }
}

/// Invoker that answers each installed program with fixed stdout
#[derive(Default)]
pub struct CannedInvoker {
    outputs: HashMap<String, String>,
}

impl CannedInvoker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tool(mut self, program: &str, stdout: &str) -> Self {
        self.outputs.insert(program.to_string(), stdout.to_string());
        self
    }
}

impl ToolInvoker for CannedInvoker {
    fn is_available(&self, program: &str) -> bool {
        self.outputs.contains_key(program)
    }

    fn run(&self, command: &ToolCommand) -> Result<CommandOutput> {
        self.outputs
            .get(&command.program)
            .map(|stdout| CommandOutput::ok(stdout.as_str()))
            .ok_or_else(|| OrbitError::ToolNotFound(command.program.clone()))
    }
}
