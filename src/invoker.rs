//! External tool invocation.
//!
//! Every adapter talks to its backend through [`ToolInvoker`]. The production
//! implementation, [`ProcessInvoker`], blocks the caller until the child exits. It only
//! enforces a time limit or honours cancellation when explicitly configured to.

use std::process::Stdio;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use shell_escape::escape;
use tokio::process::Command;
use tokio::runtime::Runtime;
use tokio::sync::Notify;
use tokio::time::timeout;
use tracing::{debug, trace};

use crate::errors::{OrbitError, Result};

/// A program and its arguments. Nothing is passed through a shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl ToolCommand {
    pub fn new<S: Into<String>>(program: S) -> Self {
        ToolCommand {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Runs `tool` through a privilege-escalation program such as `pkexec`.
    pub fn privileged<P: Into<String>, T: Into<String>>(prefix: P, tool: T) -> Self {
        ToolCommand::new(prefix).arg(tool)
    }

    #[must_use]
    pub fn arg<S: Into<String>>(mut self, arg: S) -> Self {
        self.args.push(arg.into());
        self
    }

    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }
}

impl std::fmt::Display for ToolCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", escape(self.program.as_str().into()))?;
        for arg in &self.args {
            write!(f, " {}", escape(arg.as_str().into()))?;
        }
        Ok(())
    }
}

/// Captured result of a finished process.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub code: Option<i32>,
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    /// A successful run that printed `stdout`.
    pub fn ok<S: Into<String>>(stdout: S) -> Self {
        CommandOutput {
            code: Some(0),
            success: true,
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    /// A run that exited with a non-zero `code`.
    pub fn failed<S: Into<String>>(code: i32, stderr: S) -> Self {
        CommandOutput {
            code: Some(code),
            success: false,
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }
}

impl From<std::process::Output> for CommandOutput {
    fn from(output: std::process::Output) -> Self {
        CommandOutput {
            code: output.status.code(),
            success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        }
    }
}

/// Runs external programs on behalf of the adapters.
#[cfg_attr(test, mockall::automock)]
pub trait ToolInvoker {
    /// Whether `program` can be found on this system.
    fn is_available(&self, program: &str) -> bool;

    /// Runs the command to completion and captures its output.
    ///
    /// A non-zero exit is reported through [`CommandOutput::success`], not as an error.
    fn run(&self, command: &ToolCommand) -> Result<CommandOutput>;
}

#[derive(Debug, Default)]
struct CancelState {
    cancelled: AtomicBool,
    notify: Notify,
}

/// Shared flag that aborts in-flight invocations and pending batch items.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    inner: Arc<CancelState>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.inner.cancelled.store(true, Ordering::SeqCst);
        self.inner.notify.notify_waiters();
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::SeqCst)
    }

    /// Resolves once [`cancel`](Self::cancel) has been called.
    pub async fn cancelled(&self) {
        loop {
            let notified = self.inner.notify.notified();
            if self.is_cancelled() {
                return;
            }
            notified.await;
        }
    }
}

/// Spawns real processes through `tokio::process` on an owned runtime.
#[derive(Debug)]
pub struct ProcessInvoker {
    runtime: Runtime,
    timeout: Option<Duration>,
    cancellation: CancellationToken,
}

impl ProcessInvoker {
    /// Creates an invoker without a time limit.
    pub fn new() -> Result<Self> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        Ok(ProcessInvoker {
            runtime,
            timeout: None,
            cancellation: CancellationToken::new(),
        })
    }

    #[must_use]
    pub fn with_timeout(mut self, limit: Option<Duration>) -> Self {
        self.timeout = limit;
        self
    }

    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    fn spawn_error(command: &ToolCommand, err: std::io::Error) -> OrbitError {
        if err.kind() == std::io::ErrorKind::NotFound {
            OrbitError::ToolNotFound(command.program.clone())
        } else {
            OrbitError::command_failed(command.to_string(), err.to_string())
        }
    }

    async fn run_async(&self, command: &ToolCommand) -> Result<CommandOutput> {
        if self.cancellation.is_cancelled() {
            return Err(OrbitError::Cancelled(command.to_string()));
        }

        let mut child = Command::new(&command.program);
        child
            .args(&command.args)
            .stdin(Stdio::null())
            .kill_on_drop(true);

        let finished = async {
            let output = child.output();
            match self.timeout {
                Some(limit) => match timeout(limit, output).await {
                    Ok(result) => result.map_err(|e| Self::spawn_error(command, e)),
                    Err(_) => Err(OrbitError::Timeout {
                        command: command.to_string(),
                        seconds: limit.as_secs(),
                    }),
                },
                None => output.await.map_err(|e| Self::spawn_error(command, e)),
            }
        };

        tokio::select! {
            result = finished => result.map(CommandOutput::from),
            _ = self.cancellation.cancelled() => Err(OrbitError::Cancelled(command.to_string())),
        }
    }
}

impl ToolInvoker for ProcessInvoker {
    fn is_available(&self, program: &str) -> bool {
        which::which(program).is_ok()
    }

    fn run(&self, command: &ToolCommand) -> Result<CommandOutput> {
        debug!(command = %command, "Running tool command");
        let output = self.runtime.block_on(self.run_async(command))?;
        trace!(
            command = %command,
            code = ?output.code,
            stdout_bytes = output.stdout.len(),
            "Tool command finished"
        );
        Ok(output)
    }
}
