//! Download tool process spawning and control.
//!
//! A [`ToolProcess`] wraps the child started from an argument vector whose
//! first element is the program. On Unix the child's stdout and stderr share
//! one pipe, so lines arrive in the order the tool wrote them. Stdin is
//! closed.

use std::path::Path;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

#[cfg(unix)]
use tokio::net::unix::pipe;
#[cfg(not(unix))]
use tokio::process::{ChildStderr, ChildStdout};
use tokio::process::{Child, Command};

use super::LineStream;

/// Error type for process spawning operations.
#[derive(thiserror::Error, Debug)]
pub enum SpawnError {
    /// The executable was not found.
    #[error("Executable not found: {program}")]
    NotFound {
        /// Program that was requested.
        program: String,
    },
    /// Permission denied when spawning.
    #[error("Permission denied: {program}")]
    PermissionDenied {
        /// Program that was requested.
        program: String,
    },
    /// Other I/O error.
    #[error("I/O error spawning {program}: {source}")]
    Io {
        /// Program that was requested.
        program: String,
        /// Underlying error.
        source: std::io::Error,
    },
}

impl SpawnError {
    /// Create a `SpawnError` from an I/O error, classifying common cases.
    fn from_io(program: &str, err: std::io::Error) -> Self {
        let program = program.to_string();
        match err.kind() {
            std::io::ErrorKind::NotFound => Self::NotFound { program },
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied { program },
            _ => Self::Io {
                program,
                source: err,
            },
        }
    }
}

/// Read side of the tool's combined stdout and stderr.
#[derive(Debug)]
pub struct ToolOutput {
    #[cfg(unix)]
    reader: pipe::Receiver,
    #[cfg(not(unix))]
    pipes: (ChildStdout, ChildStderr),
}

impl ToolOutput {
    /// Turn the output into a stream of lines.
    #[must_use]
    pub fn into_lines(self) -> LineStream {
        #[cfg(unix)]
        {
            Box::pin(super::read_lines(self.reader))
        }

        #[cfg(not(unix))]
        {
            let (stdout, stderr) = self.pipes;
            super::merge_lines(stdout, stderr)
        }
    }
}

/// A running download tool process.
#[derive(Debug)]
pub struct ToolProcess {
    child: Child,
    #[cfg(unix)]
    output: Option<ToolOutput>,
}

impl ToolProcess {
    /// Spawn `program` with `args`, capturing stdout and stderr.
    ///
    /// Must be called from within a Tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns `SpawnError` if the output pipe cannot be created or the
    /// process fails to spawn.
    pub fn spawn(
        program: &str,
        args: &[String],
        working_dir: Option<&Path>,
    ) -> Result<Self, SpawnError> {
        let mut cmd = Command::new(program);
        cmd.args(args).stdin(Stdio::null());

        if let Some(dir) = working_dir {
            cmd.current_dir(dir);
        }

        #[cfg(unix)]
        let output =
            Self::attach_shared_pipe(&mut cmd).map_err(|e| SpawnError::from_io(program, e))?;
        #[cfg(not(unix))]
        cmd.stdout(Stdio::piped()).stderr(Stdio::piped());

        let child = cmd.spawn().map_err(|e| SpawnError::from_io(program, e))?;
        tracing::debug!(program, pid = ?child.id(), "Spawned download tool");

        // The parent's copies of the write end live in `cmd` and close here.
        drop(cmd);

        Ok(Self {
            child,
            #[cfg(unix)]
            output: Some(output),
        })
    }

    /// Point both stdout and stderr of `cmd` at the write end of one pipe.
    #[cfg(unix)]
    fn attach_shared_pipe(cmd: &mut Command) -> std::io::Result<ToolOutput> {
        let (writer, reader) = pipe::pipe()?;
        let writer = writer.into_blocking_fd()?;
        cmd.stdout(Stdio::from(writer.try_clone()?))
            .stderr(Stdio::from(writer));
        Ok(ToolOutput { reader })
    }

    /// Take the output reader.
    ///
    /// Returns `None` once it has been taken.
    pub fn take_output(&mut self) -> Option<ToolOutput> {
        #[cfg(unix)]
        {
            self.output.take()
        }

        #[cfg(not(unix))]
        {
            match (self.child.stdout.take(), self.child.stderr.take()) {
                (Some(stdout), Some(stderr)) => Some(ToolOutput {
                    pipes: (stdout, stderr),
                }),
                _ => None,
            }
        }
    }

    /// Process ID, or `None` once the child has been reaped.
    #[must_use]
    pub fn id(&self) -> Option<u32> {
        self.child.id()
    }

    /// Wait for the process to exit.
    ///
    /// # Errors
    ///
    /// Returns an error if waiting fails.
    pub async fn wait(&mut self) -> std::io::Result<ExitStatus> {
        self.child.wait().await
    }

    /// Send SIGKILL without waiting for the process to exit.
    ///
    /// # Errors
    ///
    /// Returns an error if the signal cannot be sent.
    pub fn start_kill(&mut self) -> std::io::Result<()> {
        self.child.start_kill()
    }

    /// Ask the process to terminate, killing it if it is still alive after
    /// `timeout`. Without Unix signals the process is killed right away.
    ///
    /// # Errors
    ///
    /// Returns an error if the process cannot be killed or reaped.
    pub async fn graceful_terminate(&mut self, timeout: Duration) -> std::io::Result<()> {
        let Some(pid) = self.id() else {
            return Ok(());
        };

        #[cfg(unix)]
        {
            use nix::sys::signal::{kill, Signal};
            use nix::unistd::Pid;

            let target = Pid::from_raw(i32::try_from(pid).unwrap_or(i32::MAX));
            match kill(target, Signal::SIGTERM) {
                Ok(()) => tracing::debug!(pid, "Sent SIGTERM"),
                Err(e) => tracing::debug!(pid, error = %e, "SIGTERM failed"),
            }

            if let Ok(status) = tokio::time::timeout(timeout, self.child.wait()).await {
                return status.map(drop);
            }
            tracing::warn!(pid, ?timeout, "Process outlived SIGTERM, killing");
        }

        #[cfg(not(unix))]
        let _ = timeout;

        self.child.kill().await
    }
}
