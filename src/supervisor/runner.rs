//! Supervisor runner for download jobs.
//!
//! [`Supervisor::start`] spawns the download tool and hands its merged
//! output to a reader task. The task forwards every line through the
//! [`EventEmitter`], stops reading when asked to, waits for the process to
//! exit and then sends a single `Completed` event.

use std::path::PathBuf;
use std::process::ExitStatus;
use std::time::Duration;

use tokio::sync::mpsc::UnboundedReceiver;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_stream::StreamExt;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use crate::cli::{LineStream, ProgressEvent, SpawnError, StreamError, ToolProcess};
use crate::supervisor::{EventEmitter, JobState, JobStateMachine};

/// Default timeout between SIGTERM and SIGKILL when a job is killed.
pub const DEFAULT_TERMINATE_TIMEOUT: Duration = Duration::from_secs(5);

/// Error type for supervisor operations.
#[derive(thiserror::Error, Debug)]
pub enum SupervisorError {
    /// The argument vector did not name a program.
    #[error("No program given")]
    EmptyCommand,
    /// The download tool could not be started.
    #[error("Failed to start download tool: {0}")]
    Spawn(#[from] SpawnError),
    /// The process output could not be attached.
    #[error(transparent)]
    Stream(#[from] StreamError),
    /// The reader task panicked or was aborted.
    #[error("Job task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Options applied to every job started by a [`Supervisor`].
#[derive(Debug, Clone)]
pub struct SupervisorOptions {
    /// Grace period after SIGTERM before the process is killed.
    pub terminate_timeout: Duration,
    /// Working directory for the spawned process.
    pub working_dir: Option<PathBuf>,
}

impl Default for SupervisorOptions {
    fn default() -> Self {
        Self {
            terminate_timeout: DEFAULT_TERMINATE_TIMEOUT,
            working_dir: None,
        }
    }
}

/// Final result of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JobOutcome {
    /// Exit code, if the process exited normally and was reaped.
    pub exit_code: Option<i32>,
    /// Whether the job was stopped or killed on request.
    pub cancelled: bool,
    /// Number of output lines read before the stream was closed.
    pub lines_read: usize,
}

impl JobOutcome {
    /// Returns true if the process exited with status 0 and was not cancelled.
    #[must_use]
    pub fn success(&self) -> bool {
        !self.cancelled && self.exit_code == Some(0)
    }
}

/// Starts supervised download jobs.
///
/// The supervisor holds no per-job state; every call to [`start`](Self::start)
/// creates an independent job.
#[derive(Debug, Clone, Default)]
pub struct Supervisor {
    options: SupervisorOptions,
}

impl Supervisor {
    /// Create a supervisor with default options.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a supervisor with custom options.
    #[must_use]
    pub fn with_options(options: SupervisorOptions) -> Self {
        Self { options }
    }

    /// Get the supervisor options.
    #[must_use]
    pub fn options(&self) -> &SupervisorOptions {
        &self.options
    }

    /// Start a job for `arguments`, whose first element is the program.
    ///
    /// Returns a handle for controlling the job and the receiver its events
    /// are delivered on. Must be called from within a Tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns `SupervisorError::EmptyCommand` for an empty vector and
    /// `SupervisorError::Spawn` if the process cannot be started. No events
    /// are emitted in either case.
    pub fn start(
        &self,
        arguments: Vec<String>,
    ) -> Result<(JobHandle, UnboundedReceiver<ProgressEvent>), SupervisorError> {
        let (program, args) = arguments
            .split_first()
            .ok_or(SupervisorError::EmptyCommand)?;

        let mut process = ToolProcess::spawn(program, args, self.options.working_dir.as_deref())?;

        let Some(output) = process.take_output() else {
            if let Err(e) = process.start_kill() {
                tracing::warn!(error = %e, "Failed to kill process without output pipe");
            }
            return Err(StreamError::NoOutput.into());
        };

        tracing::info!(
            program = %program,
            pid = ?process.id(),
            args = args.len(),
            "Download job started"
        );
        Ok(self.launch(process, output.into_lines()))
    }

    /// Hand a spawned process and its output lines to a new reader task.
    fn launch(
        &self,
        process: ToolProcess,
        lines: LineStream,
    ) -> (JobHandle, UnboundedReceiver<ProgressEvent>) {
        let pid = process.id();
        let stop = CancellationToken::new();
        let kill = CancellationToken::new();
        let (emitter, events) = EventEmitter::channel();

        let mut state = JobStateMachine::new();
        state.transition(JobState::Running);
        let (state_tx, state_rx) = watch::channel(state.state());

        let job = Job {
            process,
            state,
            state_tx,
            emitter,
            stop: stop.clone(),
            kill: kill.clone(),
            terminate_timeout: self.options.terminate_timeout,
        };

        let span = tracing::info_span!("job", ?pid);
        let task = tokio::spawn(job.run(lines).instrument(span));

        (
            JobHandle {
                pid,
                control: StopHandle { stop, kill },
                state_rx,
                task,
            },
            events,
        )
    }
}

/// Cloneable control for requesting a job to stop.
#[derive(Debug, Clone)]
pub struct StopHandle {
    stop: CancellationToken,
    kill: CancellationToken,
}

impl StopHandle {
    /// Ask the reader to stop. The output stream is closed and the process
    /// is waited for; no signal is sent. Calling this again, or after the
    /// job finished, does nothing.
    pub fn stop(&self) {
        if !self.stop.is_cancelled() {
            tracing::debug!("Stop requested");
        }
        self.stop.cancel();
    }

    /// Stop the job and terminate the process: SIGTERM, then SIGKILL after
    /// the terminate timeout (immediate kill on non-Unix platforms).
    pub fn kill(&self) {
        if !self.kill.is_cancelled() {
            tracing::debug!("Kill requested");
        }
        self.kill.cancel();
        self.stop.cancel();
    }

    /// Returns true once `stop` or `kill` has been called.
    #[must_use]
    pub fn is_stop_requested(&self) -> bool {
        self.stop.is_cancelled()
    }
}

/// Handle to a running job.
#[derive(Debug)]
pub struct JobHandle {
    pid: Option<u32>,
    control: StopHandle,
    state_rx: watch::Receiver<JobState>,
    task: JoinHandle<JobOutcome>,
}

impl JobHandle {
    /// Process ID captured at spawn.
    #[must_use]
    pub fn id(&self) -> Option<u32> {
        self.pid
    }

    /// See [`StopHandle::stop`].
    pub fn stop(&self) {
        self.control.stop();
    }

    /// See [`StopHandle::kill`].
    pub fn kill(&self) {
        self.control.kill();
    }

    /// A cloneable control usable after this handle is consumed by `wait`.
    #[must_use]
    pub fn stop_handle(&self) -> StopHandle {
        self.control.clone()
    }

    /// Current state as last published by the reader task.
    #[must_use]
    pub fn state(&self) -> JobState {
        *self.state_rx.borrow()
    }

    /// Returns true once the job has finished.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.state().is_finished() || self.task.is_finished()
    }

    /// Wait for the job to finish.
    ///
    /// # Errors
    ///
    /// Returns `SupervisorError::Join` if the reader task panicked.
    pub async fn wait(self) -> Result<JobOutcome, SupervisorError> {
        Ok(self.task.await?)
    }
}

enum WaitOutcome {
    Exited(std::io::Result<ExitStatus>),
    KillRequested,
}

/// One supervised run, owned by its reader task.
struct Job {
    process: ToolProcess,
    state: JobStateMachine,
    state_tx: watch::Sender<JobState>,
    emitter: EventEmitter,
    stop: CancellationToken,
    kill: CancellationToken,
    terminate_timeout: Duration,
}

impl Job {
    async fn run(mut self, mut lines: LineStream) -> JobOutcome {
        let mut cancelled = false;

        loop {
            tokio::select! {
                biased;

                () = self.stop.cancelled() => {
                    tracing::info!(lines = self.state.lines_read(), "Job stopped on request");
                    cancelled = true;
                    break;
                }
                next = lines.next() => match next {
                    Some(Ok(line)) => {
                        self.state.record_line();
                        tracing::trace!(%line, "Output line");
                        self.emitter.emit_line(&line);
                    }
                    Some(Err(e)) => {
                        let err = StreamError::Read(e);
                        tracing::warn!(error = %err, "Output stream failed, treating as end of stream");
                        self.emitter.emit_error(err.to_string());
                        break;
                    }
                    None => {
                        tracing::debug!(lines = self.state.lines_read(), "Output stream ended");
                        break;
                    }
                },
            }
        }

        if cancelled {
            self.set_state(JobState::StopRequested);
        }

        // Closing the read ends lets the tool see a broken pipe on its next write.
        drop(lines);

        let exit_code = self.wait_for_exit().await;

        self.set_state(JobState::Finished);
        tracing::info!(?exit_code, cancelled, "Download job finished");
        self.emitter.complete(exit_code, cancelled);

        JobOutcome {
            exit_code,
            cancelled,
            lines_read: self.state.lines_read(),
        }
    }

    async fn wait_for_exit(&mut self) -> Option<i32> {
        let outcome = tokio::select! {
            biased;

            () = self.kill.cancelled() => WaitOutcome::KillRequested,
            status = self.process.wait() => WaitOutcome::Exited(status),
        };

        let status = match outcome {
            WaitOutcome::Exited(status) => status,
            WaitOutcome::KillRequested => {
                if let Err(e) = self.process.graceful_terminate(self.terminate_timeout).await {
                    tracing::warn!(error = %e, "Failed to terminate process");
                }
                self.process.wait().await
            }
        };

        match status {
            Ok(status) => {
                self.state.record_exit();
                status.code()
            }
            Err(e) => {
                let err = StreamError::Wait(e);
                tracing::warn!(error = %err, "Could not observe process exit");
                self.emitter.emit_error(err.to_string());
                None
            }
        }
    }

    fn set_state(&mut self, next: JobState) {
        if self.state.transition(next) {
            self.state_tx.send_replace(next);
        }
    }
}
