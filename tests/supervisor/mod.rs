//! Supervisor module tests.

mod runner_test;

/// Verify all public supervisor types are exported from the library.
#[test]
fn test_all_supervisor_types_exported() {
    use dlp_supervisor::supervisor::{
        EventEmitter, JobOutcome, JobState, JobStateMachine, ProgressTracker, Supervisor,
        SupervisorError, SupervisorOptions, DEFAULT_TERMINATE_TIMEOUT,
    };

    let _ = Supervisor::with_options(SupervisorOptions::default());
    let _ = JobStateMachine::new();
    let _ = ProgressTracker::new();
    let (_emitter, _rx) = EventEmitter::channel();

    let _: fn() -> SupervisorError = || SupervisorError::EmptyCommand;
    let _ = JobState::Idle;
    let _ = JobOutcome {
        exit_code: None,
        cancelled: false,
        lines_read: 0,
    };
    assert!(DEFAULT_TERMINATE_TIMEOUT.as_secs() >= 1);
}
