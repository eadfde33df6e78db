//! Integration tests for the job supervisor.

use std::time::Duration;

use dlp_supervisor::cli::{ProgressEvent, SpawnError};
use dlp_supervisor::supervisor::{Supervisor, SupervisorError};
use tokio::sync::mpsc::UnboundedReceiver;

const TEST_TIMEOUT: Duration = Duration::from_secs(10);

fn sh(script: &str) -> Vec<String> {
    vec!["sh".to_string(), "-c".to_string(), script.to_string()]
}

async fn collect(mut events: UnboundedReceiver<ProgressEvent>) -> Vec<ProgressEvent> {
    tokio::time::timeout(TEST_TIMEOUT, async move {
        let mut received = Vec::new();
        while let Some(event) = events.recv().await {
            received.push(event);
        }
        received
    })
    .await
    .expect("job did not finish in time")
}

fn completed_count(events: &[ProgressEvent]) -> usize {
    events.iter().filter(|e| e.is_terminal()).count()
}

#[test]
fn supervisor_error_display() {
    let err = SupervisorError::Spawn(SpawnError::NotFound {
        program: "yt-dlp".to_string(),
    });
    assert_eq!(
        err.to_string(),
        "Failed to start download tool: Executable not found: yt-dlp"
    );
}

#[tokio::test]
async fn spawn_failure_emits_no_events() {
    let result = Supervisor::new().start(vec![
        "/nonexistent/dlp-supervisor/yt-dlp".to_string(),
        "--newline".to_string(),
    ]);

    assert!(matches!(
        result,
        Err(SupervisorError::Spawn(SpawnError::NotFound { .. }))
    ));
}

#[cfg(unix)]
#[tokio::test]
async fn end_to_end_progress_sequence() {
    let script = "printf '%s\\n' '[info] vid1:' '[download] 10.0% of 5MiB' \
                  '[download] 55.0% of 5MiB' '[download] 100.0% of 5MiB'";
    let (handle, events) = Supervisor::new().start(sh(script)).unwrap();

    let received = collect(events).await;
    let outcome = handle.wait().await.unwrap();

    let raw = |text: &str| ProgressEvent::RawLine {
        text: text.to_string(),
    };
    assert_eq!(
        received,
        vec![
            raw("[info] vid1:"),
            ProgressEvent::NowDownloading {
                identifier: "vid1".to_string()
            },
            raw("[download] 10.0% of 5MiB"),
            ProgressEvent::DownloadPercent { value: 10.0 },
            raw("[download] 55.0% of 5MiB"),
            ProgressEvent::DownloadPercent { value: 55.0 },
            raw("[download] 100.0% of 5MiB"),
            ProgressEvent::DownloadPercent { value: 100.0 },
            ProgressEvent::Completed {
                exit_code: Some(0),
                cancelled: false
            },
        ]
    );
    assert!(outcome.success());
    assert_eq!(outcome.lines_read, 4);
}

#[cfg(unix)]
#[tokio::test]
async fn unrecognized_line_is_forwarded_once() {
    let (handle, events) = Supervisor::new()
        .start(sh("echo '[youtube] abc: Downloading webpage'"))
        .unwrap();

    let received = collect(events).await;
    handle.wait().await.unwrap();

    assert_eq!(received.len(), 2);
    assert_eq!(
        received[0].raw_text(),
        Some("[youtube] abc: Downloading webpage")
    );
    assert!(received[1].is_terminal());
}

#[cfg(unix)]
#[tokio::test]
async fn structured_events_follow_line_order() {
    let script = "for i in 1 2 3 4 5 6 7 8 9 10 11 12 13 14 15 16 17 18 19 20; do \
                  echo \"[download] $i.0% of 1MiB\"; done";
    let (handle, events) = Supervisor::new().start(sh(script)).unwrap();

    let received = collect(events).await;
    handle.wait().await.unwrap();

    let percents: Vec<f64> = received
        .iter()
        .filter_map(|e| match e {
            ProgressEvent::DownloadPercent { value } => Some(*value),
            _ => None,
        })
        .collect();
    let expected: Vec<f64> = (1..=20).map(f64::from).collect();
    assert_eq!(percents, expected);
    assert_eq!(completed_count(&received), 1);
    assert!(received.last().unwrap().is_terminal());
}

#[cfg(unix)]
#[tokio::test]
async fn stderr_lines_are_forwarded() {
    let (handle, events) = Supervisor::new()
        .start(sh("echo 'ERROR: Unsupported URL' >&2; exit 1"))
        .unwrap();

    let received = collect(events).await;
    let outcome = handle.wait().await.unwrap();

    assert_eq!(received[0].raw_text(), Some("ERROR: Unsupported URL"));
    assert_eq!(outcome.exit_code, Some(1));
    assert!(!outcome.success());
}

#[cfg(unix)]
#[tokio::test]
async fn interleaved_stdout_and_stderr_arrive_in_write_order() {
    let script = "echo o1; echo e1 >&2; echo o2; echo e2 >&2; echo o3";

    for _ in 0..30 {
        let (handle, events) = Supervisor::new().start(sh(script)).unwrap();
        let received = collect(events).await;
        handle.wait().await.unwrap();

        let texts: Vec<&str> = received.iter().filter_map(ProgressEvent::raw_text).collect();
        assert_eq!(texts, ["o1", "e1", "o2", "e2", "o3"]);
    }
}

#[cfg(unix)]
#[tokio::test]
async fn nonzero_exit_still_completes() {
    let (handle, events) = Supervisor::new()
        .start(sh("echo partial; exit 3"))
        .unwrap();

    let received = collect(events).await;
    handle.wait().await.unwrap();

    assert_eq!(
        received.last(),
        Some(&ProgressEvent::Completed {
            exit_code: Some(3),
            cancelled: false
        })
    );
}

#[cfg(unix)]
#[tokio::test]
async fn silent_process_completes_without_lines() {
    let (handle, events) = Supervisor::new().start(sh("exit 0")).unwrap();

    let received = collect(events).await;
    let outcome = handle.wait().await.unwrap();

    assert_eq!(
        received,
        vec![ProgressEvent::Completed {
            exit_code: Some(0),
            cancelled: false
        }]
    );
    assert_eq!(outcome.lines_read, 0);
}

#[cfg(unix)]
#[tokio::test]
async fn stdin_is_closed() {
    let (handle, events) = Supervisor::new().start(sh("cat; echo after")).unwrap();

    let received = collect(events).await;
    handle.wait().await.unwrap();

    assert_eq!(received[0].raw_text(), Some("after"));
}

#[cfg(unix)]
#[tokio::test]
async fn stop_twice_completes_once() {
    let script = "while true; do echo '[download] 1.0% of 1MiB'; sleep 0.05; done";
    let (handle, mut events) = Supervisor::new().start(sh(script)).unwrap();

    let first = tokio::time::timeout(TEST_TIMEOUT, events.recv())
        .await
        .unwrap()
        .unwrap();
    assert!(first.raw_text().is_some());

    handle.stop();
    handle.stop();

    let rest = collect(events).await;
    let outcome = tokio::time::timeout(TEST_TIMEOUT, handle.wait())
        .await
        .unwrap()
        .unwrap();

    assert_eq!(completed_count(&rest), 1);
    assert!(matches!(
        rest.last(),
        Some(ProgressEvent::Completed {
            cancelled: true,
            ..
        })
    ));
    assert!(outcome.cancelled);
}

#[cfg(unix)]
#[tokio::test]
async fn stop_after_finish_is_noop() {
    let (handle, events) = Supervisor::new().start(sh("echo done")).unwrap();
    let control = handle.stop_handle();

    let received = collect(events).await;
    let outcome = handle.wait().await.unwrap();

    control.stop();
    control.kill();

    assert!(control.is_stop_requested());
    assert!(!outcome.cancelled);
    assert_eq!(completed_count(&received), 1);
}

#[cfg(unix)]
#[tokio::test]
async fn kill_terminates_silent_process() {
    let (handle, events) = Supervisor::new().start(sh("exec sleep 30")).unwrap();

    handle.kill();

    let received = collect(events).await;
    let outcome = tokio::time::timeout(TEST_TIMEOUT, handle.wait())
        .await
        .unwrap()
        .unwrap();

    assert!(outcome.cancelled);
    assert_eq!(outcome.exit_code, None);
    assert_eq!(
        received,
        vec![ProgressEvent::Completed {
            exit_code: None,
            cancelled: true
        }]
    );
}

#[cfg(unix)]
#[tokio::test]
async fn state_is_finished_after_completion() {
    use dlp_supervisor::supervisor::JobState;

    let (handle, events) = Supervisor::new().start(sh("echo hi")).unwrap();
    assert!(matches!(
        handle.state(),
        JobState::Running | JobState::Finished
    ));

    collect(events).await;
    assert_eq!(handle.state(), JobState::Finished);
    assert!(handle.is_finished());
    handle.wait().await.unwrap();
}

#[cfg(unix)]
#[tokio::test]
async fn working_dir_is_applied() {
    use dlp_supervisor::supervisor::SupervisorOptions;

    let dir = tempfile::tempdir().unwrap();
    let supervisor = Supervisor::with_options(SupervisorOptions {
        working_dir: Some(dir.path().to_path_buf()),
        ..Default::default()
    });

    let (handle, events) = supervisor.start(sh("pwd -P")).unwrap();
    let received = collect(events).await;
    handle.wait().await.unwrap();

    let expected = dir
        .path()
        .canonicalize()
        .unwrap()
        .to_string_lossy()
        .into_owned();
    assert_eq!(received[0].raw_text(), Some(expected.as_str()));
}

#[cfg(unix)]
#[tokio::test]
async fn dropped_receiver_does_not_block_job() {
    let (handle, events) = Supervisor::new()
        .start(sh("for i in 1 2 3; do echo line$i; done"))
        .unwrap();
    drop(events);

    let outcome = tokio::time::timeout(TEST_TIMEOUT, handle.wait())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(outcome.lines_read, 3);
    assert!(outcome.success());
}
