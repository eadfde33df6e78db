//! Routes output lines and parsed events to the observer.

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use crate::cli::{classify_all, ProgressEvent};

/// Sends a job's events to its observer over an unbounded channel.
///
/// Sending never blocks, so a slow observer cannot stall the reader. Once
/// the terminal event has been sent the emitter is sealed and drops
/// anything else.
#[derive(Debug)]
pub struct EventEmitter {
    tx: UnboundedSender<ProgressEvent>,
    sealed: bool,
    receiver_gone: bool,
}

impl EventEmitter {
    /// Create an emitter and the receiver the observer reads from.
    #[must_use]
    pub fn channel() -> (Self, UnboundedReceiver<ProgressEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new(tx), rx)
    }

    /// Wrap an existing sender.
    #[must_use]
    pub fn new(tx: UnboundedSender<ProgressEvent>) -> Self {
        Self {
            tx,
            sealed: false,
            receiver_gone: false,
        }
    }

    /// Forward one output line: the raw text first, then every event parsed
    /// from it in pattern order.
    pub fn emit_line(&mut self, line: &str) {
        self.emit(ProgressEvent::RawLine {
            text: line.to_string(),
        });
        for event in classify_all(line) {
            self.emit(event);
        }
    }

    /// Report a non-fatal stream or wait failure.
    pub fn emit_error(&mut self, message: impl Into<String>) {
        self.emit(ProgressEvent::StreamError {
            message: message.into(),
        });
    }

    /// Send the terminal event. Only the first call has an effect.
    pub fn complete(&mut self, exit_code: Option<i32>, cancelled: bool) {
        self.emit(ProgressEvent::Completed {
            exit_code,
            cancelled,
        });
    }

    /// Whether the terminal event has been sent.
    #[must_use]
    pub fn is_sealed(&self) -> bool {
        self.sealed
    }

    fn emit(&mut self, event: ProgressEvent) {
        if self.sealed {
            tracing::debug!(?event, "Dropping event after completion");
            return;
        }
        if event.is_terminal() {
            self.sealed = true;
        }
        if self.tx.send(event).is_err() && !self.receiver_gone {
            self.receiver_gone = true;
            tracing::debug!("Event receiver dropped, discarding further events");
        }
    }
}
