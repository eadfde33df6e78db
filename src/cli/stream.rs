//! Line streams over the tool's output.

use std::io;
use std::pin::Pin;

use futures_core::Stream;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio_stream::StreamExt;

/// Error type for output stream operations.
#[derive(thiserror::Error, Debug)]
pub enum StreamError {
    /// Reading a line from the process output failed.
    #[error("Failed to read process output: {0}")]
    Read(#[source] io::Error),
    /// Waiting for the process to exit failed.
    #[error("Failed to wait for process exit: {0}")]
    Wait(#[source] io::Error),
    /// The spawned process had no piped output handle.
    #[error("Process output not available")]
    NoOutput,
}

/// A boxed stream of output lines.
pub type LineStream = Pin<Box<dyn Stream<Item = io::Result<String>> + Send>>;

/// Read newline-terminated lines from a reader.
///
/// Bytes are decoded lossily so non-UTF-8 output never ends the stream.
/// The first I/O error is yielded once, then the stream ends.
pub fn read_lines<R>(reader: R) -> impl Stream<Item = io::Result<String>> + Send
where
    R: AsyncRead + Unpin + Send + 'static,
{
    futures_util::stream::unfold(Some(BufReader::new(reader)), |state| async move {
        let Some(mut reader) = state else {
            return None;
        };
        let mut buf = Vec::new();
        match reader.read_until(b'\n', &mut buf).await {
            Ok(0) => None,
            Ok(_) => Some((Ok(decode_line(&buf)), Some(reader))),
            Err(e) => Some((Err(e), None)),
        }
    })
}

/// Merge two readers into one line stream.
///
/// Used where stdout and stderr cannot share a pipe. Lines from each reader
/// keep their relative order, but lines from different readers interleave
/// as they become available. The stream ends once both readers are
/// exhausted.
pub fn merge_lines<A, B>(first: A, second: B) -> LineStream
where
    A: AsyncRead + Unpin + Send + 'static,
    B: AsyncRead + Unpin + Send + 'static,
{
    Box::pin(read_lines(first).merge(read_lines(second)))
}

/// Strip the line terminator (`\n` or `\r\n`) and decode.
fn decode_line(buf: &[u8]) -> String {
    let mut end = buf.len();
    if end > 0 && buf[end - 1] == b'\n' {
        end -= 1;
    }
    if end > 0 && buf[end - 1] == b'\r' {
        end -= 1;
    }
    String::from_utf8_lossy(&buf[..end]).into_owned()
}
