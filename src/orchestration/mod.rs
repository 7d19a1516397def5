//! Build orchestration
//!
//! Wires registries, the version probe and the command builders into a
//! single shell script and runs it inside a scoped credential workspace.

mod builder;
mod executor;

pub use builder::{BuildOptions, BuildOrchestrator, BuildState};
pub use executor::{ProcessExecutor, ShellExecutor};

use crate::error::{DockyardError, DockyardResult};
use tokio::io::{AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};

/// Max number of output lines logged when a build fails.
const BUILD_ERROR_TAIL_LINES: usize = 50;

/// Extract the useful tail of build output for error diagnostics.
pub(crate) fn build_error_output(lines: &[String]) -> String {
    let start = lines.len().saturating_sub(BUILD_ERROR_TAIL_LINES);
    lines[start..].join("\n")
}

/// Write one line of output to the sink and flush it.
pub(crate) async fn write_line(
    sink: &mut (dyn AsyncWrite + Unpin + Send),
    line: &str,
) -> DockyardResult<()> {
    let written = async {
        sink.write_all(line.as_bytes()).await?;
        sink.write_all(b"\n").await?;
        sink.flush().await
    }
    .await;
    written.map_err(|e| DockyardError::io("writing build output", e))
}

/// Decode one raw output line, dropping the line terminator.
///
/// Build steps may print bytes that are not UTF-8; those are replaced
/// rather than ending the stream.
fn decode_line(mut raw: Vec<u8>) -> String {
    if raw.last() == Some(&b'\r') {
        raw.pop();
    }
    String::from_utf8_lossy(&raw).into_owned()
}

/// Stream stdout+stderr from a child process into `sink` line by line.
///
/// Both pipes are drained until EOF. Returns all collected output lines
/// for error reporting.
pub(crate) async fn stream_child_output(
    child: &mut tokio::process::Child,
    sink: &mut (dyn AsyncWrite + Unpin + Send),
) -> DockyardResult<Vec<String>> {
    let stderr = child
        .stderr
        .take()
        .ok_or_else(|| DockyardError::Internal("child stderr was not piped".to_string()))?;
    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| DockyardError::Internal("child stdout was not piped".to_string()))?;

    let mut stderr_reader = BufReader::new(stderr).split(b'\n');
    let mut stdout_reader = BufReader::new(stdout).split(b'\n');

    let mut all_output = Vec::new();
    let mut stderr_done = false;
    let mut stdout_done = false;

    while !stderr_done || !stdout_done {
        let segment = tokio::select! {
            segment = stderr_reader.next_segment(), if !stderr_done => {
                let segment = segment.map_err(|e| DockyardError::io("reading build stderr", e))?;
                stderr_done = segment.is_none();
                segment
            },
            segment = stdout_reader.next_segment(), if !stdout_done => {
                let segment = segment.map_err(|e| DockyardError::io("reading build stdout", e))?;
                stdout_done = segment.is_none();
                segment
            },
        };

        if let Some(raw) = segment {
            let line = decode_line(raw);
            write_line(sink, &line).await?;
            all_output.push(line);
        }
    }

    Ok(all_output)
}
