// src/exec/runner.rs

//! Single process runner for the sync tool.

use std::collections::VecDeque;
use std::process::{ExitStatus, Stdio};

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tokio::sync::mpsc;
use tracing::{debug, error, info};

use super::{CommandResult, CommandStatus, OUTPUT_TAIL_LEN, OutputChunk};
use crate::types::StreamTag;

/// Run `program args...` to completion.
///
/// stdout lines are logged at `info` and stderr lines at `error` as they
/// arrive; the last [`OUTPUT_TAIL_LEN`] of them are also kept, in arrival
/// order, in the result. Bytes that are not UTF-8 are replaced, never fatal.
/// A spawn or wait failure becomes [`CommandStatus::SpawnFailed`].
pub async fn run_command(program: &str, args: Vec<String>) -> CommandResult {
    let mut tail = OutputTail::default();
    let status = match run_command_inner(program, &args, &mut tail).await {
        Ok(status) => status,
        Err(err) => {
            error!(program, ?args, error = %format!("{err:#}"), "sync tool execution error");
            CommandStatus::SpawnFailed(format!("{err:#}"))
        }
    };

    CommandResult {
        args,
        output: tail.lines.into(),
        omitted: tail.omitted,
        status,
    }
}

/// Ring buffer of the most recent output lines.
#[derive(Debug, Default)]
struct OutputTail {
    lines: VecDeque<OutputChunk>,
    omitted: usize,
}

impl OutputTail {
    fn push(&mut self, chunk: OutputChunk) {
        if self.lines.len() == OUTPUT_TAIL_LEN {
            self.lines.pop_front();
            self.omitted += 1;
        }
        self.lines.push_back(chunk);
    }
}

async fn run_command_inner(
    program: &str,
    args: &[String],
    tail: &mut OutputTail,
) -> Result<CommandStatus> {
    info!(program, ?args, "launched command");

    let mut cmd = Command::new(program);
    cmd.args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    let mut child = cmd
        .spawn()
        .with_context(|| format!("spawning '{program}'"))?;

    // Both readers feed one channel so chunks keep their arrival order.
    let (chunk_tx, mut chunk_rx) = mpsc::unbounded_channel::<OutputChunk>();
    if let Some(stdout) = child.stdout.take() {
        spawn_line_reader(stdout, StreamTag::Stdout, chunk_tx.clone());
    }
    if let Some(stderr) = child.stderr.take() {
        spawn_line_reader(stderr, StreamTag::Stderr, chunk_tx.clone());
    }
    drop(chunk_tx);

    while let Some(chunk) = chunk_rx.recv().await {
        tail.push(chunk);
    }

    let status = child
        .wait()
        .await
        .with_context(|| format!("waiting for '{program}'"))?;

    let status = classify(status);
    info!(program, ?args, %status, "command exited");
    Ok(status)
}

/// Forward every line of `pipe` until EOF.
///
/// The pipe stays open until the child closes it: after a read error the
/// rest is drained and discarded, so the child never writes into a closed
/// pipe.
fn spawn_line_reader<R>(pipe: R, stream: StreamTag, tx: mpsc::UnboundedSender<OutputChunk>)
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut reader = BufReader::new(pipe);
        let mut buf = Vec::new();
        loop {
            buf.clear();
            match reader.read_until(b'\n', &mut buf).await {
                Ok(0) => break,
                Ok(_) => {
                    let line = decode_line(&buf);
                    match stream {
                        StreamTag::Stdout => info!(stream = %stream, "{}", line),
                        StreamTag::Stderr => error!(stream = %stream, "{}", line),
                    }
                    // The collector outlives every sender.
                    let _ = tx.send(OutputChunk { stream, text: line });
                }
                Err(err) => {
                    error!(stream = %stream, error = %err, "failed to read command output; discarding the rest");
                    if let Err(err) = tokio::io::copy(&mut reader, &mut tokio::io::sink()).await {
                        debug!(stream = %stream, error = %err, "draining command output failed");
                    }
                    break;
                }
            }
        }
    });
}

/// One line without its terminator, invalid UTF-8 replaced by U+FFFD.
fn decode_line(raw: &[u8]) -> String {
    let raw = raw.strip_suffix(b"\n").unwrap_or(raw);
    let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
    String::from_utf8_lossy(raw).into_owned()
}

fn classify(status: ExitStatus) -> CommandStatus {
    if let Some(code) = status.code() {
        return CommandStatus::Exited(code);
    }

    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        CommandStatus::Signaled(status.signal())
    }

    #[cfg(not(unix))]
    {
        CommandStatus::Signaled(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_line_strips_terminators_and_replaces_bad_bytes() {
        assert_eq!(decode_line(b"plain\n"), "plain");
        assert_eq!(decode_line(b"crlf\r\n"), "crlf");
        assert_eq!(decode_line(b"no newline"), "no newline");
        assert_eq!(decode_line(b"\xffbad\n"), "\u{FFFD}bad");
    }

    #[test]
    fn tail_keeps_the_most_recent_lines() {
        let mut tail = OutputTail::default();
        for i in 0..OUTPUT_TAIL_LEN + 5 {
            tail.push(OutputChunk::stdout(format!("line {i}")));
        }
        assert_eq!(tail.lines.len(), OUTPUT_TAIL_LEN);
        assert_eq!(tail.omitted, 5);
        assert_eq!(tail.lines.front().map(|c| c.text.as_str()), Some("line 5"));
    }
}
