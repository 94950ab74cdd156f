//! Frontier file reading
//!
//! The frontier is a UTF-8 text file with one page name per line. Lines are
//! streamed into a bounded queue so the reader never runs far ahead of the
//! workers.

use std::path::Path;
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Page name carried by a frontier line, or `None` for a blank line
///
/// Surrounding whitespace, including a trailing `\r`, is not part of the name.
pub fn frontier_entry(line: &str) -> Option<&str> {
    let entry = line.trim();
    if entry.is_empty() {
        None
    } else {
        Some(entry)
    }
}

/// Streams every line of `path` into `lines`
///
/// Stops early, without error, when `cancel` fires or the receiving side is
/// dropped. Returns the number of lines forwarded.
pub async fn read_frontier(
    path: &Path,
    lines: mpsc::Sender<String>,
    cancel: &CancellationToken,
) -> std::io::Result<usize> {
    let file = File::open(path).await?;
    let mut reader = BufReader::new(file).lines();
    let mut forwarded = 0;

    while let Some(line) = reader.next_line().await? {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                tracing::debug!("Frontier reading stopped by cancellation after {} lines", forwarded);
                break;
            }
            sent = lines.send(line) => {
                if sent.is_err() {
                    tracing::debug!("Frontier consumer went away after {} lines", forwarded);
                    break;
                }
                forwarded += 1;
            }
        }
    }

    Ok(forwarded)
}

/// Counts the non-blank lines of a frontier file
pub async fn count_frontier_entries(path: &Path) -> std::io::Result<usize> {
    let file = File::open(path).await?;
    let mut reader = BufReader::new(file).lines();
    let mut count = 0;

    while let Some(line) = reader.next_line().await? {
        if frontier_entry(&line).is_some() {
            count += 1;
        }
    }

    Ok(count)
}
