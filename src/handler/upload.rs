//! Write-side upload handling.
//!
//! An upload either replaces a file wholesale or resumes it at the byte
//! offset where a previous attempt stopped. A resumed upload must start
//! exactly at the current end of the file; anything else is refused
//! before a single byte is written, so stored content is never clobbered
//! by a misaligned retry.

use std::fmt;
use std::io::SeekFrom;
use std::path::Path;
use std::pin::pin;

use futures_util::{Stream, StreamExt};
use hyper::body::Bytes;
use tokio::fs::{self, OpenOptions};
use tokio::io::{AsyncSeekExt, AsyncWriteExt};

use crate::http::range::{parse_range_spec, MalformedRange};

/// Failure modes of an upload.
#[derive(Debug)]
pub enum SaveError {
    /// The Content-Range expression could not be parsed.
    Malformed(MalformedRange),
    /// The resume offset does not line up with the bytes already stored.
    OffsetMismatch { expected: u64, requested: u64 },
    /// Filesystem or transport failure while copying.
    Io(std::io::Error),
}

impl fmt::Display for SaveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Malformed(err) => write!(f, "{err}"),
            Self::OffsetMismatch {
                expected,
                requested,
            } => write!(
                f,
                "resume offset {requested} does not match stored length {expected}"
            ),
            Self::Io(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for SaveError {}

impl From<MalformedRange> for SaveError {
    fn from(err: MalformedRange) -> Self {
        Self::Malformed(err)
    }
}

impl From<std::io::Error> for SaveError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

/// Copy an upload stream into the file at `path`.
///
/// With a Content-Range expression the write resumes at `start`, which
/// must equal the file's current length. Without one the file is
/// truncated and rewritten from the beginning. Bytes are copied until the
/// source ends; no total length is enforced. Returns the number of bytes
/// written.
pub async fn save_stream<S>(
    path: &Path,
    content_range: Option<&str>,
    source: S,
) -> Result<u64, SaveError>
where
    S: Stream<Item = std::io::Result<Bytes>>,
{
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await?;
    }

    let mut file = OpenOptions::new()
        .write(true)
        .create(true)
        .open(path)
        .await?;

    match content_range {
        Some(header) => {
            let spec = parse_range_spec(header)?;
            let current_len = file.metadata().await?.len();
            if spec.start != current_len {
                return Err(SaveError::OffsetMismatch {
                    expected: current_len,
                    requested: spec.start,
                });
            }
            file.seek(SeekFrom::Start(spec.start)).await?;
        }
        None => {
            // No resume offset: replace the file from the beginning.
            file.set_len(0).await?;
        }
    }

    let mut written = 0u64;
    let mut source = pin!(source);
    while let Some(chunk) = source.next().await {
        let chunk = chunk?;
        if !chunk.is_empty() {
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
    }
    file.flush().await?;

    Ok(written)
}
