//! Read-side file serving.
//!
//! Opens files and produces streamed response bodies, either whole or as
//! an exact byte subrange. Content is read in fixed-size chunks so large
//! files are never held in memory.

use std::io::SeekFrom;
use std::path::Path;

use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tokio_util::io::ReaderStream;

use crate::http::range::ByteRange;
use crate::http::response::{self, ResponseBody};

/// Read granularity for streamed file content.
pub const CHUNK_SIZE: usize = 4096;

/// Open `path` and produce a body covering exactly `range`.
///
/// If the file turns out shorter than the range claims, the stream ends
/// early. That is a short transfer, not an error.
pub async fn open_range(path: &Path, range: ByteRange) -> std::io::Result<ResponseBody> {
    let mut file = File::open(path).await?;
    file.seek(SeekFrom::Start(range.start)).await?;
    let reader = file.take(range.length());
    Ok(response::stream_body(ReaderStream::with_capacity(
        reader, CHUNK_SIZE,
    )))
}

/// Open `path` and produce a body covering the whole file.
pub async fn open_full(path: &Path) -> std::io::Result<ResponseBody> {
    let file = File::open(path).await?;
    Ok(response::stream_body(ReaderStream::with_capacity(
        file, CHUNK_SIZE,
    )))
}
