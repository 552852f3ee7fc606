//! Byte-range expression parsing.
//!
//! Download (`Range`) and upload (`Content-Range`) headers share the same
//! `unit=start[-end]` shape, so one parser serves both paths. The unit
//! token in front of `=` is deliberately not validated; legacy clients
//! send arbitrary units and they have always been accepted.

use std::fmt;

/// A parsed range expression, not yet resolved against a file size.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeSpec {
    /// First byte position.
    pub start: u64,
    /// Last byte position, inclusive. `None` means until end of file.
    pub end: Option<u64>,
}

impl RangeSpec {
    /// Resolve against the total size of the resource.
    ///
    /// An absent end defaults to the last byte of the resource; an
    /// explicit end is clamped to it. Returns `None` when `start` lies
    /// beyond the resource, which callers surface as 416.
    pub fn resolve(&self, total_size: u64) -> Option<ByteRange> {
        if self.start >= total_size {
            return None;
        }
        let last = total_size - 1;
        let end = self.end.map_or(last, |e| e.min(last));
        Some(ByteRange {
            start: self.start,
            end,
        })
    }
}

/// A concrete byte interval within a resource. Holds `end >= start`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    pub start: u64,
    pub end: u64,
}

impl ByteRange {
    /// Number of bytes covered by the interval.
    pub const fn length(&self) -> u64 {
        self.end - self.start + 1
    }
}

/// Range expression that cannot be interpreted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MalformedRange {
    reason: &'static str,
}

impl fmt::Display for MalformedRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "malformed range expression: {}", self.reason)
    }
}

impl std::error::Error for MalformedRange {}

/// Parse a `unit=start[-end]` range expression.
///
/// Bare `unit=start` is treated as `start-`. Positions are 64-bit so
/// resources larger than 4 GiB resolve correctly.
///
/// # Examples
/// ```
/// use rangehttpd::http::range::parse_range_spec;
///
/// let spec = parse_range_spec("bytes=100-199").unwrap();
/// assert_eq!(spec.start, 100);
/// assert_eq!(spec.end, Some(199));
///
/// let open = parse_range_spec("bytes=100-").unwrap();
/// assert_eq!(open.end, None);
/// ```
pub fn parse_range_spec(header: &str) -> Result<RangeSpec, MalformedRange> {
    let Some((_unit, expr)) = header.split_once('=') else {
        return Err(MalformedRange {
            reason: "missing '='",
        });
    };

    let (start_str, end_str) = expr.split_once('-').unwrap_or((expr, ""));

    let Ok(start) = start_str.trim().parse::<u64>() else {
        return Err(MalformedRange {
            reason: "start is not a non-negative integer",
        });
    };

    let end_str = end_str.trim();
    let end = if end_str.is_empty() {
        None
    } else {
        let Ok(end) = end_str.parse::<u64>() else {
            return Err(MalformedRange {
                reason: "end is not a non-negative integer",
            });
        };
        if end < start {
            return Err(MalformedRange {
                reason: "end precedes start",
            });
        }
        Some(end)
    };

    Ok(RangeSpec { start, end })
}
