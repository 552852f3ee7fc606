//! HTTP protocol layer.
//!
//! Range expression parsing, MIME lookup, and response builders shared by
//! the read and write paths.

pub mod mime;
pub mod range;
pub mod response;

// Re-export commonly used items
pub use range::{parse_range_spec, ByteRange, RangeSpec};
pub use response::{
    build_400_response, build_404_response, build_405_response, build_416_response,
    build_500_response,
};
