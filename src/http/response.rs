//! HTTP response building.
//!
//! Builders for the status codes this server produces, decoupled from the
//! read and write paths. File content is carried as a streamed body so
//! large files never load into memory.

use futures_util::{Stream, TryStreamExt};
use http_body_util::combinators::BoxBody;
use http_body_util::{BodyExt, Empty, Full, StreamBody};
use hyper::body::{Bytes, Frame};
use hyper::Response;

use crate::http::range::ByteRange;

/// Body type shared by every response: empty, static text, or a file
/// stream. Stream errors surface as `io::Error` so the connection layer
/// can log aborted transfers instead of discarding them.
pub type ResponseBody = BoxBody<Bytes, std::io::Error>;

/// Body with no content.
pub fn empty_body() -> ResponseBody {
    Empty::<Bytes>::new().map_err(|never| match never {}).boxed()
}

/// Body from a static string.
pub fn text_body(text: &'static str) -> ResponseBody {
    Full::new(Bytes::from_static(text.as_bytes()))
        .map_err(|never| match never {})
        .boxed()
}

/// Body streaming chunks from a reader.
pub fn stream_body<S>(stream: S) -> ResponseBody
where
    S: Stream<Item = std::io::Result<Bytes>> + Send + Sync + 'static,
{
    StreamBody::new(stream.map_ok(Frame::data)).boxed()
}

/// Build a 200 response carrying a whole file.
pub fn build_full_response(
    body: ResponseBody,
    content_type: &'static str,
    size: u64,
) -> Response<ResponseBody> {
    Response::builder()
        .status(200)
        .header("Content-Type", content_type)
        .header("Content-Length", size)
        .header("Accept-Ranges", "bytes")
        .body(body)
        .unwrap_or_else(|e| {
            log_build_error("200", &e);
            Response::new(empty_body())
        })
}

/// Build a 206 Partial Content response for a byte subrange.
pub fn build_partial_response(
    body: ResponseBody,
    range: ByteRange,
    total_size: u64,
) -> Response<ResponseBody> {
    Response::builder()
        .status(206)
        .header("Content-Length", range.length())
        .header(
            "Content-Range",
            format!("bytes {}-{}/{}", range.start, range.end, total_size),
        )
        .header("Accept-Ranges", "bytes")
        .body(body)
        .unwrap_or_else(|e| {
            log_build_error("206", &e);
            Response::new(empty_body())
        })
}

/// Build a 400 Bad Request response.
pub fn build_400_response(message: &'static str) -> Response<ResponseBody> {
    Response::builder()
        .status(400)
        .header("Content-Type", "text/plain")
        .body(text_body(message))
        .unwrap_or_else(|e| {
            log_build_error("400", &e);
            Response::new(empty_body())
        })
}

/// Build a 404 Not Found response.
pub fn build_404_response() -> Response<ResponseBody> {
    Response::builder()
        .status(404)
        .body(empty_body())
        .unwrap_or_else(|e| {
            log_build_error("404", &e);
            Response::new(empty_body())
        })
}

/// Build a 405 Method Not Allowed response.
pub fn build_405_response() -> Response<ResponseBody> {
    Response::builder()
        .status(405)
        .header("Allow", "GET, PUT")
        .body(empty_body())
        .unwrap_or_else(|e| {
            log_build_error("405", &e);
            Response::new(empty_body())
        })
}

/// Build a 416 Range Not Satisfiable response.
pub fn build_416_response(total_size: u64) -> Response<ResponseBody> {
    Response::builder()
        .status(416)
        .header("Content-Type", "text/plain")
        .header("Content-Range", format!("bytes */{total_size}"))
        .body(text_body("416 Range Not Satisfiable"))
        .unwrap_or_else(|e| {
            log_build_error("416", &e);
            Response::new(empty_body())
        })
}

/// Build a 500 Internal Server Error response.
pub fn build_500_response() -> Response<ResponseBody> {
    Response::builder()
        .status(500)
        .header("Content-Type", "text/plain")
        .body(text_body("500 Internal Server Error"))
        .unwrap_or_else(|e| {
            log_build_error("500", &e);
            Response::new(empty_body())
        })
}

/// Log a response build error.
fn log_build_error(status: &str, error: &hyper::http::Error) {
    crate::logger::log_error(&format!("Failed to build {status} response: {error}"));
}
