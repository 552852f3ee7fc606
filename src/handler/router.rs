//! Request dispatch.
//!
//! Entry point for request processing: method validation, target
//! resolution under the storage root, and hand-off to the read and write
//! paths. Every branch produces a complete response so the connection is
//! never left hanging.

use std::convert::Infallible;
use std::sync::Arc;

use http_body_util::BodyExt;
use hyper::body::{Body, Bytes};
use hyper::{Method, Request, Response};
use futures_util::TryStreamExt;

use crate::config::AppState;
use crate::handler::{serve, upload};
use crate::http::response::ResponseBody;
use crate::http::{self, mime, range};
use crate::logger::{self, AccessLogEntry};
use crate::storage;

/// Main entry point for request handling.
///
/// Generic over the body type so the dispatcher can be driven without a
/// socket; the server passes `hyper::body::Incoming`.
pub async fn handle_request<B>(
    req: Request<B>,
    state: Arc<AppState>,
) -> Result<Response<ResponseBody>, Infallible>
where
    B: Body<Data = Bytes> + Send + 'static,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let range_expr = header_value(&req, "range");
    let content_range_expr = header_value(&req, "content-range");

    let response = match method {
        Method::GET => handle_get(&path, range_expr.as_deref(), &state).await,
        Method::PUT => handle_put(req, &path, content_range_expr.as_deref(), &state).await,
        _ => {
            logger::log_warning(&format!("Method not allowed: {method}"));
            http::build_405_response()
        }
    };

    if state.access_log() {
        let mut entry = AccessLogEntry::new(method.as_str(), &path);
        entry.range = range_expr.or(content_range_expr);
        entry.status = response.status().as_u16();
        entry.body_bytes = content_length_of(&response);
        logger::log_access(&entry);
    }

    Ok(response)
}

fn header_value<B>(req: &Request<B>, name: &str) -> Option<String> {
    req.headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(ToString::to_string)
}

fn content_length_of(response: &Response<ResponseBody>) -> u64 {
    response
        .headers()
        .get("content-length")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse().ok())
        .unwrap_or(0)
}

/// Serve a file, whole or as a byte subrange.
async fn handle_get(
    path: &str,
    range_expr: Option<&str>,
    state: &AppState,
) -> Response<ResponseBody> {
    let Some(file_path) = storage::resolve_path(&state.config.storage.root, path) else {
        logger::log_warning(&format!("Escaping path refused: {path}"));
        return http::build_404_response();
    };

    let resource = storage::describe(file_path).await;
    if !resource.exists {
        return http::build_404_response();
    }

    match range_expr {
        Some(raw) => {
            let spec = match range::parse_range_spec(raw) {
                Ok(spec) => spec,
                Err(err) => {
                    logger::log_warning(&format!("Rejected range '{raw}': {err}"));
                    return http::build_400_response("400 Bad Request");
                }
            };
            let Some(byte_range) = spec.resolve(resource.size) else {
                return http::build_416_response(resource.size);
            };
            match serve::open_range(&resource.path, byte_range).await {
                Ok(body) => http::response::build_partial_response(body, byte_range, resource.size),
                Err(err) => {
                    logger::log_error(&format!(
                        "Failed to open '{}': {err}",
                        resource.path.display()
                    ));
                    http::build_500_response()
                }
            }
        }
        None => {
            let content_type =
                mime::content_type_for(resource.path.extension().and_then(|e| e.to_str()));
            match serve::open_full(&resource.path).await {
                Ok(body) => http::response::build_full_response(body, content_type, resource.size),
                Err(err) => {
                    logger::log_error(&format!(
                        "Failed to open '{}': {err}",
                        resource.path.display()
                    ));
                    http::build_500_response()
                }
            }
        }
    }
}

/// Store an upload, either replacing the file or resuming it at the
/// offset named by the Content-Range expression.
async fn handle_put<B>(
    req: Request<B>,
    path: &str,
    content_range: Option<&str>,
    state: &AppState,
) -> Response<ResponseBody>
where
    B: Body<Data = Bytes> + Send + 'static,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let Some(file_path) = storage::resolve_path(&state.config.storage.root, path) else {
        logger::log_warning(&format!("Escaping upload path refused: {path}"));
        return http::build_400_response("400 Bad Request");
    };

    let source = req
        .into_body()
        .into_data_stream()
        .map_err(std::io::Error::other);

    match upload::save_stream(&file_path, content_range, source).await {
        Ok(_) => Response::new(http::response::empty_body()),
        Err(err @ (upload::SaveError::Malformed(_) | upload::SaveError::OffsetMismatch { .. })) => {
            logger::log_warning(&format!("Rejected upload to {path}: {err}"));
            http::build_400_response("400 Bad Request")
        }
        Err(upload::SaveError::Io(err)) => {
            logger::log_error(&format!("Upload to {path} failed: {err}"));
            http::build_500_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{
        Config, LoggingConfig, PerformanceConfig, ServerConfig, StorageConfig,
    };
    use http_body_util::Full;

    fn test_state(root: &std::path::Path) -> Arc<AppState> {
        Arc::new(AppState::new(Config {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
                workers: None,
            },
            storage: StorageConfig {
                root: root.to_path_buf(),
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                access_log: false,
                access_log_file: None,
                error_log_file: None,
            },
            performance: PerformanceConfig {
                keep_alive_timeout: 75,
                read_timeout: 30,
                write_timeout: 30,
                max_connections: Some(16),
            },
        }))
    }

    fn get(path: &str, range: Option<&str>) -> Request<Full<Bytes>> {
        let mut builder = Request::builder().method(Method::GET).uri(path);
        if let Some(range) = range {
            builder = builder.header("Range", range);
        }
        builder.body(Full::new(Bytes::new())).unwrap()
    }

    fn put(path: &str, content_range: Option<&str>, body: &[u8]) -> Request<Full<Bytes>> {
        let mut builder = Request::builder().method(Method::PUT).uri(path);
        if let Some(content_range) = content_range {
            builder = builder.header("Content-Range", content_range);
        }
        builder
            .body(Full::new(Bytes::copy_from_slice(body)))
            .unwrap()
    }

    async fn body_bytes(response: Response<ResponseBody>) -> Vec<u8> {
        response
            .into_body()
            .collect()
            .await
            .unwrap()
            .to_bytes()
            .to_vec()
    }

    fn header<'a>(response: &'a Response<ResponseBody>, name: &str) -> Option<&'a str> {
        response.headers().get(name).and_then(|v| v.to_str().ok())
    }

    #[tokio::test]
    async fn put_then_get_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(dir.path());
        let payload = b"the quick brown fox jumps over the lazy dog";

        let response = handle_request(put("/docs/pangram.txt", None, payload), Arc::clone(&state))
            .await
            .unwrap();
        assert_eq!(response.status(), 200);

        let response = handle_request(get("/docs/pangram.txt", None), state)
            .await
            .unwrap();
        assert_eq!(response.status(), 200);
        assert_eq!(header(&response, "content-type"), Some("text/plain"));
        assert_eq!(
            header(&response, "content-length"),
            Some(payload.len().to_string().as_str())
        );
        assert_eq!(body_bytes(response).await, payload);
    }

    #[tokio::test]
    async fn resumed_upload_concatenates_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(dir.path());

        let first = [1u8; 100];
        let second = [2u8; 100];
        let response = handle_request(put("/parts.bin", None, &first), Arc::clone(&state))
            .await
            .unwrap();
        assert_eq!(response.status(), 200);

        let response = handle_request(
            put("/parts.bin", Some("bytes=100-"), &second),
            Arc::clone(&state),
        )
        .await
        .unwrap();
        assert_eq!(response.status(), 200);

        let response = handle_request(get("/parts.bin", None), state).await.unwrap();
        let stored = body_bytes(response).await;
        assert_eq!(stored.len(), 200);
        assert_eq!(&stored[..100], &first);
        assert_eq!(&stored[100..], &second);
    }

    #[tokio::test]
    async fn misaligned_resume_rejected_and_content_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(dir.path());
        let original = [9u8; 50];

        handle_request(put("/file.bin", None, &original), Arc::clone(&state))
            .await
            .unwrap();

        let response = handle_request(
            put("/file.bin", Some("bytes=10-"), b"junk"),
            Arc::clone(&state),
        )
        .await
        .unwrap();
        assert_eq!(response.status(), 400);

        let response = handle_request(get("/file.bin", None), state).await.unwrap();
        assert_eq!(body_bytes(response).await, original);
    }

    #[tokio::test]
    async fn range_request_returns_partial_content() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(dir.path());

        handle_request(put("/data.bin", None, b"0123456789"), Arc::clone(&state))
            .await
            .unwrap();

        let response = handle_request(get("/data.bin", Some("bytes=2-5")), state)
            .await
            .unwrap();
        assert_eq!(response.status(), 206);
        assert_eq!(header(&response, "content-range"), Some("bytes 2-5/10"));
        assert_eq!(header(&response, "content-length"), Some("4"));
        assert_eq!(body_bytes(response).await, b"2345");
    }

    #[tokio::test]
    async fn first_byte_range_on_nonempty_file() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(dir.path());

        handle_request(put("/data.bin", None, b"abc"), Arc::clone(&state))
            .await
            .unwrap();

        let response = handle_request(get("/data.bin", Some("bytes=0-0")), state)
            .await
            .unwrap();
        assert_eq!(response.status(), 206);
        assert_eq!(header(&response, "content-range"), Some("bytes 0-0/3"));
        assert_eq!(body_bytes(response).await, b"a");
    }

    #[tokio::test]
    async fn open_range_runs_to_end_of_file() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(dir.path());

        handle_request(put("/data.bin", None, b"0123456789"), Arc::clone(&state))
            .await
            .unwrap();

        let response = handle_request(get("/data.bin", Some("bytes=7-")), state)
            .await
            .unwrap();
        assert_eq!(response.status(), 206);
        assert_eq!(header(&response, "content-range"), Some("bytes 7-9/10"));
        assert_eq!(body_bytes(response).await, b"789");
    }

    #[tokio::test]
    async fn range_start_beyond_file_is_unsatisfiable() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(dir.path());

        handle_request(put("/data.bin", None, b"0123456789"), Arc::clone(&state))
            .await
            .unwrap();

        let response = handle_request(get("/data.bin", Some("bytes=100-")), state)
            .await
            .unwrap();
        assert_eq!(response.status(), 416);
        assert_eq!(header(&response, "content-range"), Some("bytes */10"));
    }

    #[tokio::test]
    async fn malformed_range_is_a_client_error() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(dir.path());

        handle_request(put("/data.bin", None, b"0123456789"), Arc::clone(&state))
            .await
            .unwrap();

        let response = handle_request(get("/data.bin", Some("bytes=x-y")), state)
            .await
            .unwrap();
        assert_eq!(response.status(), 400);
    }

    #[tokio::test]
    async fn missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(dir.path());

        let response = handle_request(get("/nope.bin", None), state).await.unwrap();
        assert_eq!(response.status(), 404);
        assert!(body_bytes(response).await.is_empty());
    }

    #[tokio::test]
    async fn escaping_path_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(dir.path());

        let response = handle_request(get("/../secret.txt", None), state)
            .await
            .unwrap();
        assert_eq!(response.status(), 404);
    }

    #[tokio::test]
    async fn other_methods_are_not_allowed() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(dir.path());

        let request = Request::builder()
            .method(Method::POST)
            .uri("/data.bin")
            .body(Full::new(Bytes::new()))
            .unwrap();
        let response = handle_request(request, state).await.unwrap();
        assert_eq!(response.status(), 405);
        assert_eq!(header(&response, "allow"), Some("GET, PUT"));
    }

    #[tokio::test]
    async fn extensionless_file_served_as_html() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(dir.path());

        handle_request(put("/README", None, b"hello"), Arc::clone(&state))
            .await
            .unwrap();

        let response = handle_request(get("/README", None), state).await.unwrap();
        assert_eq!(header(&response, "content-type"), Some("text/html"));
    }

    #[tokio::test]
    async fn unknown_extension_served_as_octet_stream() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(dir.path());

        handle_request(put("/blob.xyz", None, b"??"), Arc::clone(&state))
            .await
            .unwrap();

        let response = handle_request(get("/blob.xyz", None), state).await.unwrap();
        assert_eq!(
            header(&response, "content-type"),
            Some("application/octet-stream")
        );
    }
}
