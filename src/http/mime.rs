//! MIME type lookup.
//!
//! Returns the Content-Type for a file extension. Extensions are matched
//! case-sensitively and expected in lower case.

/// Get the Content-Type for a file extension.
///
/// Unknown extensions fall back to `application/octet-stream`. Files with
/// no extension are served as HTML so extensionless index documents
/// render in a browser.
///
/// # Examples
/// ```
/// use rangehttpd::http::mime::content_type_for;
/// assert_eq!(content_type_for(Some("mp4")), "video/mp4");
/// assert_eq!(content_type_for(Some("xyz")), "application/octet-stream");
/// assert_eq!(content_type_for(None), "text/html");
/// ```
pub fn content_type_for(extension: Option<&str>) -> &'static str {
    match extension {
        Some("txt") => "text/plain",
        Some("html") => "text/html",
        Some("js") => "application/javascript",
        Some("css") => "text/css",
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("mp4") => "video/mp4",
        Some("mp3") => "audio/mp3",
        None => "text/html",
        _ => "application/octet-stream",
    }
}
