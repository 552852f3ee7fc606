//! Access log formatting.

use chrono::Local;

/// One access log line: when, what was asked for, and how it went.
#[derive(Debug, Clone)]
pub struct AccessLogEntry {
    /// Request timestamp
    pub time: chrono::DateTime<Local>,
    /// HTTP method (GET, PUT, ...)
    pub method: String,
    /// Request URI path
    pub path: String,
    /// Raw range expression, when the request carried one.
    pub range: Option<String>,
    /// Response status code
    pub status: u16,
    /// Response body size in bytes
    pub body_bytes: u64,
}

impl AccessLogEntry {
    /// Create a new access log entry with the current timestamp
    pub fn new(method: &str, path: &str) -> Self {
        Self {
            time: Local::now(),
            method: method.to_string(),
            path: path.to_string(),
            range: None,
            status: 200,
            body_bytes: 0,
        }
    }

    /// `2024-05-01 10:32:11     GET /videos/clip.mp4 206 4096    Range bytes=0-4095`
    pub fn format(&self) -> String {
        let mut line = format!(
            "{}     {} {} {} {}",
            self.time.format("%Y-%m-%d %H:%M:%S"),
            self.method,
            self.path,
            self.status,
            self.body_bytes,
        );
        if let Some(range) = &self.range {
            line.push_str("    Range ");
            line.push_str(range);
        }
        line
    }
}
