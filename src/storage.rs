//! Filesystem mapping for request targets.
//!
//! Maps URL paths onto the configured root directory and takes the
//! per-request metadata snapshot the dispatcher works from.

use std::path::{Component, Path, PathBuf};

use tokio::fs;

/// Snapshot of the filesystem metadata behind a request target, taken
/// once per request and never cached.
#[derive(Debug, Clone)]
pub struct ResourceDescriptor {
    pub path: PathBuf,
    pub exists: bool,
    pub size: u64,
}

/// Map a URL path to a location under the root directory.
///
/// The leading slash is stripped and the remainder joined onto the root.
/// Paths that climb out of the root with `..` segments are refused.
pub fn resolve_path(root: &Path, url_path: &str) -> Option<PathBuf> {
    let relative = Path::new(url_path.trim_start_matches('/'));
    if relative
        .components()
        .any(|c| matches!(c, Component::ParentDir))
    {
        return None;
    }
    Some(root.join(relative))
}

/// Take a metadata snapshot for a resolved location.
///
/// Directories are not servable resources and report as absent.
pub async fn describe(path: PathBuf) -> ResourceDescriptor {
    match fs::metadata(&path).await {
        Ok(meta) if meta.is_file() => ResourceDescriptor {
            exists: true,
            size: meta.len(),
            path,
        },
        _ => ResourceDescriptor {
            exists: false,
            size: 0,
            path,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_leading_slash() {
        let path = resolve_path(Path::new("/srv/files"), "/videos/clip.mp4").unwrap();
        assert_eq!(path, Path::new("/srv/files/videos/clip.mp4"));
    }

    #[test]
    fn refuses_parent_segments() {
        assert!(resolve_path(Path::new("/srv/files"), "/../etc/passwd").is_none());
        assert!(resolve_path(Path::new("/srv/files"), "/a/../../b").is_none());
    }

    #[tokio::test]
    async fn missing_file_reports_absent() {
        let dir = tempfile::tempdir().unwrap();
        let resource = describe(dir.path().join("nope.bin")).await;
        assert!(!resource.exists);
        assert_eq!(resource.size, 0);
    }

    #[tokio::test]
    async fn directory_reports_absent() {
        let dir = tempfile::tempdir().unwrap();
        let resource = describe(dir.path().to_path_buf()).await;
        assert!(!resource.exists);
    }

    #[tokio::test]
    async fn file_reports_size() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("data.bin");
        std::fs::write(&file, b"hello").unwrap();
        let resource = describe(file).await;
        assert!(resource.exists);
        assert_eq!(resource.size, 5);
    }
}
