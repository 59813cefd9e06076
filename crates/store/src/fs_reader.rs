//! Filesystem content reader.
//!
//! Identities are file paths. Relative identities resolve against the
//! reader's root (normally the project root); absolute ones are used as-is.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use ctxwarden_core::{ContentReader, ReadError, SourceContent};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

pub struct FsContentReader {
    root: PathBuf,
}

impl FsContentReader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn resolve(&self, identity: &str) -> PathBuf {
        let path = Path::new(identity);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }
}

#[async_trait]
impl ContentReader for FsContentReader {
    fn name(&self) -> &str {
        "fs"
    }

    async fn read(&self, identity: &str) -> Result<SourceContent, ReadError> {
        let path = self.resolve(identity);
        let unreadable = |reason: String| ReadError::Unreadable {
            identity: identity.to_string(),
            reason,
        };

        let metadata = match tokio::fs::metadata(&path).await {
            Ok(m) => m,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(ReadError::NotFound(identity.to_string()));
            }
            Err(e) => return Err(unreadable(e.to_string())),
        };
        if !metadata.is_file() {
            return Err(unreadable("not a regular file".into()));
        }

        let bytes = match tokio::fs::read(&path).await {
            Ok(b) => b,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(ReadError::NotFound(identity.to_string()));
            }
            Err(e) => return Err(unreadable(e.to_string())),
        };
        let content =
            String::from_utf8(bytes).map_err(|_| unreadable("content is not valid UTF-8".into()))?;

        // Missing mtime only costs the recency bonus.
        let last_modified = metadata.modified().ok().map(DateTime::<Utc>::from);

        Ok(SourceContent {
            content,
            last_modified,
        })
    }

    async fn size_hint(&self, identity: &str) -> Option<u64> {
        let metadata = tokio::fs::metadata(self.resolve(identity)).await.ok()?;
        metadata.is_file().then(|| metadata.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn reads_relative_to_root() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("specs")).unwrap();
        std::fs::write(dir.path().join("specs/api.md"), "GET /items").unwrap();

        let reader = FsContentReader::new(dir.path());
        let live = reader.read("specs/api.md").await.unwrap();
        assert_eq!(live.content, "GET /items");
        assert!(live.last_modified.is_some());
    }

    #[tokio::test]
    async fn absolute_identity_ignores_root() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("abs.md");
        std::fs::write(&file, "absolute").unwrap();

        let reader = FsContentReader::new("/definitely/not/here");
        let live = reader.read(file.to_str().unwrap()).await.unwrap();
        assert_eq!(live.content, "absolute");
    }

    #[tokio::test]
    async fn size_hint_comes_from_metadata() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("big.md"), "x".repeat(4096)).unwrap();
        std::fs::create_dir_all(dir.path().join("docs")).unwrap();

        let reader = FsContentReader::new(dir.path());
        assert_eq!(reader.size_hint("big.md").await, Some(4096));
        assert_eq!(reader.size_hint("docs").await, None);
        assert_eq!(reader.size_hint("nope.md").await, None);
    }

    #[tokio::test]
    async fn missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let reader = FsContentReader::new(dir.path());
        let err = reader.read("nope.md").await.unwrap_err();
        assert_eq!(err, ReadError::NotFound("nope.md".into()));
    }

    #[tokio::test]
    async fn directory_is_unreadable() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("docs")).unwrap();
        let reader = FsContentReader::new(dir.path());
        let err = reader.read("docs").await.unwrap_err();
        assert!(matches!(err, ReadError::Unreadable { .. }));
    }

    #[tokio::test]
    async fn binary_content_is_unreadable() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("blob.bin"), [0xff, 0xfe, 0x00]).unwrap();
        let reader = FsContentReader::new(dir.path());
        let err = reader.read("blob.bin").await.unwrap_err();
        assert!(err.to_string().contains("UTF-8"));
    }
}
