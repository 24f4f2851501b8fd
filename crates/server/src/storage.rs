//! On-disk attachment storage.
//!
//! Files live under the configured upload directory in one subdirectory per
//! ticket. Stored names are generated UUIDs (never the client filename), so
//! path traversal and collisions are impossible by construction. Writes go
//! to a `.tmp` sibling first and are renamed into place so a concurrent
//! download can never observe a partial file.

use std::io;
use std::path::{Path, PathBuf};

use tokio::fs;
use uuid::Uuid;

use ticketslave_core::TicketId;

/// Handle to the attachment directory.
#[derive(Debug, Clone)]
pub struct AttachmentStore {
    root: PathBuf,
}

/// Result of storing a file.
#[derive(Debug, Clone)]
pub struct StoredFile {
    /// Storage key relative to the upload root (`"<ticket_id>/<uuid>[.ext]"`).
    pub stored_filename: String,
    /// Size written, in bytes.
    pub size_bytes: i64,
}

impl AttachmentStore {
    /// Create a store rooted at `root`. The directory is created lazily on
    /// first write.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The upload root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Write attachment bytes for a ticket and return the storage key.
    ///
    /// # Errors
    ///
    /// Returns `io::Error` if the directory cannot be created or the file
    /// cannot be written/renamed.
    pub async fn save(
        &self,
        ticket_id: TicketId,
        original_filename: &str,
        bytes: &[u8],
    ) -> io::Result<StoredFile> {
        let dir = self.root.join(ticket_id.to_string());
        fs::create_dir_all(&dir).await?;

        let stored_name = match sanitized_extension(original_filename) {
            Some(ext) => format!("{}.{ext}", Uuid::new_v4()),
            None => Uuid::new_v4().to_string(),
        };

        let final_path = dir.join(&stored_name);
        let tmp_path = dir.join(format!("{stored_name}.tmp"));

        fs::write(&tmp_path, bytes).await?;
        fs::rename(&tmp_path, &final_path).await?;

        Ok(StoredFile {
            stored_filename: format!("{ticket_id}/{stored_name}"),
            size_bytes: i64::try_from(bytes.len()).unwrap_or(i64::MAX),
        })
    }

    /// Absolute path for a storage key produced by [`Self::save`].
    #[must_use]
    pub fn path_for(&self, stored_filename: &str) -> PathBuf {
        self.root.join(stored_filename)
    }

    /// Remove every file stored for a ticket. Missing directories are fine.
    ///
    /// # Errors
    ///
    /// Returns `io::Error` for filesystem failures other than the directory
    /// not existing.
    pub async fn remove_ticket_files(&self, ticket_id: TicketId) -> io::Result<()> {
        let dir = self.root.join(ticket_id.to_string());
        match fs::remove_dir_all(&dir).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e),
        }
    }
}

/// Extract a lowercase alphanumeric extension from a client filename.
///
/// Anything else (dotfiles, weird characters, empty) yields `None` and the
/// stored name goes extension-less.
fn sanitized_extension(filename: &str) -> Option<String> {
    let ext = Path::new(filename).extension()?.to_str()?;
    if ext.is_empty()
        || ext.len() > 16
        || !ext.chars().all(|c| c.is_ascii_alphanumeric())
    {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_save_roundtrip() {
        let tmp = TempDir::new().unwrap();
        let store = AttachmentStore::new(tmp.path());

        let stored = store
            .save(TicketId::new(7), "notes.TXT", b"hello world")
            .await
            .unwrap();

        assert!(stored.stored_filename.starts_with("7/"));
        assert!(stored.stored_filename.ends_with(".txt"));
        assert_eq!(stored.size_bytes, 11);

        let bytes = fs::read(store.path_for(&stored.stored_filename))
            .await
            .unwrap();
        assert_eq!(bytes, b"hello world");
    }

    #[tokio::test]
    async fn test_no_tmp_file_left_behind() {
        let tmp = TempDir::new().unwrap();
        let store = AttachmentStore::new(tmp.path());

        store
            .save(TicketId::new(3), "data.bin", &[0u8; 128])
            .await
            .unwrap();

        let mut entries = fs::read_dir(tmp.path().join("3")).await.unwrap();
        while let Some(entry) = entries.next_entry().await.unwrap() {
            let name = entry.file_name();
            assert!(!name.to_string_lossy().ends_with(".tmp"));
        }
    }

    #[tokio::test]
    async fn test_remove_ticket_files() {
        let tmp = TempDir::new().unwrap();
        let store = AttachmentStore::new(tmp.path());

        store.save(TicketId::new(5), "a.txt", b"a").await.unwrap();
        store.save(TicketId::new(5), "b.txt", b"b").await.unwrap();

        store.remove_ticket_files(TicketId::new(5)).await.unwrap();
        assert!(!tmp.path().join("5").exists());

        // Removing again is a no-op
        store.remove_ticket_files(TicketId::new(5)).await.unwrap();
    }

    #[test]
    fn test_sanitized_extension() {
        assert_eq!(sanitized_extension("report.PDF"), Some("pdf".to_string()));
        assert_eq!(sanitized_extension("archive.tar.gz"), Some("gz".to_string()));
        assert_eq!(sanitized_extension("no_extension"), None);
        assert_eq!(sanitized_extension("weird.e!xe"), None);
    }
}
