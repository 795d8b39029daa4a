//! Transient upload storage.
//!
//! Uploaded work artifacts only live between receipt and review: every saved
//! file is wrapped in a [`TempUpload`] guard that removes it when dropped, so
//! each handler exit path (success, upstream failure, early return) cleans up
//! without bookkeeping. A failed removal is logged and otherwise ignored.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use rand::Rng;

/// Extensions accepted for uploads: spreadsheet formats plus markdown.
const ALLOWED_EXTENSIONS: &[&str] = &["xlsx", "xls", "csv", "md"];

/// Whether a filename carries an accepted upload extension.
#[must_use]
pub fn allowed_extension(filename: &str) -> bool {
    Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            let ext = ext.to_ascii_lowercase();
            ALLOWED_EXTENSIONS.contains(&ext.as_str())
        })
}

/// Writes uploads into a spool directory under collision-resistant names.
#[derive(Debug, Clone)]
pub struct UploadStore {
    dir: PathBuf,
}

/// A saved upload that deletes its file when dropped.
#[derive(Debug)]
pub struct TempUpload {
    path: PathBuf,
    original_name: String,
    size: u64,
}

impl UploadStore {
    /// Create a store rooted at `dir`, creating the directory if needed.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create upload directory {}", dir.display()))?;
        Ok(Self { dir })
    }

    /// Persist uploaded bytes under a unique spool name.
    ///
    /// Concurrent requests share this directory; a millisecond timestamp
    /// plus a random suffix keeps names from colliding.
    pub fn save(&self, original_name: &str, bytes: &[u8]) -> Result<TempUpload> {
        let ext = Path::new(original_name)
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("bin")
            .to_ascii_lowercase();

        let millis = chrono::Utc::now().timestamp_millis();
        let suffix: u32 = rand::rng().random_range(0..1_000_000_000);
        let path = self.dir.join(format!("upload-{millis}-{suffix}.{ext}"));

        std::fs::write(&path, bytes)
            .with_context(|| format!("Failed to write upload to {}", path.display()))?;

        tracing::debug!("Spooled upload {} ({} bytes)", path.display(), bytes.len());

        Ok(TempUpload {
            path,
            original_name: original_name.to_string(),
            size: bytes.len() as u64,
        })
    }
}

impl TempUpload {
    /// Path of the spooled file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Name the user uploaded the file under.
    #[must_use]
    pub fn original_name(&self) -> &str {
        &self.original_name
    }

    /// Size of the upload in bytes.
    #[must_use]
    pub const fn size(&self) -> u64 {
        self.size
    }

    /// Read the full upload as UTF-8 text.
    pub fn read_text(&self) -> Result<String> {
        std::fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read upload {}", self.path.display()))
    }
}

impl Drop for TempUpload {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!("Failed to remove upload {}: {e}", self.path.display());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn allowed_extensions_match_roster() {
        assert!(allowed_extension("report.xlsx"));
        assert!(allowed_extension("old.XLS"));
        assert!(allowed_extension("data.csv"));
        assert!(allowed_extension("lesson.md"));
        assert!(!allowed_extension("script.exe"));
        assert!(!allowed_extension("noext"));
    }

    #[test]
    fn save_spools_and_drop_removes() {
        let dir = TempDir::new().unwrap();
        let store = UploadStore::new(dir.path()).unwrap();

        let path = {
            let upload = store.save("work.xlsx", b"cells").unwrap();
            assert_eq!(upload.original_name(), "work.xlsx");
            assert_eq!(upload.size(), 5);
            assert!(upload.path().exists());
            upload.path().to_path_buf()
        };

        assert!(!path.exists(), "drop must remove the spooled file");
    }

    #[test]
    fn drop_cleans_up_even_after_read_error_path() {
        let dir = TempDir::new().unwrap();
        let store = UploadStore::new(dir.path()).unwrap();

        let path = {
            let upload = store.save("work.xlsx", &[0xff, 0xfe]).unwrap();
            // Binary content is not UTF-8, mirroring an error mid-handler.
            assert!(upload.read_text().is_err());
            upload.path().to_path_buf()
        };

        assert!(!path.exists());
    }

    #[test]
    fn saved_names_do_not_collide() {
        let dir = TempDir::new().unwrap();
        let store = UploadStore::new(dir.path()).unwrap();

        let a = store.save("a.csv", b"1").unwrap();
        let b = store.save("a.csv", b"2").unwrap();
        assert_ne!(a.path(), b.path());
    }

    #[test]
    fn spool_name_keeps_extension() {
        let dir = TempDir::new().unwrap();
        let store = UploadStore::new(dir.path()).unwrap();

        let upload = store.save("Lesson Plan.MD", b"# Hi").unwrap();
        assert!(upload.path().to_string_lossy().ends_with(".md"));
    }
}
