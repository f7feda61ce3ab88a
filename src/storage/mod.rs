//! File intake for uploaded resumes.
//!
//! Validates declared type and size, then writes the artifact under a
//! generated key that never derives from a client-controlled path. The
//! write goes through a `.part` temporary in the same directory and is
//! renamed into place, so a key either names a complete artifact or
//! nothing at all.

use mime::Mime;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

pub mod key;

/// MIME types accepted for resume uploads: PDF plus legacy and modern Word
pub const ALLOWED_MIME_TYPES: &[&str] = &[
    "application/pdf",
    "application/msword",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
];

/// Intake-level failures
#[derive(Debug)]
pub enum IntakeError {
    /// Declared MIME type is not in the allowed set
    UnsupportedMediaType(String),

    /// Upload exceeds the configured size ceiling
    PayloadTooLarge { size: usize, limit: usize },

    /// Filesystem failure while storing the artifact
    Io(io::Error),
}

impl fmt::Display for IntakeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IntakeError::UnsupportedMediaType(ty) => {
                write!(f, "Unsupported file type: {}. Only PDF and Word documents are accepted", ty)
            }
            IntakeError::PayloadTooLarge { size, limit } => {
                write!(f, "File is too large: {} bytes exceeds the {} byte limit", size, limit)
            }
            IntakeError::Io(e) => write!(f, "Failed to store file: {}", e),
        }
    }
}

impl std::error::Error for IntakeError {}

impl From<io::Error> for IntakeError {
    fn from(e: io::Error) -> Self {
        IntakeError::Io(e)
    }
}

/// A successfully stored artifact: the generated key plus the filename the
/// applicant uploaded under, kept for attachment and download naming.
#[derive(Debug, Clone)]
pub struct StoredResume {
    pub key: String,
    pub original_filename: String,
}

/// Durable store for resume artifacts, rooted at the upload directory
#[derive(Debug, Clone)]
pub struct ResumeStore {
    dir: PathBuf,
    max_size: usize,
}

impl ResumeStore {
    pub fn new(dir: PathBuf, max_size: usize) -> Self {
        Self { dir, max_size }
    }

    /// Reject uploads with a disallowed type or an oversize body.
    /// Runs before any byte touches the upload directory.
    pub fn validate(&self, content_type: Option<&Mime>, size: usize) -> Result<(), IntakeError> {
        let declared = match content_type {
            Some(m) => m.essence_str().to_string(),
            None => return Err(IntakeError::UnsupportedMediaType("unknown".to_string())),
        };

        if !ALLOWED_MIME_TYPES.contains(&declared.as_str()) {
            return Err(IntakeError::UnsupportedMediaType(declared));
        }

        if size > self.max_size {
            return Err(IntakeError::PayloadTooLarge {
                size,
                limit: self.max_size,
            });
        }

        Ok(())
    }

    /// Validate and store an upload that was spooled to `source`.
    ///
    /// The artifact lands under a fresh generated key; the `.part`
    /// temporary is cleaned up on failure so no half-written file is left
    /// under either name.
    pub fn save(
        &self,
        source: &Path,
        original_filename: Option<&str>,
        content_type: Option<&Mime>,
        size: usize,
    ) -> Result<StoredResume, IntakeError> {
        let mime = match content_type {
            Some(m) => m,
            None => return Err(IntakeError::UnsupportedMediaType("unknown".to_string())),
        };
        self.validate(Some(mime), size)?;

        let storage_key = key::generate_key(original_filename, mime);

        let final_path = self.dir.join(&storage_key);
        let part_path = self.dir.join(format!("{}.part", storage_key));

        if let Err(e) = fs::copy(source, &part_path) {
            let _ = fs::remove_file(&part_path);
            return Err(e.into());
        }
        if let Err(e) = fs::rename(&part_path, &final_path) {
            let _ = fs::remove_file(&part_path);
            return Err(e.into());
        }

        let original = original_filename
            .filter(|n| !n.trim().is_empty())
            .unwrap_or("resume")
            .to_string();

        Ok(StoredResume {
            key: storage_key,
            original_filename: original,
        })
    }

    /// Absolute path of an artifact by key
    pub fn path_of(&self, key: &str) -> PathBuf {
        self.dir.join(key)
    }

    /// Whether the artifact behind `key` is still present on disk.
    /// Artifacts can be removed by operators outside this service.
    pub fn exists(&self, key: &str) -> bool {
        self.path_of(key).is_file()
    }

    /// Read a stored artifact fully into memory (used for email attachments)
    pub fn read(&self, key: &str) -> io::Result<Vec<u8>> {
        fs::read(self.path_of(key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn pdf() -> Mime {
        "application/pdf".parse().unwrap()
    }

    fn store(max_size: usize) -> (tempfile::TempDir, ResumeStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = ResumeStore::new(dir.path().to_path_buf(), max_size);
        (dir, store)
    }

    fn spool(dir: &tempfile::TempDir, bytes: &[u8]) -> PathBuf {
        let path = dir.path().join("incoming.tmp");
        let mut f = fs::File::create(&path).unwrap();
        f.write_all(bytes).unwrap();
        path
    }

    #[test]
    fn rejects_unsupported_type() {
        let (_dir, store) = store(1024);
        let err = store
            .validate(Some(&"text/plain".parse().unwrap()), 10)
            .unwrap_err();
        assert!(matches!(err, IntakeError::UnsupportedMediaType(ref t) if t == "text/plain"));
    }

    #[test]
    fn rejects_missing_type() {
        let (_dir, store) = store(1024);
        assert!(matches!(
            store.validate(None, 10),
            Err(IntakeError::UnsupportedMediaType(_))
        ));
    }

    #[test]
    fn rejects_oversize_upload() {
        let (_dir, store) = store(100);
        let err = store.validate(Some(&pdf()), 101).unwrap_err();
        assert!(matches!(err, IntakeError::PayloadTooLarge { size: 101, limit: 100 }));
    }

    #[test]
    fn accepts_all_allowed_types_at_limit() {
        let (_dir, store) = store(100);
        for ty in ALLOWED_MIME_TYPES {
            let mime: Mime = ty.parse().unwrap();
            store.validate(Some(&mime), 100).unwrap();
        }
    }

    #[test]
    fn save_writes_full_artifact_and_no_temporary() {
        let spool_dir = tempfile::tempdir().unwrap();
        let (dir, store) = store(1024);
        let source = spool(&spool_dir, b"%PDF-1.4 fake");

        let stored = store
            .save(&source, Some("cv.pdf"), Some(&pdf()), 13)
            .unwrap();

        assert_eq!(stored.original_filename, "cv.pdf");
        assert!(stored.key.ends_with(".pdf"));
        assert_eq!(store.read(&stored.key).unwrap(), b"%PDF-1.4 fake");

        let leftovers: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().ends_with(".part"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[test]
    fn save_rejects_before_touching_disk() {
        let spool_dir = tempfile::tempdir().unwrap();
        let (dir, store) = store(5);
        let source = spool(&spool_dir, b"0123456789");

        let err = store
            .save(&source, Some("cv.pdf"), Some(&pdf()), 10)
            .unwrap_err();
        assert!(matches!(err, IntakeError::PayloadTooLarge { .. }));
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn missing_original_filename_defaults_to_resume() {
        let spool_dir = tempfile::tempdir().unwrap();
        let (_dir, store) = store(1024);
        let source = spool(&spool_dir, b"doc");

        let stored = store.save(&source, None, Some(&pdf()), 3).unwrap();
        assert_eq!(stored.original_filename, "resume");
    }

    #[test]
    fn exists_reflects_external_deletion() {
        let spool_dir = tempfile::tempdir().unwrap();
        let (_dir, store) = store(1024);
        let source = spool(&spool_dir, b"doc");

        let stored = store.save(&source, Some("cv.pdf"), Some(&pdf()), 3).unwrap();
        assert!(store.exists(&stored.key));

        fs::remove_file(store.path_of(&stored.key)).unwrap();
        assert!(!store.exists(&stored.key));
    }
}
