//! Archive-rotating persistence for accepted CAP alerts.
//!
//! A storage directory holds at most one "current" alert file at its top
//! level; every previously accepted alert lives in the `archive/`
//! subdirectory under its original filename. Ingesting a new alert first
//! rotates whatever is current into the archive, then writes the inbound
//! wire bytes verbatim under the alert identifier. Storing the raw bytes
//! rather than a re-serialization preserves byte-for-byte provenance of
//! what was actually received.
//!
//! Rotation and write are not atomic as a pair, so [`AlertStore`] holds a
//! directory-scoped mutex for the whole sequence. Callers must share one
//! store per directory; a write failure after rotation leaves the directory
//! with no current file, and the alert may simply be resubmitted.

use parking_lot::Mutex;
use ravealert_cap::Alert;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

/// Name of the archive subdirectory.
pub const ARCHIVE_DIR: &str = "archive";

#[derive(Debug, Error)]
pub enum StoreError {
    /// Identifier is empty or not usable as a filename
    #[error("invalid alert identifier: {0:?}")]
    InvalidIdentifier(String),

    /// Failed to create the archive subdirectory
    #[error("failed to create archive directory {path}: {source}")]
    CreateArchive {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Failed to enumerate the storage directory
    #[error("failed to scan storage directory {path}: {source}")]
    Scan {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Failed to move a current alert file into the archive
    #[error("failed to archive {path}: {source}")]
    Rotate {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Failed to write the new alert file
    #[error("failed to write alert file {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// File store for accepted alerts, scoped to one storage directory.
pub struct AlertStore {
    dir: PathBuf,
    extension: Option<String>,
    // serializes the rotate+write sequence for this directory
    lock: Mutex<()>,
}

impl AlertStore {
    /// Creates a store over `dir`. The directory and its archive are created
    /// lazily on the first ingest.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            extension: None,
            lock: Mutex::new(()),
        }
    }

    /// Appends `extension` to stored filenames (`<identifier>.<extension>`),
    /// for deployments that expect the legacy `.xml` naming.
    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = Some(extension.into());
        self
    }

    /// The storage directory this store manages.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Archives the current alert file, if any, then writes `raw` under the
    /// identifier of `alert`. Returns the path written.
    ///
    /// `raw` must be the exact inbound wire bytes; the store never
    /// re-serializes.
    pub fn ingest(&self, raw: &[u8], alert: &Alert) -> Result<PathBuf, StoreError> {
        let filename = self.filename_for(&alert.identifier)?;

        let _guard = self.lock.lock();

        let archive = self.dir.join(ARCHIVE_DIR);
        fs::create_dir_all(&archive).map_err(|source| StoreError::CreateArchive {
            path: archive.clone(),
            source,
        })?;

        self.rotate_into(&archive)?;

        let path = self.dir.join(filename);
        fs::write(&path, raw).map_err(|source| StoreError::Write {
            path: path.clone(),
            source,
        })?;

        info!(
            identifier = %alert.identifier,
            path = %path.display(),
            bytes = raw.len(),
            "stored alert"
        );
        Ok(path)
    }

    /// Moves every regular file at the top level of the storage directory
    /// into the archive, preserving filenames.
    fn rotate_into(&self, archive: &Path) -> Result<(), StoreError> {
        let entries = fs::read_dir(&self.dir).map_err(|source| StoreError::Scan {
            path: self.dir.clone(),
            source,
        })?;

        for entry in entries {
            let entry = entry.map_err(|source| StoreError::Scan {
                path: self.dir.clone(),
                source,
            })?;
            let path = entry.path();
            if !path.is_file() {
                continue;
            }

            let target = archive.join(entry.file_name());
            fs::rename(&path, &target).map_err(|source| StoreError::Rotate {
                path: path.clone(),
                source,
            })?;
            debug!(from = %path.display(), to = %target.display(), "archived alert");
        }

        Ok(())
    }

    fn filename_for(&self, identifier: &str) -> Result<String, StoreError> {
        let unsafe_identifier = identifier.is_empty()
            || identifier == "."
            || identifier == ".."
            || identifier.contains(['/', '\\'])
            || identifier.contains('\0');
        if unsafe_identifier {
            return Err(StoreError::InvalidIdentifier(identifier.to_string()));
        }

        Ok(match &self.extension {
            Some(extension) => format!("{identifier}.{extension}"),
            None => identifier.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use ravealert_cap::{Alert, MsgType, Scope, Status};
    use tempfile::TempDir;

    fn alert(identifier: &str) -> Alert {
        Alert {
            identifier: identifier.to_string(),
            sender: "host".to_string(),
            sent: Utc.with_ymd_and_hms(2023, 9, 18, 2, 0, 0).unwrap(),
            status: Status::Test,
            msg_type: MsgType::Alert,
            scope: Scope::Private,
            source: None,
            restriction: None,
            addresses: None,
            code: None,
            note: None,
            references: None,
            incidents: None,
            info: Vec::new(),
        }
    }

    fn top_level_files(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap())
            .filter(|e| e.path().is_file())
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn test_ingest_writes_raw_bytes_under_identifier() {
        let dir = TempDir::new().unwrap();
        let store = AlertStore::new(dir.path());

        let raw = b"<alert>raw wire text, not reserialized</alert>";
        let path = store.ingest(raw, &alert("alpha")).unwrap();

        assert_eq!(path, dir.path().join("alpha"));
        assert_eq!(fs::read(&path).unwrap(), raw);
        assert!(dir.path().join(ARCHIVE_DIR).is_dir());
    }

    #[test]
    fn test_second_ingest_rotates_first_into_archive() {
        let dir = TempDir::new().unwrap();
        let store = AlertStore::new(dir.path());

        store.ingest(b"first", &alert("alpha")).unwrap();
        store.ingest(b"second", &alert("beta")).unwrap();

        assert_eq!(top_level_files(dir.path()), vec!["beta".to_string()]);
        let archived = dir.path().join(ARCHIVE_DIR).join("alpha");
        assert_eq!(fs::read(archived).unwrap(), b"first");
    }

    #[test]
    fn test_every_prior_alert_is_archived_exactly_once() {
        let dir = TempDir::new().unwrap();
        let store = AlertStore::new(dir.path());

        store.ingest(b"a", &alert("alpha")).unwrap();
        store.ingest(b"b", &alert("beta")).unwrap();
        store.ingest(b"c", &alert("gamma")).unwrap();

        assert_eq!(top_level_files(dir.path()), vec!["gamma".to_string()]);
        assert_eq!(
            top_level_files(&dir.path().join(ARCHIVE_DIR)),
            vec!["alpha".to_string(), "beta".to_string()]
        );
    }

    #[test]
    fn test_rotation_skips_archive_directory() {
        let dir = TempDir::new().unwrap();
        let store = AlertStore::new(dir.path());

        store.ingest(b"a", &alert("alpha")).unwrap();
        // Second rotation must not try to move archive/ itself.
        store.ingest(b"b", &alert("beta")).unwrap();
        store.ingest(b"c", &alert("gamma")).unwrap();

        assert!(dir.path().join(ARCHIVE_DIR).join("alpha").is_file());
        assert!(dir.path().join(ARCHIVE_DIR).join("beta").is_file());
    }

    #[test]
    fn test_reingesting_same_identifier_archives_predecessor() {
        let dir = TempDir::new().unwrap();
        let store = AlertStore::new(dir.path());

        store.ingest(b"v1", &alert("alpha")).unwrap();
        store.ingest(b"v2", &alert("alpha")).unwrap();

        assert_eq!(fs::read(dir.path().join("alpha")).unwrap(), b"v2");
        assert_eq!(
            fs::read(dir.path().join(ARCHIVE_DIR).join("alpha")).unwrap(),
            b"v1"
        );
    }

    #[test]
    fn test_extension_is_appended_when_configured() {
        let dir = TempDir::new().unwrap();
        let store = AlertStore::new(dir.path()).with_extension("xml");

        let path = store.ingest(b"x", &alert("alpha")).unwrap();
        assert_eq!(path, dir.path().join("alpha.xml"));
    }

    #[test]
    fn test_rejects_unsafe_identifiers() {
        let dir = TempDir::new().unwrap();
        let store = AlertStore::new(dir.path());

        for identifier in ["", "..", "a/b", "a\\b"] {
            assert!(
                matches!(
                    store.ingest(b"x", &alert(identifier)),
                    Err(StoreError::InvalidIdentifier(_))
                ),
                "identifier {identifier:?} should be rejected"
            );
        }
        assert!(top_level_files(dir.path()).is_empty());
    }

    #[test]
    fn test_missing_parent_directory_is_a_storage_error() {
        let dir = TempDir::new().unwrap();
        // Pointing the store at a path nested under a regular file makes
        // create_dir_all fail portably.
        let file = dir.path().join("occupied");
        fs::write(&file, b"x").unwrap();
        let store = AlertStore::new(file.join("nested"));

        assert!(matches!(
            store.ingest(b"x", &alert("alpha")),
            Err(StoreError::CreateArchive { .. })
        ));
    }
}
