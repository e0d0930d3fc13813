//! JSON file backed key store repository

use std::fs::{self, File, OpenOptions};
use std::io::{self, ErrorKind, Write};
use std::path::{Path, PathBuf};
use tk_core::domain::entities::KeyStore;
use tk_core::errors::PersistenceError;
use tk_core::repositories::KeyStoreRepository;
use tracing::{debug, info};

use super::retry::{with_retry, RetryConfig};

/// Key store persisted as a pretty-printed JSON document
///
/// Saves write `<path>.tmp`, flush it to disk and rename it over `<path>`, so
/// a reader sees either the old or the new store and never a partial one.
/// On unix the file is created with mode `0600`.
#[derive(Debug, Clone)]
pub struct FileKeyStoreRepository {
    path: PathBuf,
    retry: RetryConfig,
}

impl FileKeyStoreRepository {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            retry: RetryConfig::default(),
        }
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_owned();
        name.push(".tmp");
        PathBuf::from(name)
    }

    fn read(&self) -> Result<Option<String>, PersistenceError> {
        match fs::read_to_string(&self.path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(io_error("read", &e)),
        }
    }

    fn write_atomic(&self, content: &[u8]) -> Result<(), PersistenceError> {
        let parent = match self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            Some(parent) => {
                fs::create_dir_all(parent).map_err(|e| io_error("create directory", &e))?;
                parent
            }
            None => Path::new("."),
        };

        let temp_path = self.temp_path();
        let written = write_synced(&temp_path, content)
            .and_then(|()| fs::rename(&temp_path, &self.path).map_err(|e| io_error("rename", &e)));
        if let Err(err) = written {
            // Best effort; the original error is what the caller needs
            let _ = fs::remove_file(&temp_path);
            return Err(err);
        }

        sync_dir(parent).map_err(|e| io_error("sync directory", &e))
    }
}

impl KeyStoreRepository for FileKeyStoreRepository {
    fn load(&self) -> Result<Option<KeyStore>, PersistenceError> {
        let Some(content) = with_retry(&self.retry, "key_store.load", || self.read())? else {
            debug!(path = %self.path.display(), "No key store file, starting empty");
            return Ok(None);
        };

        let store: KeyStore = serde_json::from_str(&content).map_err(|e| PersistenceError::Corrupt {
            message: format!("invalid key store document: {}", e),
        })?;
        store.validate()?;

        info!(path = %self.path.display(), keys = store.len(), "Loaded key store");
        Ok(Some(store))
    }

    fn save(&self, store: &KeyStore) -> Result<(), PersistenceError> {
        let content = serde_json::to_vec_pretty(store).map_err(|e| PersistenceError::Serialization {
            message: e.to_string(),
        })?;

        with_retry(&self.retry, "key_store.save", || self.write_atomic(&content))?;

        debug!(path = %self.path.display(), keys = store.len(), "Saved key store");
        Ok(())
    }
}

#[cfg(unix)]
fn open_private(path: &Path) -> io::Result<File> {
    use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};

    let file = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .mode(0o600)
        .open(path)?;
    // mode() only applies on creation; a stale temp file keeps its old bits
    file.set_permissions(fs::Permissions::from_mode(0o600))?;
    Ok(file)
}

#[cfg(not(unix))]
fn open_private(path: &Path) -> io::Result<File> {
    OpenOptions::new().create(true).write(true).truncate(true).open(path)
}

fn write_synced(path: &Path, content: &[u8]) -> Result<(), PersistenceError> {
    let mut file = open_private(path).map_err(|e| io_error("open", &e))?;
    file.write_all(content).map_err(|e| io_error("write", &e))?;
    file.sync_all().map_err(|e| io_error("sync", &e))
}

/// Makes a completed rename durable
#[cfg(unix)]
fn sync_dir(dir: &Path) -> io::Result<()> {
    File::open(dir)?.sync_all()
}

#[cfg(not(unix))]
fn sync_dir(_dir: &Path) -> io::Result<()> {
    Ok(())
}

fn io_error(action: &str, err: &io::Error) -> PersistenceError {
    PersistenceError::Io {
        message: format!("{} failed: {}", action, err),
        transient: matches!(
            err.kind(),
            ErrorKind::Interrupted | ErrorKind::WouldBlock | ErrorKind::TimedOut
        ),
    }
}
