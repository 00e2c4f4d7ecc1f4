//! Persistence of the single opaque bearer token.

use std::{
    fs::{self, OpenOptions},
    io::{self, Write},
    path::{Path, PathBuf},
    sync::Mutex,
};

use shared::config::client::CREDENTIAL_KEY as CREDENTIAL_FILE;

use tracing::debug;

use crate::error::StorageError;

/// Durable home of the authentication token, keyed by a fixed name.
///
/// Implementations must survive process restarts (except the in-memory one,
/// which exists for tests and embedding hosts that persist elsewhere).
#[cfg_attr(test, mockall::automock)]
pub trait CredentialStore: Send + Sync {
    /// Returns the stored token, or `None` if nothing is stored.
    ///
    /// # Errors
    /// Returns [`StorageError`] if the backing store cannot be read.
    fn get(&self) -> Result<Option<String>, StorageError>;

    /// Replaces the stored token.
    ///
    /// # Errors
    /// Returns [`StorageError`] if the token cannot be written.
    fn set(&self, token: &str) -> Result<(), StorageError>;

    /// Deletes the stored token. Removing an absent token succeeds.
    ///
    /// # Errors
    /// Returns [`StorageError`] if the token exists but cannot be deleted.
    fn remove(&self) -> Result<(), StorageError>;
}

/// Stores the token as a plain string in a single file.
#[derive(Debug, Clone)]
pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Sibling file the token is written to before it replaces the real one.
    fn staging_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map_or_else(|| CREDENTIAL_FILE.into(), ToOwned::to_owned);
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn ensure_parent(&self) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| StorageError::Write {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        Ok(())
    }
}

impl CredentialStore for FileCredentialStore {
    fn get(&self) -> Result<Option<String>, StorageError> {
        match fs::read_to_string(&self.path) {
            Ok(token) if token.is_empty() => Ok(None),
            Ok(token) => Ok(Some(token)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StorageError::Read {
                path: self.path.clone(),
                source,
            }),
        }
    }

    fn set(&self, token: &str) -> Result<(), StorageError> {
        self.ensure_parent()?;
        let staging = self.staging_path();
        let write_err = |source| StorageError::Write {
            path: staging.clone(),
            source,
        };

        // A leftover from an interrupted write may carry looser permissions.
        match fs::remove_file(&staging) {
            Err(err) if err.kind() != io::ErrorKind::NotFound => return Err(write_err(err)),
            _ => {}
        }

        let mut options = OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }
        let mut file = options.open(&staging).map_err(write_err)?;
        file.write_all(token.as_bytes()).map_err(write_err)?;
        file.sync_all().map_err(write_err)?;
        drop(file);

        // Readers see either the old token or the new one, never a partial write.
        fs::rename(&staging, &self.path).map_err(|source| {
            let _ = fs::remove_file(&staging);
            StorageError::Write {
                path: self.path.clone(),
                source,
            }
        })?;
        debug!(path = %self.path.display(), "credential stored");
        Ok(())
    }

    fn remove(&self) -> Result<(), StorageError> {
        match fs::remove_file(&self.path) {
            Ok(()) => {
                debug!(path = %self.path.display(), "credential removed");
                Ok(())
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(StorageError::Remove {
                path: self.path.clone(),
                source,
            }),
        }
    }
}

/// Keeps the token in process memory.
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    token: Mutex<Option<String>>,
}

impl MemoryCredentialStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store that already holds `token`.
    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: Mutex::new(Some(token.into())),
        }
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Option<String>>, StorageError> {
        self.token
            .lock()
            .map_err(|err| StorageError::Unavailable(err.to_string()))
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn get(&self) -> Result<Option<String>, StorageError> {
        Ok(self.lock()?.clone())
    }

    fn set(&self, token: &str) -> Result<(), StorageError> {
        *self.lock()? = Some(token.to_string());
        Ok(())
    }

    fn remove(&self) -> Result<(), StorageError> {
        *self.lock()? = None;
        Ok(())
    }
}
