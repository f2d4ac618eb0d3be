//! The single persisted token slot.

use std::{
    fs, io,
    path::{Path, PathBuf},
    sync::{Arc, Mutex, PoisonError},
};

use crate::StoreError;

/// Storage for the bearer token, the only state the client persists.
pub trait TokenStore: Send {
    /// Read the slot. `Ok(None)` when it is empty.
    fn load(&self) -> Result<Option<String>, StoreError>;

    /// Overwrite the slot.
    fn save(&mut self, token: &str) -> Result<(), StoreError>;

    /// Empty the slot. Emptying an empty slot succeeds.
    fn clear(&mut self) -> Result<(), StoreError>;
}

/// In-memory slot.
///
/// Clones share the slot, so a test can keep a handle and inspect what the
/// runtime persisted.
#[derive(Debug, Clone, Default)]
pub struct MemoryTokenStore {
    slot: Arc<Mutex<Option<String>>>,
}

impl MemoryTokenStore {
    /// Empty slot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Slot pre-filled with a token.
    pub fn with_token(token: impl Into<String>) -> Self {
        Self { slot: Arc::new(Mutex::new(Some(token.into()))) }
    }

    /// Current contents.
    pub fn get(&self) -> Option<String> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> Result<Option<String>, StoreError> {
        Ok(self.get())
    }

    fn save(&mut self, token: &str) -> Result<(), StoreError> {
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = Some(token.to_string());
        Ok(())
    }

    fn clear(&mut self) -> Result<(), StoreError> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner).take();
        Ok(())
    }
}

/// Slot backed by a file holding the raw token.
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    /// Store at an explicit path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at `$HOME/.postboard/access_token`.
    pub fn default_location() -> Result<Self, StoreError> {
        default_token_path().map(Self::new)
    }

    /// File backing the slot.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: io::Error) -> StoreError {
        StoreError::Io { path: self.path.clone(), source }
    }
}

impl TokenStore for FileTokenStore {
    fn load(&self) -> Result<Option<String>, StoreError> {
        match fs::read_to_string(&self.path) {
            Ok(content) => {
                let token = content.trim();
                Ok((!token.is_empty()).then(|| token.to_string()))
            },
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(self.io_error(e)),
        }
    }

    fn save(&mut self, token: &str) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
        }
        fs::write(&self.path, token).map_err(|e| self.io_error(e))?;

        // Owner read/write only
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mut perms = fs::metadata(&self.path).map_err(|e| self.io_error(e))?.permissions();
            perms.set_mode(0o600);
            fs::set_permissions(&self.path, perms).map_err(|e| self.io_error(e))?;
        }

        tracing::debug!(path = %self.path.display(), "token persisted");
        Ok(())
    }

    fn clear(&mut self) -> Result<(), StoreError> {
        match fs::remove_file(&self.path) {
            Ok(()) => {
                tracing::debug!(path = %self.path.display(), "token cleared");
                Ok(())
            },
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(self.io_error(e)),
        }
    }
}

/// `$HOME/.postboard/access_token`.
pub fn default_token_path() -> Result<PathBuf, StoreError> {
    let home = dirs::home_dir().ok_or(StoreError::NoHome)?;
    Ok(home.join(".postboard").join("access_token"))
}
