//! Durable storage for the session record.
//!
//! The file store keeps the record in `<base>/user.json` with restricted
//! permissions (0600). Tokens are never logged in full.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use parking_lot::Mutex;

use super::SessionRecord;
use crate::config::paths;

/// Key the session record is stored under.
pub const SESSION_KEY: &str = "user";

/// Key/value storage holding at most one [`SessionRecord`].
///
/// No token expiry checks happen here; callers decide what a stale token means.
pub trait SessionStore: Send + Sync {
    /// Writes the record, replacing any previous one.
    ///
    /// # Errors
    /// Returns an error if the record cannot be serialized or persisted.
    fn save(&self, record: &SessionRecord) -> Result<()>;

    /// Returns the last saved record, or `None` if absent or corrupt.
    fn load(&self) -> Option<SessionRecord>;

    /// Removes the record. Returns whether one was present.
    ///
    /// # Errors
    /// Returns an error if the underlying storage cannot be modified.
    fn clear(&self) -> Result<bool>;
}

/// File-backed store under the WAC home directory.
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    /// Creates a store keeping its entry inside `dir`.
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            path: dir.as_ref().join(format!("{SESSION_KEY}.json")),
        }
    }

    /// Creates a store in the default location (`$WAC_HOME`).
    pub fn open_default() -> Self {
        Self::new(paths::session_dir())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SessionStore for FileSessionStore {
    fn save(&self, record: &SessionRecord) -> Result<()> {
        let path = &self.path;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }

        let contents = serde_json::to_string_pretty(record).context("Failed to serialize session")?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};
            let mut file = OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .mode(0o600)
                .open(path)
                .with_context(|| format!("Failed to open {} for writing", path.display()))?;
            // `mode` only applies on create; an older file keeps its bits.
            file.set_permissions(fs::Permissions::from_mode(0o600))
                .with_context(|| format!("Failed to restrict permissions on {}", path.display()))?;
            file.write_all(contents.as_bytes())
                .with_context(|| format!("Failed to write to {}", path.display()))?;
        }

        #[cfg(not(unix))]
        {
            fs::write(path, contents)
                .with_context(|| format!("Failed to write to {}", path.display()))?;
        }

        tracing::debug!(path = %path.display(), token = %record.masked_token(), "session saved");
        Ok(())
    }

    fn load(&self) -> Option<SessionRecord> {
        let path = &self.path;
        if !path.exists() {
            return None;
        }

        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "failed to read session");
                return None;
            }
        };

        match serde_json::from_str::<SessionRecord>(&contents) {
            Ok(record) if record.is_valid() => Some(record),
            Ok(_) => {
                tracing::warn!(path = %path.display(), "session has no access token, ignoring");
                None
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "corrupt session, ignoring");
                None
            }
        }
    }

    fn clear(&self) -> Result<bool> {
        let path = &self.path;
        if !path.exists() {
            return Ok(false);
        }
        fs::remove_file(path)
            .with_context(|| format!("Failed to remove session at {}", path.display()))?;
        tracing::debug!(path = %path.display(), "session cleared");
        Ok(true)
    }
}

/// In-memory store for tests and throwaway sessions.
///
/// Records go through JSON like the file store so corrupt data behaves the same.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    slot: Mutex<Option<String>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the raw stored value.
    pub fn set_raw(&self, raw: impl Into<String>) {
        *self.slot.lock() = Some(raw.into());
    }
}

impl SessionStore for MemorySessionStore {
    fn save(&self, record: &SessionRecord) -> Result<()> {
        let contents = serde_json::to_string(record).context("Failed to serialize session")?;
        *self.slot.lock() = Some(contents);
        Ok(())
    }

    fn load(&self) -> Option<SessionRecord> {
        let slot = self.slot.lock();
        serde_json::from_str::<SessionRecord>(slot.as_deref()?)
            .ok()
            .filter(SessionRecord::is_valid)
    }

    fn clear(&self) -> Result<bool> {
        Ok(self.slot.lock().take().is_some())
    }
}
