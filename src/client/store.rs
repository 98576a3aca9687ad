// src/client/store.rs

use std::fs;
use std::io;
use std::path::PathBuf;

use crate::models::user::User;

/// Persisted local session: one JSON-serialized user record at a
/// well-known path, used only to skip the name-entry screen on revisit.
///
/// The serialized record never carries the password field, so the file is
/// not a security credential. Unreadable or corrupt content is treated as
/// no session.
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn load(&self) -> Option<User> {
        let contents = fs::read_to_string(&self.path).ok()?;
        match serde_json::from_str(&contents) {
            Ok(user) => Some(user),
            Err(err) => {
                tracing::warn!("Discarding unreadable session file: {}", err);
                None
            }
        }
    }

    pub fn save(&self, user: &User) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_vec(user).map_err(io::Error::other)?;
        fs::write(&self.path, contents)
    }

    pub fn clear(&self) {
        if let Err(err) = fs::remove_file(&self.path) {
            if err.kind() != io::ErrorKind::NotFound {
                tracing::warn!("Failed to clear session file: {}", err);
            }
        }
    }
}
