//! services/client/src/adapters/session.rs
//!
//! This module contains the session adapter, the concrete implementation of
//! the `CredentialProvider` port. It persists the bearer token and role in a
//! small JSON file, the desktop analog of browser local storage. Token
//! issuance (the login flow) is out of scope; something else writes the file.

use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::RwLock;

use booking_core::domain::Role;
use booking_core::ports::CredentialProvider;
use serde::{Deserialize, Serialize};
use tracing::warn;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct SessionRecord {
    token: String,
    role: Option<String>,
}

/// A file-backed session store implementing the `CredentialProvider` port.
pub struct FileSession {
    path: PathBuf,
    state: RwLock<Option<SessionRecord>>,
}

impl FileSession {
    /// Loads the session file if it exists. A missing file simply means the
    /// user is not logged in; an unreadable one is treated the same, loudly.
    pub fn load(path: PathBuf) -> Result<Self, std::io::Error> {
        let state = match std::fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<SessionRecord>(&contents) {
                Ok(record) => Some(record),
                Err(err) => {
                    warn!(error = %err, path = %path.display(), "session file unreadable, ignoring");
                    None
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => None,
            Err(err) => return Err(err),
        };
        Ok(Self {
            path,
            state: RwLock::new(state),
        })
    }

    /// Persists a fresh token and role, replacing any previous session.
    pub fn save(&self, token: &str, role: Option<Role>) -> Result<(), std::io::Error> {
        let record = SessionRecord {
            token: token.to_string(),
            role: role.map(|r| r.as_str().to_string()),
        };
        let contents = serde_json::to_string_pretty(&record)
            .map_err(|e| std::io::Error::new(ErrorKind::Other, e))?;
        std::fs::write(&self.path, contents)?;
        *self.state.write().expect("session lock poisoned") = Some(record);
        Ok(())
    }

    /// Forgets the session, both on disk and in memory.
    pub fn clear(&self) -> Result<(), std::io::Error> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => {}
            Err(err) if err.kind() == ErrorKind::NotFound => {}
            Err(err) => return Err(err),
        }
        *self.state.write().expect("session lock poisoned") = None;
        Ok(())
    }
}

impl CredentialProvider for FileSession {
    fn token(&self) -> Option<String> {
        self.state
            .read()
            .expect("session lock poisoned")
            .as_ref()
            .map(|record| record.token.clone())
    }

    fn role(&self) -> Option<Role> {
        self.state
            .read()
            .expect("session lock poisoned")
            .as_ref()
            .and_then(|record| record.role.as_deref().and_then(Role::parse))
    }
}
