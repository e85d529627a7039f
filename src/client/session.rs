use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::{auth::dto::PublicUser, faq::repo_types::Faq};

pub const SESSION_FILE: &str = "auth-storage.json";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    #[serde(rename = "totalFAQs")]
    pub total_faqs: i64,
    pub current_page: i64,
    pub total_pages: i64,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            total_faqs: 0,
            current_page: 1,
            total_pages: 0,
        }
    }
}

/// The part of the client state that survives restarts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PersistedSession {
    pub is_authenticated: bool,
    pub user: Option<PublicUser>,
    pub token: Option<String>,
    pub faqs: Vec<Faq>,
    pub pagination: Pagination,
}

/// Durable home for the session blob.
pub trait SessionStorage: Send {
    fn load(&self) -> anyhow::Result<Option<PersistedSession>>;
    fn save(&mut self, session: &PersistedSession) -> anyhow::Result<()>;
    fn clear(&mut self) -> anyhow::Result<()>;
}

/// Stores the blob as JSON in `<dir>/auth-storage.json`.
///
/// I/O is blocking `std::fs` and runs inline on whichever task calls into
/// [`ClientStore`](crate::client::ClientStore). The blob is a few KB; a UI that cannot
/// tolerate that should wrap its own storage in `spawn_blocking`.
#[derive(Debug, Clone)]
pub struct FileSessionStorage {
    path: PathBuf,
}

impl FileSessionStorage {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            path: dir.as_ref().join(SESSION_FILE),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SessionStorage for FileSessionStorage {
    fn load(&self) -> anyhow::Result<Option<PersistedSession>> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(e).with_context(|| format!("read {}", self.path.display()));
            }
        };
        let session = serde_json::from_str(&raw)
            .with_context(|| format!("parse {}", self.path.display()))?;
        Ok(Some(session))
    }

    fn save(&mut self, session: &PersistedSession) -> anyhow::Result<()> {
        let raw = serde_json::to_string(session)?;
        std::fs::write(&self.path, raw).with_context(|| format!("write {}", self.path.display()))
    }

    fn clear(&mut self) -> anyhow::Result<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).with_context(|| format!("remove {}", self.path.display())),
        }
    }
}

/// Keeps the serialized blob in memory; nothing outlives the process.
#[derive(Debug, Clone, Default)]
pub struct MemorySessionStorage {
    blob: Option<String>,
}

impl SessionStorage for MemorySessionStorage {
    fn load(&self) -> anyhow::Result<Option<PersistedSession>> {
        self.blob
            .as_deref()
            .map(serde_json::from_str)
            .transpose()
            .context("parse session blob")
    }

    fn save(&mut self, session: &PersistedSession) -> anyhow::Result<()> {
        self.blob = Some(serde_json::to_string(session)?);
        Ok(())
    }

    fn clear(&mut self) -> anyhow::Result<()> {
        self.blob = None;
        Ok(())
    }
}
