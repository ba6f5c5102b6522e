//! On-disk chat archive.
//!
//! DESIGN
//! ======
//! Each assistant gets a `<assistant>_chat_history/` directory under the data
//! directory (`MULTIPAGE_DATA_DIR`, default the working directory). A chat is
//! one JSON file named `<YYYYmmdd_HHMMSS>_<chat_id>.json` holding the message
//! list. Saving renames the file to the current timestamp, so file names and
//! modification times both track recency. Empty histories are never written.

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use time::macros::format_description;
use time::{OffsetDateTime, PrimitiveDateTime};
use uuid::Uuid;

use super::history::ChatHistory;

pub const DATA_DIR_ENV: &str = "MULTIPAGE_DATA_DIR";
pub const TITLE_CHARS: usize = 30;
pub const DEFAULT_RECENT_LIMIT: usize = 5;

#[derive(Debug, thiserror::Error)]
pub enum ArchiveError {
    #[error("chat archive io error at {path}: {message}")]
    Io { path: PathBuf, message: String },

    #[error("corrupt chat file {path}: {message}")]
    Corrupt { path: PathBuf, message: String },

    #[error("cannot serialize chat: {0}")]
    Serialize(String),
}

impl crate::error::ErrorCode for ArchiveError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Io { .. } => "E_ARCHIVE_IO",
            Self::Corrupt { .. } => "E_ARCHIVE_CORRUPT",
            Self::Serialize(_) => "E_ARCHIVE_SERIALIZE",
        }
    }
}

fn io_err(path: &Path) -> impl FnOnce(std::io::Error) -> ArchiveError + '_ {
    move |e| ArchiveError::Io { path: path.to_path_buf(), message: e.to_string() }
}

/// Listing entry for a saved chat.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct ChatSummary {
    pub chat_id: Uuid,
    pub title: String,
    pub saved_at: String,
}

/// One `.json` file in a chat directory.
struct ArchivedFile {
    path: PathBuf,
    chat_id: Uuid,
    stamp: String,
    modified: SystemTime,
}

#[derive(Debug, Clone)]
pub struct ChatArchive {
    root: PathBuf,
}

impl ChatArchive {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[must_use]
    pub fn from_env() -> Self {
        Self::new(std::env::var(DATA_DIR_ENV).unwrap_or_else(|_| ".".into()))
    }

    #[must_use]
    pub fn chat_dir(&self, assistant: &str) -> PathBuf {
        self.root.join(format!("{assistant}_chat_history"))
    }

    /// Write `history` under `chat_id`, renaming any earlier file for it.
    ///
    /// Returns `Ok(false)` without touching disk when the history is empty.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be listed or the file written.
    pub async fn save(&self, assistant: &str, chat_id: Uuid, history: &ChatHistory) -> Result<bool, ArchiveError> {
        if history.is_empty() {
            return Ok(false);
        }
        let dir = self.chat_dir(assistant);
        tokio::fs::create_dir_all(&dir).await.map_err(io_err(&dir))?;

        let target = dir.join(format!("{}_{chat_id}.json", file_stamp(now_local())));
        if let Some(existing) = self.files(assistant).await?.into_iter().find(|f| f.chat_id == chat_id) {
            if existing.path != target {
                tokio::fs::rename(&existing.path, &target).await.map_err(io_err(&existing.path))?;
            }
        }

        let body = serde_json::to_vec(history).map_err(|e| ArchiveError::Serialize(e.to_string()))?;
        tokio::fs::write(&target, body).await.map_err(io_err(&target))?;
        tracing::debug!(%chat_id, path = %target.display(), messages = history.len(), "chat saved");
        Ok(true)
    }

    /// Load the newest file for `chat_id`. Missing and empty chats yield `None`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or does not hold a message list.
    pub async fn load(&self, assistant: &str, chat_id: Uuid) -> Result<Option<ChatHistory>, ArchiveError> {
        let matching: Vec<ArchivedFile> =
            self.files(assistant).await?.into_iter().filter(|f| f.chat_id == chat_id).collect();
        if matching.len() > 1 {
            tracing::warn!(%chat_id, count = matching.len(), "multiple files for chat; using the most recent");
        }
        let Some(file) = matching.into_iter().next() else {
            tracing::info!(%chat_id, "no saved chat found");
            return Ok(None);
        };

        let history = read_history(&file.path).await?;
        Ok((!history.is_empty()).then_some(history))
    }

    /// Up to `limit` non-empty chats, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the chat directory cannot be listed.
    pub async fn recent(&self, assistant: &str, limit: usize) -> Result<Vec<ChatSummary>, ArchiveError> {
        let mut out = Vec::new();
        for file in self.files(assistant).await? {
            if out.len() >= limit {
                break;
            }
            match read_history(&file.path).await {
                Ok(history) if !history.is_empty() => out.push(summarize(&file, &history)),
                Ok(_) => {}
                Err(e) => tracing::warn!(error = %e, "skipping unreadable chat file"),
            }
        }
        Ok(out)
    }

    /// Every chat on disk, newest first, including empty ones.
    ///
    /// # Errors
    ///
    /// Returns an error if the chat directory cannot be listed.
    pub async fn all(&self, assistant: &str) -> Result<Vec<ChatSummary>, ArchiveError> {
        let mut out = Vec::new();
        for file in self.files(assistant).await? {
            match read_history(&file.path).await {
                Ok(history) => out.push(summarize(&file, &history)),
                Err(e) => tracing::warn!(error = %e, "skipping unreadable chat file"),
            }
        }
        Ok(out)
    }

    /// Delete chat files holding an empty message list. Returns how many went.
    ///
    /// # Errors
    ///
    /// Returns an error if the chat directory cannot be listed.
    pub async fn cleanup_empty(&self, assistant: &str) -> Result<usize, ArchiveError> {
        let mut removed = 0;
        for file in self.files(assistant).await? {
            match read_history(&file.path).await {
                Ok(history) if history.is_empty() => {
                    tokio::fs::remove_file(&file.path).await.map_err(io_err(&file.path))?;
                    tracing::info!(path = %file.path.display(), "removed empty chat file");
                    removed += 1;
                }
                Ok(_) => {}
                Err(e) => tracing::warn!(error = %e, "cleanup skipped unreadable chat file"),
            }
        }
        Ok(removed)
    }

    /// Chat files sorted newest first. A missing directory is an empty archive.
    async fn files(&self, assistant: &str) -> Result<Vec<ArchivedFile>, ArchiveError> {
        let dir = self.chat_dir(assistant);
        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(io_err(&dir)(e)),
        };

        let mut files = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(io_err(&dir))? {
            let path = entry.path();
            let Some((stamp, chat_id)) = path.file_name().and_then(|n| n.to_str()).and_then(parse_file_name) else {
                continue;
            };
            let modified = entry
                .metadata()
                .await
                .and_then(|m| m.modified())
                .unwrap_or(SystemTime::UNIX_EPOCH);
            files.push(ArchivedFile { path, chat_id, stamp, modified });
        }

        files.sort_by(|a, b| b.modified.cmp(&a.modified).then_with(|| b.stamp.cmp(&a.stamp)));
        Ok(files)
    }
}

async fn read_history(path: &Path) -> Result<ChatHistory, ArchiveError> {
    let raw = tokio::fs::read(path).await.map_err(io_err(path))?;
    serde_json::from_slice(&raw).map_err(|e| ArchiveError::Corrupt { path: path.to_path_buf(), message: e.to_string() })
}

fn summarize(file: &ArchivedFile, history: &ChatHistory) -> ChatSummary {
    let title = match history.first_user_text() {
        Some(text) => format!("{}...", text.chars().take(TITLE_CHARS).collect::<String>()),
        None => format!("Chat {}...", &file.chat_id.to_string()[..8]),
    };
    ChatSummary { chat_id: file.chat_id, title, saved_at: display_stamp(&file.stamp) }
}

/// Split `<YYYYmmdd>_<HHMMSS>_<uuid>.json` into the stamp and chat id.
pub(crate) fn parse_file_name(name: &str) -> Option<(String, Uuid)> {
    let stem = name.strip_suffix(".json")?;
    let mut parts = stem.splitn(3, '_');
    let date = parts.next()?;
    let clock = parts.next()?;
    let chat_id = Uuid::parse_str(parts.next()?).ok()?;
    Some((format!("{date}_{clock}"), chat_id))
}

fn now_local() -> OffsetDateTime {
    OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc())
}

fn file_stamp(at: OffsetDateTime) -> String {
    at.format(format_description!("[year][month][day]_[hour][minute][second]"))
        .unwrap_or_else(|_| at.unix_timestamp().to_string())
}

/// `20250102_030405` as `2025-01-02 03:04:05`; unparseable stamps pass through.
pub(crate) fn display_stamp(stamp: &str) -> String {
    PrimitiveDateTime::parse(stamp, format_description!("[year][month][day]_[hour][minute][second]"))
        .ok()
        .and_then(|dt| dt.format(format_description!("[year]-[month]-[day] [hour]:[minute]:[second]")).ok())
        .unwrap_or_else(|| stamp.to_string())
}

#[cfg(test)]
#[path = "archive_test.rs"]
mod tests;
