//! Chat: session history, diagram blocks and the on-disk archive.
//!
//! ARCHITECTURE
//! ============
//! `sessions` owns the live per-browser history in memory. `archive` mirrors
//! finished turns to JSON files so chats survive restarts and can be reopened
//! from the chat page. `diagram` classifies replies that carry Mermaid or D2
//! source and renders them through the external CLIs.

pub mod archive;
pub mod diagram;
pub mod history;
pub mod sessions;

pub use archive::{ArchiveError, ChatArchive, ChatSummary};
pub use diagram::{DiagramBlock, DiagramError, DiagramKind, DiagramRenderer};
pub use history::{ChatHistory, ChatMessage, MessageContent, prepare_messages};
pub use sessions::{SessionSnapshot, SessionStore};
