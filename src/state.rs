//! Shared application state.
//!
//! DESIGN
//! ======
//! `AppState` is injected into Axum handlers via the `State` extractor. It
//! holds the loaded settings, the page registry, the live chat sessions, the
//! chat archive and the active LLM client. The LLM client is derived from the
//! saved settings and rebuilt whenever the API settings change.

use std::sync::Arc;

use tokio::sync::RwLock;

use crate::chat::{ChatArchive, DiagramRenderer, SessionStore};
use crate::config::{ConfigStore, Settings};
use crate::llm::config::{LlmConfig, LlmTimeouts};
use crate::llm::{LlmChat, LlmClient, LlmStatus};
use crate::pages::PageRegistry;

// =============================================================================
// LLM SLOT
// =============================================================================

/// The active LLM client, or why there is none.
#[derive(Clone)]
pub enum LlmSlot {
    Ready(Arc<dyn LlmChat>),
    Unavailable(String),
}

impl LlmSlot {
    /// Build a client for the configured large model.
    #[must_use]
    pub fn from_settings(settings: &Settings, timeouts: LlmTimeouts) -> Self {
        match LlmConfig::large(&settings.app.llm, timeouts).and_then(LlmClient::from_config) {
            Ok(client) => {
                tracing::info!(model = client.model(), "llm client ready");
                Self::Ready(Arc::new(client))
            }
            Err(e) => {
                tracing::warn!(error = %e, "llm client unavailable");
                Self::Unavailable(e.to_string())
            }
        }
    }

    #[must_use]
    pub fn status(&self) -> LlmStatus {
        match self {
            Self::Ready(client) => LlmStatus::ready(client.model()),
            Self::Unavailable(reason) => LlmStatus::Unavailable { reason: reason.clone() },
        }
    }
}

// =============================================================================
// APP STATE
// =============================================================================

/// Shared application state, injected into Axum handlers via State extractor.
/// Clone is required by Axum; all inner fields are Arc-wrapped or Clone.
#[derive(Clone)]
pub struct AppState {
    pub config: ConfigStore,
    pub settings: Arc<RwLock<Settings>>,
    pub registry: Arc<PageRegistry>,
    pub sessions: SessionStore,
    pub archive: ChatArchive,
    pub diagrams: DiagramRenderer,
    pub llm: Arc<RwLock<LlmSlot>>,
    pub llm_timeouts: LlmTimeouts,
}

impl AppState {
    #[must_use]
    pub fn new(
        config: ConfigStore,
        settings: Settings,
        registry: PageRegistry,
        sessions: SessionStore,
        archive: ChatArchive,
        llm_timeouts: LlmTimeouts,
    ) -> Self {
        let slot = LlmSlot::from_settings(&settings, llm_timeouts);
        Self {
            config,
            settings: Arc::new(RwLock::new(settings)),
            registry: Arc::new(registry),
            sessions,
            archive,
            diagrams: DiagramRenderer::default(),
            llm: Arc::new(RwLock::new(slot)),
            llm_timeouts,
        }
    }

    /// Copy of the current settings.
    pub async fn settings(&self) -> Settings {
        self.settings.read().await.clone()
    }

    /// Swap in new settings and rebuild the LLM client from them.
    pub async fn replace_settings(&self, next: Settings) {
        let slot = LlmSlot::from_settings(&next, self.llm_timeouts);
        *self.settings.write().await = next;
        *self.llm.write().await = slot;
    }

    pub async fn llm_slot(&self) -> LlmSlot {
        self.llm.read().await.clone()
    }

    pub async fn llm_status(&self) -> LlmStatus {
        self.llm.read().await.status()
    }
}

#[cfg(test)]
#[path = "state_helpers_test.rs"]
pub mod test_helpers;
