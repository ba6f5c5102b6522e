//! Pages: registry of page implementations and their menu metadata.
//!
//! DESIGN
//! ======
//! Every page is a type implementing [`Page`]. The trait carries the menu
//! metadata (label, icon, order, parent, explicit children, group type,
//! divider) with defaults for everything optional, plus a `content` method
//! that renders the page body as [`PageContent`] blocks.
//!
//! `PageRegistry::discover` takes the compiled-in page list, drops entries
//! with empty or duplicate keys, and sorts the rest by order. Sorting is
//! stable, so pages sharing an order keep their registration order. The menu
//! tree is derived once from the sorted descriptors.

pub mod builtin;

use std::collections::HashSet;
use std::sync::Arc;

use serde::Serialize;

use crate::chat::{ChatMessage, ChatSummary, SessionSnapshot};
use crate::config::Settings;
use crate::llm::LlmStatus;
use crate::nav::{self, MenuItem};

// =============================================================================
// PAGE TRAIT
// =============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupType {
    #[default]
    Leaf,
    Group,
}

/// A page reachable from the navigation menu.
pub trait Page: Send + Sync {
    /// Stable identifier used in URLs and parent/children references.
    fn key(&self) -> &'static str;
    fn label(&self) -> &'static str;
    fn icon(&self) -> &'static str;
    fn order(&self) -> i32;

    /// Icon family prefix: `""` Bootstrap, `"ad-"` Ant Design, `"fa-"` FontAwesome.
    fn icon_type(&self) -> &'static str {
        ""
    }

    fn parent(&self) -> Option<&'static str> {
        None
    }

    /// Explicit child keys. A non-empty list overrides children found
    /// through `parent`.
    fn children(&self) -> &'static [&'static str] {
        &[]
    }

    fn group_type(&self) -> GroupType {
        GroupType::Leaf
    }

    fn divider_before(&self) -> bool {
        false
    }

    /// Whether `content` reads the chat session and archive.
    fn uses_chat(&self) -> bool {
        false
    }

    fn content(&self, ctx: &PageContext) -> PageContent;
}

/// Menu metadata read from a [`Page`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageDescriptor {
    pub key: String,
    pub label: String,
    pub icon: String,
    pub icon_type: String,
    pub order: i32,
    pub parent: Option<String>,
    pub children: Vec<String>,
    pub group_type: GroupType,
    pub divider_before: bool,
}

impl PageDescriptor {
    #[must_use]
    pub fn from_page(page: &dyn Page) -> Self {
        Self {
            key: page.key().to_string(),
            label: page.label().to_string(),
            icon: page.icon().to_string(),
            icon_type: page.icon_type().to_string(),
            order: page.order(),
            parent: page.parent().map(str::to_string),
            children: page.children().iter().map(|s| (*s).to_string()).collect(),
            group_type: page.group_type(),
            divider_before: page.divider_before(),
        }
    }
}

// =============================================================================
// PAGE CONTENT
// =============================================================================

/// Everything a page may read while rendering.
pub struct PageContext {
    pub settings: Settings,
    pub llm: LlmStatus,
    /// Present only for pages that declare `uses_chat`.
    pub chat: Option<SessionSnapshot>,
    pub recent_chats: Vec<ChatSummary>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Info,
    Warning,
    Success,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum FieldKind {
    Text,
    Secret,
    Color,
    Checkbox,
    Select { options: Vec<String> },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FormField {
    pub name: String,
    pub label: String,
    #[serde(flatten)]
    pub kind: FieldKind,
    pub value: String,
}

impl FormField {
    #[must_use]
    pub fn new(name: &str, label: &str, kind: FieldKind, value: impl Into<String>) -> Self {
        Self { name: name.to_string(), label: label.to_string(), kind, value: value.into() }
    }
}

/// One renderable piece of a page body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Block {
    Paragraph { text: String },
    List { items: Vec<String> },
    Notice { level: NoticeLevel, text: String },
    /// JSON form submitted to `action` with `method`.
    Form { action: String, method: String, fields: Vec<FormField>, submit: String },
    Chat { chat_id: String, messages: Vec<ChatMessage>, recent: Vec<ChatSummary> },
}

impl Block {
    #[must_use]
    pub fn paragraph(text: impl Into<String>) -> Self {
        Self::Paragraph { text: text.into() }
    }

    #[must_use]
    pub fn notice(level: NoticeLevel, text: impl Into<String>) -> Self {
        Self::Notice { level, text: text.into() }
    }

    #[must_use]
    pub fn list<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::List { items: items.into_iter().map(Into::into).collect() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageContent {
    pub title: String,
    pub blocks: Vec<Block>,
}

impl PageContent {
    #[must_use]
    pub fn new(title: impl Into<String>, blocks: Vec<Block>) -> Self {
        Self { title: title.into(), blocks }
    }
}

// =============================================================================
// REGISTRY
// =============================================================================

pub struct PageRegistry {
    pages: Vec<Arc<dyn Page>>,
    descriptors: Vec<PageDescriptor>,
    menu: Vec<MenuItem>,
    rejected: Vec<String>,
}

impl PageRegistry {
    /// Register `pages`, skipping empty and duplicate keys.
    #[must_use]
    pub fn discover(pages: Vec<Arc<dyn Page>>) -> Self {
        let mut seen = HashSet::new();
        let mut kept = Vec::with_capacity(pages.len());
        let mut rejected = Vec::new();

        for page in pages {
            let key = page.key();
            if key.trim().is_empty() {
                tracing::warn!(label = page.label(), "skipping page with empty key");
                rejected.push(format!("<empty key: {}>", page.label()));
                continue;
            }
            if !seen.insert(key) {
                tracing::warn!(key, "skipping duplicate page key");
                rejected.push(key.to_string());
                continue;
            }
            kept.push(page);
        }

        kept.sort_by_key(|p| p.order());
        let descriptors: Vec<PageDescriptor> = kept.iter().map(|p| PageDescriptor::from_page(p.as_ref())).collect();
        let menu = nav::build_menu(&descriptors);
        tracing::info!(pages = kept.len(), rejected = rejected.len(), "page registry ready");

        Self { pages: kept, descriptors, menu, rejected }
    }

    /// Registry of the pages compiled into the binary.
    #[must_use]
    pub fn builtin() -> Self {
        Self::discover(builtin::all())
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Arc<dyn Page>> {
        self.pages.iter().find(|p| p.key() == key)
    }

    /// Lowest-order page, shown when nothing valid is selected.
    #[must_use]
    pub fn default_page(&self) -> Option<&Arc<dyn Page>> {
        self.pages.first()
    }

    /// The page named by `key`, falling back to the default page.
    #[must_use]
    pub fn resolve(&self, key: Option<&str>) -> Option<&Arc<dyn Page>> {
        key.and_then(|k| self.get(k)).or_else(|| self.default_page())
    }

    #[cfg(test)]
    pub fn descriptors(&self) -> &[PageDescriptor] {
        &self.descriptors
    }

    #[must_use]
    pub fn menu(&self) -> &[MenuItem] {
        &self.menu
    }

    #[must_use]
    pub fn flat_menu(&self) -> Vec<MenuItem> {
        nav::flat_menu(&self.descriptors)
    }

    /// Keys that were refused at registration.
    #[must_use]
    pub fn rejected(&self) -> &[String] {
        &self.rejected
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.pages.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
