//! Pages compiled into the binary.
//!
//! Most are static demo pages showing off the menu features: nesting,
//! group headers, dividers and the three icon families. The settings and
//! chat pages read live state from the [`PageContext`].

use std::sync::Arc;

use super::{Block, FieldKind, FormField, GroupType, NoticeLevel, Page, PageContent, PageContext};
use crate::config::Orientation;
use crate::llm::LlmStatus;
use crate::llm::config::{LARGE_MODEL_CHOICES, SMALL_MODEL_CHOICES};
use crate::services::settings::{SECRET_FIELDS, api_settings_view};
use crate::theme::{FONTS, ThemeStatus};

/// Every built-in page, in registration order.
#[must_use]
pub fn all() -> Vec<Arc<dyn Page>> {
    let mut pages: Vec<Arc<dyn Page>> = vec![Arc::new(ApiSettingsPage), Arc::new(ChatAssistantPage)];
    pages.extend(INFO_PAGES.iter().map(|p| Arc::new(*p) as Arc<dyn Page>));
    pages.push(Arc::new(ThemeSettingsPage));
    pages
}

// =============================================================================
// STATIC PAGES
// =============================================================================

/// A page whose menu metadata and body are fixed.
#[derive(Debug, Clone, Copy)]
struct InfoPage {
    key: &'static str,
    label: &'static str,
    icon: &'static str,
    icon_type: &'static str,
    order: i32,
    parent: Option<&'static str>,
    children: &'static [&'static str],
    group_type: GroupType,
    divider_before: bool,
    title: &'static str,
    intro: &'static str,
    bullets: &'static [&'static str],
}

impl InfoPage {
    const fn new(key: &'static str, label: &'static str, icon: &'static str, order: i32) -> Self {
        Self {
            key,
            label,
            icon,
            icon_type: "",
            order,
            parent: None,
            children: &[],
            group_type: GroupType::Leaf,
            divider_before: false,
            title: label,
            intro: "",
            bullets: &[],
        }
    }
}

impl Page for InfoPage {
    fn key(&self) -> &'static str {
        self.key
    }

    fn label(&self) -> &'static str {
        self.label
    }

    fn icon(&self) -> &'static str {
        self.icon
    }

    fn order(&self) -> i32 {
        self.order
    }

    fn icon_type(&self) -> &'static str {
        self.icon_type
    }

    fn parent(&self) -> Option<&'static str> {
        self.parent
    }

    fn children(&self) -> &'static [&'static str] {
        self.children
    }

    fn group_type(&self) -> GroupType {
        self.group_type
    }

    fn divider_before(&self) -> bool {
        self.divider_before
    }

    fn content(&self, _ctx: &PageContext) -> PageContent {
        let mut blocks = vec![Block::paragraph(self.intro)];
        if !self.bullets.is_empty() {
            blocks.push(Block::list(self.bullets.iter().copied()));
        }
        PageContent::new(self.title, blocks)
    }
}

// Alphabetical by key, like a directory scan.
const INFO_PAGES: [InfoPage; 12] = [
    InfoPage {
        divider_before: true,
        children: &["nested_level1"],
        intro: "This demonstrates a deeper menu hierarchy with multiple levels.",
        ..InfoPage::new("advanced_features", "Advanced Features", "gear-wide-connected", 110)
    },
    InfoPage {
        parent: Some("icon_types_group"),
        icon_type: "ad-",
        intro: "This page demonstrates Ant Design icons with the 'ad-' prefix.",
        bullets: &["Ant Design icons need the \"ad-\" prefix from `icon_type`.", "Example: `AppstoreOutlined`"],
        ..InfoPage::new("ant_design_icon_demo", "Ant Design Icons", "AppstoreOutlined", 102)
    },
    InfoPage {
        parent: Some("icon_types_group"),
        intro: "This page demonstrates Bootstrap icons (default icon type).",
        bullets: &["Bootstrap icons need no prefix.", "Example: `heart-fill`"],
        ..InfoPage::new("bootstrap_icon_demo", "Bootstrap Icons", "heart-fill", 101)
    },
    InfoPage {
        parent: Some("icon_types_group"),
        icon_type: "fa-",
        intro: "This page demonstrates FontAwesome icons with the 'fa-' prefix.",
        bullets: &["FontAwesome icons need the \"fa-\" prefix from `icon_type`.", "Example: `coffee`"],
        ..InfoPage::new("fontawesome_icon_demo", "FontAwesome Icons", "coffee", 103)
    },
    InfoPage {
        title: "Home Page",
        intro: "Welcome to the Home Page. This is the main dashboard of the application.",
        ..InfoPage::new("home", "Home", "house", 1)
    },
    InfoPage {
        group_type: GroupType::Group,
        title: "Icon Types Group",
        intro: "This is a group header that contains different icon type examples.",
        ..InfoPage::new("icon_types_group", "Icon Types", "palette2", 100)
    },
    InfoPage {
        title: "Menu Demo Parent",
        intro: "This is a parent page that demonstrates the hierarchical menu structure.",
        ..InfoPage::new("menu_demo", "Menu Demo", "list-nested", 90)
    },
    InfoPage {
        parent: Some("menu_demo"),
        intro: "This is a child page in the hierarchical menu.",
        ..InfoPage::new("menu_demo_child1", "Child Page 1", "1-circle", 91)
    },
    InfoPage {
        parent: Some("menu_demo"),
        intro: "This is another child page in the hierarchical menu.",
        ..InfoPage::new("menu_demo_child2", "Child Page 2", "2-circle", 92)
    },
    InfoPage {
        divider_before: true,
        title: "Menu Features Demo",
        intro: "This page demonstrates the features of the navigation menu.",
        bullets: &[
            "Group headers: the \"Icon Types\" section is a group header",
            "Dividers: notice the divider before the \"Advanced Features\" section",
            "Icon types: Bootstrap (default), Ant Design (\"ad-\") and FontAwesome (\"fa-\")",
            "Nested submenus: \"Advanced Features\" has multiple levels",
        ],
        ..InfoPage::new("menu_features_demo", "Menu Features", "palette", 95)
    },
    InfoPage {
        parent: Some("advanced_features"),
        children: &["nested_level2"],
        intro: "This is a nested submenu item at level 1.",
        ..InfoPage::new("nested_level1", "Nested Level 1", "diagram-2", 111)
    },
    InfoPage {
        parent: Some("nested_level1"),
        intro: "This is a deeply nested submenu item at level 2.",
        ..InfoPage::new("nested_level2", "Nested Level 2", "diagram-3", 112)
    },
];

fn select(options: &[&str]) -> FieldKind {
    FieldKind::Select { options: options.iter().map(|s| (*s).to_string()).collect() }
}

// =============================================================================
// THEME SETTINGS
// =============================================================================

struct ThemeSettingsPage;

impl Page for ThemeSettingsPage {
    fn key(&self) -> &'static str {
        "theme_settings"
    }

    fn label(&self) -> &'static str {
        "Theme Settings"
    }

    fn icon(&self) -> &'static str {
        "palette"
    }

    fn order(&self) -> i32 {
        3
    }

    fn content(&self, ctx: &PageContext) -> PageContent {
        let theme = &ctx.settings.host.theme;
        let menu = &ctx.settings.app.menu;
        let status = match ctx.settings.theme_status() {
            ThemeStatus::Light => "light",
            ThemeStatus::Dark => "dark",
            ThemeStatus::Custom => "custom",
        };
        let orientation = match menu.orientation {
            Orientation::Vertical => "vertical",
            Orientation::Horizontal => "horizontal",
        };
        let fields = vec![
            FormField::new("status", "Select Theme", select(&["light", "dark", "custom"]), status),
            FormField::new("orientation", "Select Menu Orientation", select(&["vertical", "horizontal"]), orientation),
            FormField::new("wide_mode", "Wide Mode", FieldKind::Checkbox, menu.wide_mode.to_string()),
            FormField::new(
                "use_multi_icon_menu",
                "Nested Icon Menu",
                FieldKind::Checkbox,
                menu.use_multi_icon_menu.to_string(),
            ),
            FormField::new("primary_color", "Primary Color", FieldKind::Color, &theme.primary_color),
            FormField::new("background_color", "Background Color", FieldKind::Color, &theme.background_color),
            FormField::new(
                "secondary_background_color",
                "Secondary Background Color",
                FieldKind::Color,
                &theme.secondary_background_color,
            ),
            FormField::new("text_color", "Text Color", FieldKind::Color, &theme.text_color),
            FormField::new("font", "Select Font", select(&FONTS), &theme.font),
        ];

        PageContent::new(
            "Theme Settings",
            vec![
                Block::paragraph("Colours and font apply when the theme is set to custom."),
                Block::Form {
                    action: "/api/settings/theme".into(),
                    method: "PUT".into(),
                    fields,
                    submit: "Apply Settings".into(),
                },
            ],
        )
    }
}

// =============================================================================
// API SETTINGS
// =============================================================================

struct ApiSettingsPage;

impl Page for ApiSettingsPage {
    fn key(&self) -> &'static str {
        "api_settings_page"
    }

    fn label(&self) -> &'static str {
        "API Settings"
    }

    fn icon(&self) -> &'static str {
        "gear"
    }

    fn order(&self) -> i32 {
        95
    }

    fn content(&self, ctx: &PageContext) -> PageContent {
        let view = api_settings_view(&ctx.settings.app);
        let mut blocks: Vec<Block> =
            view.warnings.iter().map(|w| Block::notice(NoticeLevel::Warning, w.as_str())).collect();
        if blocks.is_empty() {
            blocks.push(Block::notice(NoticeLevel::Success, "Keys for the selected models are set."));
        }

        let mut fields: Vec<FormField> = SECRET_FIELDS
            .iter()
            .zip(&view.keys)
            .map(|(&(name, label), status)| {
                let label = if status.set { format!("{label} (saved)") } else { label.to_string() };
                FormField::new(name, &label, FieldKind::Secret, "")
            })
            .collect();
        fields.push(FormField::new("large_model", "Large Model", select(&LARGE_MODEL_CHOICES), view.large_model));
        fields.push(FormField::new("small_model", "Small Model", select(&SMALL_MODEL_CHOICES), view.small_model));
        fields.push(FormField::new("db_file_path", "SQLite Marketdata Db Path", FieldKind::Text, view.db_file_path));

        blocks.push(Block::paragraph("Leave a key blank to keep the saved value."));
        blocks.push(Block::Form {
            action: "/api/settings/api".into(),
            method: "PUT".into(),
            fields,
            submit: "Save Settings".into(),
        });
        PageContent::new("API Keys", blocks)
    }
}

// =============================================================================
// CHAT ASSISTANT
// =============================================================================

struct ChatAssistantPage;

impl Page for ChatAssistantPage {
    fn key(&self) -> &'static str {
        "chat_assistant_page"
    }

    fn label(&self) -> &'static str {
        "Chat Assistant"
    }

    fn icon(&self) -> &'static str {
        "chat-right-dots"
    }

    fn order(&self) -> i32 {
        83
    }

    fn uses_chat(&self) -> bool {
        true
    }

    fn content(&self, ctx: &PageContext) -> PageContent {
        let mut blocks = vec![match &ctx.llm {
            LlmStatus::Ready { display_name, .. } => Block::notice(NoticeLevel::Info, format!("Model: {display_name}")),
            LlmStatus::Unavailable { reason } => Block::notice(NoticeLevel::Warning, reason.as_str()),
        }];
        if let Some(chat) = &ctx.chat {
            blocks.push(Block::Chat {
                chat_id: chat.chat_id.to_string(),
                messages: chat.history.messages().to_vec(),
                recent: ctx.recent_chats.clone(),
            });
        }
        PageContent::new("Chat Assistant", blocks)
    }
}

#[cfg(test)]
#[path = "builtin_test.rs"]
mod tests;
