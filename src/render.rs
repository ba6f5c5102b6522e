//! HTML rendering for the page shell and page blocks.
//!
//! DESIGN
//! ======
//! Pages are Leptos `view!` trees rendered to a complete HTML document on the
//! server; no WASM bundle is shipped. Forms are submitted as JSON by a small
//! inline script, which reloads the page on success and shows the error body
//! inline otherwise. Diagram blocks are sent as source, rendered to SVG on
//! demand through `POST /api/diagram/render` and shown as an `<img>` data URI
//! so markup inside the SVG never runs.

use leptos::prelude::*;
use leptos::tachys::view::RenderHtml;
use leptos::tachys::view::any_view::{AnyView, IntoAny};

use crate::chat::{ChatMessage, ChatSummary, MessageContent};
use crate::config::{Orientation, Settings};
use crate::llm::types::Role;
use crate::nav::{ItemKind, MenuItem};
use crate::pages::{Block, FieldKind, FormField, NoticeLevel, PageContent};

/// Everything the shell needs besides the page body.
pub struct ShellView<'a> {
    pub settings: &'a Settings,
    pub menu: &'a [MenuItem],
    pub active: &'a str,
    pub content: &'a PageContent,
}

/// Render a view tree to an HTML string under a throwaway reactive owner.
fn render_document<V: RenderHtml>(view: impl FnOnce() -> V) -> String {
    Owner::new().with(|| view().to_html())
}

// =============================================================================
// SHELL
// =============================================================================

/// Full HTML document for one page.
#[must_use]
pub fn page_html(shell: &ShellView<'_>) -> String {
    let menu_settings = &shell.settings.app.menu;
    let layout = match menu_settings.orientation {
        Orientation::Vertical => "vertical",
        Orientation::Horizontal => "horizontal",
    };
    let width = if menu_settings.wide_mode { "wide" } else { "centered" };
    let css = format!("{}\n{STYLE}", shell.settings.host.theme.css());
    let title = shell.content.title.clone();
    let heading = title.clone();
    let blocks = shell.content.blocks.clone();

    let document = render_document(|| {
        let menu = menu_list(shell.menu, shell.active);
        let body = blocks.into_iter().map(block_view).collect_view();
        view! {
            <html lang="en">
                <head>
                    <meta charset="utf-8"/>
                    <meta name="viewport" content="width=device-width, initial-scale=1"/>
                    <title>{title}</title>
                    <style inner_html=css></style>
                </head>
                <body class=layout>
                    <nav class="menu">{menu}</nav>
                    <main class=width>
                        <h1>{heading}</h1>
                        {body}
                    </main>
                    <script inner_html=SCRIPT></script>
                </body>
            </html>
        }
    });
    format!("<!DOCTYPE html>\n{document}")
}

fn menu_list(items: &[MenuItem], active: &str) -> AnyView {
    let entries = items.iter().map(|item| menu_entry(item, active)).collect_view();
    view! { <ul>{entries}</ul> }.into_any()
}

fn menu_entry(item: &MenuItem, active: &str) -> AnyView {
    let divider = (item.kind == Some(ItemKind::Divider))
        .then(|| view! { <li class="divider" role="separator"></li> });
    let icon_name = item.icon.clone();
    let icon = view! { <span class="icon" data-icon=icon_name></span> };
    let label = item.label.clone();
    let is_group = item.kind == Some(ItemKind::Group);

    let head = if is_group {
        view! { <span class="group-label">{icon}{label}</span> }.into_any()
    } else {
        let href = format!("/page/{}", item.key);
        let class = if item.key == active { "active" } else { "" };
        view! { <a href=href class=class>{icon}{label}</a> }.into_any()
    };
    let children = (!item.children.is_empty()).then(|| menu_list(&item.children, active));
    let entry_class = if is_group { "group" } else { "entry" };

    view! {
        {divider}
        <li class=entry_class>{head}{children}</li>
    }
    .into_any()
}

// =============================================================================
// BLOCKS
// =============================================================================

fn block_view(block: Block) -> AnyView {
    match block {
        Block::Paragraph { text } => view! { <p>{text}</p> }.into_any(),
        Block::List { items } => {
            let items = items.into_iter().map(|item| view! { <li>{item}</li> }).collect_view();
            view! { <ul class="bullets">{items}</ul> }.into_any()
        }
        Block::Notice { level, text } => {
            let class = format!("notice {}", notice_class(level));
            view! { <div class=class>{text}</div> }.into_any()
        }
        Block::Form { action, method, fields, submit } => {
            view! { <SettingsForm action=action method=method fields=fields submit=submit/> }.into_any()
        }
        Block::Chat { chat_id, messages, recent } => {
            view! { <ChatPanel chat_id=chat_id messages=messages recent=recent/> }.into_any()
        }
    }
}

fn notice_class(level: NoticeLevel) -> &'static str {
    match level {
        NoticeLevel::Info => "info",
        NoticeLevel::Warning => "warning",
        NoticeLevel::Success => "success",
    }
}

/// JSON form posted to `action` by the inline script.
#[component]
fn SettingsForm(action: String, method: String, fields: Vec<FormField>, submit: String) -> impl IntoView {
    let inputs = fields.into_iter().map(|field| view! { <FieldInput field=field/> }).collect_view();
    view! {
        <form class="settings" data-action=action data-method=method>
            {inputs}
            <button type="submit">{submit}</button>
            <div class="form-error" hidden=true></div>
        </form>
    }
}

/// One labelled input. Secret fields are always rendered empty.
#[component]
fn FieldInput(field: FormField) -> impl IntoView {
    let FormField { name, label, kind, value } = field;
    let input = match kind {
        FieldKind::Text => view! { <input type="text" name=name value=value/> }.into_any(),
        FieldKind::Secret => view! { <input type="password" name=name value="" autocomplete="off"/> }.into_any(),
        FieldKind::Color => view! { <input type="color" name=name value=value/> }.into_any(),
        FieldKind::Checkbox => {
            let checked = value == "true";
            view! { <input type="checkbox" name=name checked=checked/> }.into_any()
        }
        FieldKind::Select { options } => {
            let options = options
                .into_iter()
                .map(|option| {
                    let selected = option == value;
                    let text = option.clone();
                    view! { <option value=option selected=selected>{text}</option> }
                })
                .collect_view();
            view! { <select name=name>{options}</select> }.into_any()
        }
    };
    view! { <label>{label}{input}</label> }
}

// =============================================================================
// CHAT
// =============================================================================

#[component]
fn ChatPanel(chat_id: String, messages: Vec<ChatMessage>, recent: Vec<ChatSummary>) -> impl IntoView {
    let recent = (!recent.is_empty()).then(|| {
        let entries = recent.into_iter().map(recent_entry).collect_view();
        view! {
            <div class="recent">
                <h3>"Recent Chats"</h3>
                <ul>{entries}</ul>
            </div>
        }
    });
    let log = messages.into_iter().map(message_view).collect_view();

    view! {
        <section class="chat" data-chat-id=chat_id>
            <div class="chat-actions">
                <button type="button" data-post="/api/chats/new">"New Chat"</button>
                <button type="button" data-delete="/api/chat">"Clear"</button>
            </div>
            {recent}
            <div class="chat-log">{log}</div>
            <form class="prompt" data-action="/api/chat" data-method="POST">
                <textarea name="prompt" rows="3" placeholder="Ask a question"></textarea>
                <button type="submit">"Send"</button>
                <div class="form-error" hidden=true></div>
            </form>
        </section>
    }
}

fn recent_entry(summary: ChatSummary) -> impl IntoView {
    let load = format!("/api/chats/{}/load", summary.chat_id);
    let title = if summary.title.is_empty() { "(untitled)".to_string() } else { summary.title };
    let saved_at = summary.saved_at;
    view! {
        <li>
            <button type="button" data-post=load>{title}</button>
            <small>{saved_at}</small>
        </li>
    }
}

fn message_view(message: ChatMessage) -> AnyView {
    let class = match message.role {
        Role::User => "msg user",
        Role::Assistant => "msg assistant",
    };
    match message.content {
        MessageContent::Text(text) => view! { <div class=class>{text}</div> }.into_any(),
        MessageContent::Diagram(block) => {
            let kind = block.kind.as_str();
            let source = block.source;
            view! {
                <div class="msg diagram">
                    <pre class="diagram-source" data-kind=kind>{source}</pre>
                    <div class="diagram-svg"></div>
                </div>
            }
            .into_any()
        }
    }
}

// =============================================================================
// ASSETS
// =============================================================================

const STYLE: &str = r"
body { margin: 0; display: flex; min-height: 100vh; }
body.horizontal { flex-direction: column; }
nav.menu { background: var(--bg-secondary); padding: 1rem; }
body.vertical nav.menu { width: 16rem; }
body.horizontal nav.menu > ul { display: flex; gap: 1rem; }
nav.menu ul { list-style: none; padding-left: 0.75rem; margin: 0; }
nav.menu a { color: var(--text); text-decoration: none; display: block; padding: 0.2rem 0; }
nav.menu a.active { color: var(--primary); font-weight: bold; }
nav.menu .group-label { opacity: 0.7; text-transform: uppercase; font-size: 0.8em; }
nav.menu .divider { border-top: 1px solid var(--text); opacity: 0.3; margin: 0.5rem 0; }
main { flex: 1; padding: 1rem 2rem; }
main.centered { max-width: 46rem; margin: 0 auto; }
.notice { padding: 0.5rem 0.75rem; border-left: 4px solid var(--primary); margin: 0.5rem 0; }
.notice.warning { border-color: #E6A700; }
.notice.success { border-color: #2A2; }
.form-error { color: #D33; }
.diagram-svg img { max-width: 100%; }
form label { display: block; margin: 0.5rem 0; }
.chat-log .msg { white-space: pre-wrap; padding: 0.5rem; margin: 0.25rem 0; border-radius: 4px; }
.chat-log .msg.user { background: var(--bg-secondary); }
.chat-log pre.diagram-source { display: none; }
";

const SCRIPT: &str = r#"
async function send(url, method, body) {
  const init = { method, headers: { "Content-Type": "application/json" } };
  if (body !== undefined) init.body = JSON.stringify(body);
  const res = await fetch(url, init);
  if (res.ok) return res.json().catch(() => ({}));
  const err = await res.json().catch(() => ({ message: res.statusText }));
  throw new Error(err.message || res.statusText);
}

document.querySelectorAll("form[data-action]").forEach((form) => {
  form.addEventListener("submit", async (ev) => {
    ev.preventDefault();
    const body = {};
    for (const el of form.elements) {
      if (!el.name) continue;
      if (el.type === "checkbox") body[el.name] = el.checked;
      else if (el.type === "password" && el.value === "") continue;
      else body[el.name] = el.value;
    }
    const errorBox = form.querySelector(".form-error");
    try {
      await send(form.dataset.action, form.dataset.method, body);
      location.reload();
    } catch (e) {
      errorBox.textContent = e.message;
      errorBox.hidden = false;
    }
  });
});

document.querySelectorAll("button[data-post], button[data-delete]").forEach((btn) => {
  btn.addEventListener("click", async () => {
    const url = btn.dataset.post || btn.dataset.delete;
    const method = btn.dataset.post ? "POST" : "DELETE";
    try { await send(url, method); location.reload(); } catch (e) { alert(e.message); }
  });
});

document.querySelectorAll("pre.diagram-source").forEach(async (pre) => {
  const target = pre.nextElementSibling;
  try {
    const out = await send("/api/diagram/render", "POST", { type: pre.dataset.kind, source: pre.textContent });
    const img = document.createElement("img");
    img.alt = pre.dataset.kind + " diagram";
    img.src = "data:image/svg+xml;charset=utf-8," + encodeURIComponent(out.svg);
    target.replaceChildren(img);
  } catch (e) {
    pre.style.display = "block";
    target.textContent = "Diagram could not be rendered: " + e.message;
  }
});
"#;

#[cfg(test)]
#[path = "render_test.rs"]
mod tests;
