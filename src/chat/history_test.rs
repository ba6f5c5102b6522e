use super::*;
use crate::chat::diagram::DiagramKind;

fn user(text: &str) -> ChatMessage {
    ChatMessage::text(Role::User, text)
}

fn assistant(text: &str) -> ChatMessage {
    ChatMessage::text(Role::Assistant, text)
}

#[test]
fn append_keeps_order_and_clear_empties() {
    let mut history = ChatHistory::new();
    for i in 0..5 {
        history.push(user(&format!("m{i}")));
    }
    assert_eq!(history.len(), 5);
    let texts: Vec<_> = history.messages().iter().filter_map(|m| m.content.as_text()).collect();
    assert_eq!(texts, vec!["m0", "m1", "m2", "m3", "m4"]);

    history.clear();
    assert!(history.is_empty());
}

#[test]
fn first_user_text_skips_assistant_lead() {
    let history = ChatHistory::from_messages(vec![assistant("welcome"), user("question")]);
    assert_eq!(history.first_user_text(), Some("question"));
    assert_eq!(ChatHistory::new().first_user_text(), None);
}

#[test]
fn prepare_inserts_filler_between_user_turns() {
    let prepared = prepare_messages(&[user("a"), user("b")]);
    assert_eq!(prepared, vec![Message::user("a"), Message::assistant("I understand."), Message::user("b")]);
}

#[test]
fn prepare_appends_continue_after_assistant() {
    let prepared = prepare_messages(&[user("a"), assistant("b")]);
    assert_eq!(prepared.last(), Some(&Message::user("Please continue.")));
    assert_eq!(prepared.len(), 3);
}

#[test]
fn prepare_skips_diagram_messages() {
    let block = DiagramBlock { kind: DiagramKind::Mermaid, source: "graph TD".into() };
    let prepared = prepare_messages(&[user("draw"), assistant("here"), ChatMessage::diagram(block), user("thanks")]);
    assert_eq!(prepared, vec![Message::user("draw"), Message::assistant("here"), Message::user("thanks")]);
}

#[test]
fn prepare_empty_history_is_empty() {
    assert!(prepare_messages(&[]).is_empty());
}

#[test]
fn message_json_round_trips_both_content_kinds() {
    let block = DiagramBlock { kind: DiagramKind::D2, source: "a -> b".into() };
    let history = ChatHistory::from_messages(vec![user("hi"), ChatMessage::diagram(block.clone())]);

    let json = serde_json::to_value(&history).unwrap();
    assert_eq!(json[0]["content"], "hi");
    assert_eq!(json[1]["content"]["type"], "d2");

    let back: ChatHistory = serde_json::from_value(json).unwrap();
    assert_eq!(back.messages()[1].content, MessageContent::Diagram(block));
}

#[test]
fn message_without_timestamp_still_parses() {
    let msg: ChatMessage = serde_json::from_str(r#"{"role":"assistant","content":"ok"}"#).unwrap();
    assert_eq!(msg.role, Role::Assistant);
    assert_eq!(msg.content.as_text(), Some("ok"));
}
