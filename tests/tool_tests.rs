//! Tests for the tool catalogue and dispatcher.

mod common;

use std::sync::Arc;

use common::*;
use pretty_assertions::assert_eq;
use serde_json::json;
use switchboard::bus::{EventBus, EventKind};
use switchboard::storage::{KeyValueStore, MemoryKeyValueStore, THEME_KEY};
use switchboard::tools::*;

fn context(bus: &EventBus) -> ToolContext {
    ToolContext::detached(bus.clone(), "ai-1")
}

async fn dispatch(bus: &EventBus, name: &str, args: serde_json::Value) -> ToolOutcome {
    let registry = ToolRegistry::builtin().unwrap();
    registry
        .dispatch(name, &ToolArguments::new(args), &context(bus))
        .await
}

#[test]
fn catalogue_wire_shape() {
    let registry = ToolRegistry::builtin().unwrap();
    let wire: Vec<serde_json::Value> = registry.definitions().iter().map(|d| d.to_wire()).collect();

    assert_eq!(wire.len(), 7);
    let theme = wire
        .iter()
        .find(|t| t["function"]["name"] == "change_theme")
        .unwrap();
    assert_eq!(theme["type"], "function");
    assert_eq!(
        theme["function"]["parameters"]["properties"]["theme"]["enum"],
        json!(["light", "dark", "toggle"])
    );
    assert_eq!(theme["function"]["parameters"]["required"], json!(["theme"]));

    let form = wire.iter().find(|t| t["function"]["name"] == "fill_form").unwrap();
    assert_eq!(form["function"]["parameters"]["required"], json!([]));
}

#[test]
fn descriptions_tell_page_tools_apart() {
    let registry = ToolRegistry::builtin().unwrap();
    let wire: Vec<serde_json::Value> = registry.definitions().iter().map(|d| d.to_wire()).collect();
    let function = |name: &str| {
        wire.iter()
            .find(|t| t["function"]["name"] == name)
            .map(|t| t["function"].clone())
            .unwrap()
    };

    let navigate = function("navigate_to_page");
    assert_eq!(
        navigate["description"],
        "Navigate to a different page in the app. Use this when the user wants to open/go to/view settings, form, or chat pages (full page navigation)."
    );
    assert_eq!(
        navigate["parameters"]["properties"]["page"]["description"],
        "Which page to navigate to. chat=home page, settings=settings page, form=form page."
    );

    let split = function("open_split_view");
    assert_eq!(
        split["description"],
        "Open a page in split view alongside the chat. Use this when the user specifically mentions \"split view\" or wants to see a page while staying on chat."
    );
    assert_eq!(
        split["parameters"]["properties"]["page"]["description"],
        "Which page to open in split view. Use \"none\" to close the split view."
    );

    assert_eq!(
        function("toggle_sidebar")["description"],
        "Open or close the sidebar menu. Use this when the user asks to show/hide/open/close the sidebar or menu."
    );
    assert_eq!(
        function("resize_sidebar")["parameters"]["properties"]["size"]["description"],
        "The size to set the sidebar. small=narrow (16rem), medium=default (20rem), large=wide (24rem)"
    );
}

#[tokio::test]
async fn toggle_sidebar_publishes_open_state() {
    let bus = EventBus::new();
    let recorder = EventRecorder::attach(&bus);

    let outcome = dispatch(&bus, "toggle_sidebar", json!({ "action": "close" })).await;

    assert_eq!(outcome.value, json!({ "success": true, "action": "close" }));
    assert_eq!(
        recorder.of(EventKind::SidebarToggle)[0].payload,
        json!({ "isOpen": false })
    );
}

#[tokio::test]
async fn navigate_and_resize_publish_their_event() {
    let bus = EventBus::new();
    let recorder = EventRecorder::attach(&bus);

    let nav = dispatch(&bus, "navigate_to_page", json!({ "page": "settings" })).await;
    let resize = dispatch(&bus, "resize_sidebar", json!({ "size": "small" })).await;

    assert_eq!(nav.value, json!({ "success": true, "page": "settings" }));
    assert_eq!(resize.value, json!({ "success": true, "size": "small" }));
    assert_eq!(recorder.types(), vec!["PAGE_NAVIGATE", "SIDEBAR_RESIZE"]);
}

#[tokio::test]
async fn split_view_reports_open_state() {
    let bus = EventBus::new();
    let recorder = EventRecorder::attach(&bus);

    let outcome = dispatch(&bus, "open_split_view", json!({ "page": "form" })).await;

    assert_eq!(outcome.value, json!({ "success": true, "page": "form", "isOpen": true }));
    assert_eq!(
        recorder.of(EventKind::SplitViewToggle)[0].payload,
        json!({ "page": "form", "isOpen": true })
    );
}

#[tokio::test]
async fn confirmed_clear_requests_a_history_reset() {
    let bus = EventBus::new();
    let recorder = EventRecorder::attach(&bus);

    let outcome = dispatch(&bus, "clear_chat", json!({ "confirm": true })).await;

    assert_eq!(outcome.value, json!({ "success": true, "message": "Chat cleared" }));
    assert!(outcome.resets_conversation);
    assert_eq!(recorder.of(EventKind::ClearChat)[0].payload, json!({ "confirm": true }));
}

#[tokio::test]
async fn explicit_theme_is_persisted() {
    let bus = EventBus::new();
    let prefs = Arc::new(MemoryKeyValueStore::new());
    let ctx = ToolContext::new(bus.clone(), "ai-1", prefs.clone());
    let registry = ToolRegistry::builtin().unwrap();

    registry
        .dispatch("change_theme", &ToolArguments::new(json!({ "theme": "dark" })), &ctx)
        .await;
    let toggled = registry
        .dispatch("change_theme", &ToolArguments::new(json!({ "theme": "toggle" })), &ctx)
        .await;

    assert_eq!(toggled.value["theme"], "light");
    assert_eq!(prefs.get(THEME_KEY).unwrap().as_deref(), Some("light"));
}

#[tokio::test]
async fn invalid_arguments_publish_nothing() {
    let bus = EventBus::new();
    let recorder = EventRecorder::attach(&bus);

    let missing = dispatch(&bus, "toggle_sidebar", json!({})).await;
    let wrong_type = dispatch(&bus, "clear_chat", json!({ "confirm": "yes" })).await;
    let off_enum = dispatch(&bus, "change_theme", json!({ "theme": "sepia" })).await;

    for outcome in [&missing, &wrong_type, &off_enum] {
        assert_eq!(outcome.value["success"], false);
        assert!(outcome.value["error"]
            .as_str()
            .unwrap()
            .starts_with("Invalid arguments"));
    }
    assert!(recorder.all().is_empty());
}

#[tokio::test]
async fn unknown_tool_is_a_failure_value() {
    let bus = EventBus::new();
    let outcome = dispatch(&bus, "self_destruct", json!({})).await;
    assert_eq!(outcome.value, json!({ "success": false, "error": "Unknown tool" }));
}

#[tokio::test]
async fn custom_tools_join_the_catalogue() {
    let echo: Arc<dyn Tool> = Arc::new(FnTool::new(
        "echo",
        "Echo the text back",
        ToolParameters::object()
            .string("text", "Text to echo", true)
            .build(),
        |args, _ctx| async move {
            Ok(ToolOutcome::success(json!({ "text": args.get_str("text")? })))
        },
    ));
    let registry = ToolRegistry::new(vec![echo]).unwrap();
    let bus = EventBus::new();

    let outcome = registry
        .dispatch("echo", &ToolArguments::new(json!({ "text": "hi" })), &context(&bus))
        .await;

    assert_eq!(outcome.value, json!({ "success": true, "text": "hi" }));
}

#[test]
fn duplicate_builtin_names_are_rejected() {
    let mut tools = builtin::all();
    tools.push(builtin::clear_chat_tool());
    assert!(ToolRegistry::new(tools).is_err());
}
