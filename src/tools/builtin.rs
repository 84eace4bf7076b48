//! Built-in UI tools.
//!
//! Each tool publishes exactly one application event when it acts and returns
//! a small JSON acknowledgement for the model.
//!
//! # Example
//!
//! ```no_run
//! use switchboard::bus::EventBus;
//! use switchboard::tools::{builtin, ToolArguments, ToolContext};
//!
//! # async fn demo() -> switchboard::error::Result<()> {
//! let tool = builtin::toggle_sidebar_tool();
//! let ctx = ToolContext::detached(EventBus::new(), "ai-1");
//! let args = ToolArguments::new(serde_json::json!({ "action": "open" }));
//! let outcome = tool.execute(&args, &ctx).await?;
//! assert!(outcome.is_success());
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use serde::Deserialize;
use serde_json::json;
use tracing::{debug, warn};

use super::tool::{FnTool, Tool, ToolContext, ToolOutcome};
use super::types::ToolParameters;
use crate::bus::{
    AppEvent, ClearChatPayload, FormFillPayload, Page, PageNavigatePayload, SidebarResizePayload,
    SidebarSize, SidebarTogglePayload, SplitViewPage, SplitViewPayload, Theme, ThemeChangePayload,
};
use crate::storage::THEME_KEY;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
enum SidebarAction {
    Open,
    Close,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
enum ThemeChoice {
    Light,
    Dark,
    Toggle,
}

/// All built-in tools, in catalogue order.
pub fn all() -> Vec<Arc<dyn Tool>> {
    vec![
        toggle_sidebar_tool(),
        clear_chat_tool(),
        change_theme_tool(),
        navigate_to_page_tool(),
        open_split_view_tool(),
        fill_form_tool(),
        resize_sidebar_tool(),
    ]
}

pub fn toggle_sidebar_tool() -> Arc<dyn Tool> {
    Arc::new(FnTool::new(
        "toggle_sidebar",
        "Open or close the sidebar menu. Use this when the user asks to show/hide/open/close the sidebar or menu.",
        ToolParameters::object()
            .string_enum(
                "action",
                "Whether to open or close the sidebar",
                &["open", "close"],
                true,
            )
            .build(),
        |args, ctx| async move {
            let action: SidebarAction = args.field("action")?;
            let is_open = action == SidebarAction::Open;
            ctx.bus
                .publish(AppEvent::SidebarToggle(SidebarTogglePayload { is_open }));
            Ok(ToolOutcome::success(json!({ "action": args.get_str("action")? })))
        },
    ))
}

pub fn clear_chat_tool() -> Arc<dyn Tool> {
    Arc::new(FnTool::new(
        "clear_chat",
        "Clear all messages from the chat history. Use this when the user asks to clear, reset, or start a new conversation.",
        ToolParameters::object()
            .boolean("confirm", "Confirmation to clear the chat", true)
            .build(),
        |args, ctx| async move {
            if !args.get_bool("confirm")? {
                return Ok(ToolOutcome::declined(json!({ "message": "Clear cancelled" })));
            }
            ctx.bus
                .publish(AppEvent::ClearChat(ClearChatPayload { confirm: true }));
            Ok(ToolOutcome::success(json!({ "message": "Chat cleared" })).resetting_conversation())
        },
    ))
}

pub fn change_theme_tool() -> Arc<dyn Tool> {
    Arc::new(FnTool::new(
        "change_theme",
        "Change the app theme between light and dark mode. Use this when the user asks to switch theme, enable dark mode, or change appearance.",
        ToolParameters::object()
            .string_enum(
                "theme",
                "The theme to switch to, or \"toggle\" to switch between them",
                &["light", "dark", "toggle"],
                true,
            )
            .build(),
        |args, ctx| async move {
            let theme = match args.field::<ThemeChoice>("theme")? {
                ThemeChoice::Light => Theme::Light,
                ThemeChoice::Dark => Theme::Dark,
                ThemeChoice::Toggle => current_theme(&ctx).toggled(),
            };
            ctx.bus
                .publish(AppEvent::ThemeChange(ThemeChangePayload { theme }));
            if let Err(err) = ctx.preferences.set(THEME_KEY, &theme.to_string()) {
                warn!(error = %err, "failed to persist theme preference");
            }
            Ok(ToolOutcome::success(json!({ "theme": theme })))
        },
    ))
}

pub fn navigate_to_page_tool() -> Arc<dyn Tool> {
    Arc::new(FnTool::new(
        "navigate_to_page",
        "Navigate to a different page in the app. Use this when the user wants to open/go to/view settings, form, or chat pages (full page navigation).",
        ToolParameters::object()
            .string_enum(
                "page",
                "Which page to navigate to. chat=home page, settings=settings page, form=form page.",
                &["chat", "settings", "form"],
                true,
            )
            .build(),
        |args, ctx| async move {
            let page: Page = args.field("page")?;
            ctx.bus
                .publish(AppEvent::PageNavigate(PageNavigatePayload { page }));
            Ok(ToolOutcome::success(json!({ "page": page })))
        },
    ))
}

pub fn open_split_view_tool() -> Arc<dyn Tool> {
    Arc::new(FnTool::new(
        "open_split_view",
        "Open a page in split view alongside the chat. Use this when the user specifically mentions \"split view\" or wants to see a page while staying on chat.",
        ToolParameters::object()
            .string_enum(
                "page",
                "Which page to open in split view. Use \"none\" to close the split view.",
                &["settings", "form", "none"],
                true,
            )
            .build(),
        |args, ctx| async move {
            let page: SplitViewPage = args.field("page")?;
            let is_open = page != SplitViewPage::None;
            ctx.bus
                .publish(AppEvent::SplitViewToggle(SplitViewPayload { page, is_open }));
            Ok(ToolOutcome::success(json!({ "page": page, "isOpen": is_open })))
        },
    ))
}

pub fn fill_form_tool() -> Arc<dyn Tool> {
    Arc::new(FnTool::new(
        "fill_form",
        "Fill in the contact form fields with provided data. Use this when the user wants to add/enter information into the form (name, email, message).",
        ToolParameters::object()
            .string("name", "The name to fill in the form", false)
            .string("email", "The email address to fill in the form", false)
            .string("message", "The message content to fill in the form", false)
            .build(),
        |args, ctx| async move {
            let payload: FormFillPayload = args.deserialize()?;
            let filled = [&payload.name, &payload.email, &payload.message]
                .iter()
                .filter(|field| field.is_some())
                .count();
            ctx.bus.publish(AppEvent::FormFill(payload));
            Ok(ToolOutcome::success(json!({ "filled": filled })))
        },
    ))
}

pub fn resize_sidebar_tool() -> Arc<dyn Tool> {
    Arc::new(FnTool::new(
        "resize_sidebar",
        "Change the width/size of the sidebar. Use this when the user wants to make the sidebar bigger, smaller, wider, or narrower.",
        ToolParameters::object()
            .string_enum(
                "size",
                "The size to set the sidebar. small=narrow (16rem), medium=default (20rem), large=wide (24rem)",
                &["small", "medium", "large"],
                true,
            )
            .build(),
        |args, ctx| async move {
            let size: SidebarSize = args.field("size")?;
            ctx.bus
                .publish(AppEvent::SidebarResize(SidebarResizePayload { size }));
            Ok(ToolOutcome::success(json!({ "size": size })))
        },
    ))
}

fn current_theme(ctx: &ToolContext) -> Theme {
    match ctx.preferences.get(THEME_KEY) {
        Ok(Some(stored)) => stored.parse().unwrap_or_else(|_| {
            debug!(stored = %stored, "unrecognised stored theme; assuming light");
            Theme::Light
        }),
        Ok(None) => Theme::Light,
        Err(err) => {
            warn!(error = %err, "failed to read theme preference");
            Theme::Light
        }
    }
}
