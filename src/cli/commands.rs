//! Handlers for the CLI subcommands.

use std::io::Write;
use std::sync::Arc;

use crate::agent::{ConversationAgent, Credential, RequestOutcome, ResponseRequest};
use crate::bus::{ChunkPayload, Event, EventBus, EventKind, Subscription};
use crate::config::AgentConfig;
use crate::error::{Result, SwitchboardError};
use crate::storage::{
    FileKeyValueStore, FileSubmissionStore, KeyValueStore, SubmissionStore, API_KEY_KEY,
};
use crate::tools::ToolRegistry;

use super::{ChatArgs, KeyCommands, SubmissionCommands};

/// Events the host UI would react to; printed to stderr by `chat`.
const UI_EVENTS: [EventKind; 8] = [
    EventKind::ToolCall,
    EventKind::SidebarToggle,
    EventKind::SidebarResize,
    EventKind::ThemeChange,
    EventKind::PageNavigate,
    EventKind::SplitViewToggle,
    EventKind::FormFill,
    EventKind::ClearChat,
];

pub async fn handle_chat(args: ChatArgs) -> Result<()> {
    let mut config = AgentConfig::load(AgentConfig::default_path())?;
    if let Some(model) = args.model {
        config = config.with_model(model);
    }

    let store: Arc<dyn KeyValueStore> = Arc::new(FileKeyValueStore::new_default());
    let credential = match args.api_key {
        Some(key) => key,
        None => AgentConfig::resolve_credential(store.as_ref())?.unwrap_or_default(),
    };

    let bus = EventBus::new();
    let agent = ConversationAgent::from_config(bus.clone(), &config)?.with_preferences(store);
    let _subscriptions = print_events(&bus);

    let message_id = format!("ai-{}", chrono::Utc::now().timestamp_millis());
    let outcome = agent
        .respond(ResponseRequest::new(args.prompt, message_id, credential))
        .await;
    println!();

    match outcome {
        RequestOutcome::Completed { .. } => Ok(()),
        RequestOutcome::Errored { error, .. } => Err(SwitchboardError::Transport(error)),
    }
}

fn print_events(bus: &EventBus) -> Vec<Subscription> {
    let mut subscriptions = vec![bus.on(EventKind::AiResponseChunk, |payload: ChunkPayload| {
        print!("{}", payload.chunk);
        let _ = std::io::stdout().flush();
        futures::future::ready(Ok(()))
    })];
    for kind in UI_EVENTS {
        subscriptions.push(bus.subscribe(kind, |event: Arc<Event>| {
            eprintln!("\n⚡ {} {}", event.event_type, event.payload);
            futures::future::ready(Ok(()))
        }));
    }
    subscriptions
}

pub fn handle_key(command: KeyCommands) -> Result<()> {
    let store = FileKeyValueStore::new_default();
    match command {
        KeyCommands::Set { key } => {
            let config = AgentConfig::from_env()?;
            let credential = Credential::new(key);
            credential.validate(config.min_credential_len)?;
            store.set(API_KEY_KEY, credential.expose())?;
            println!("Stored API key {}", credential.masked());
        }
        KeyCommands::Show => match store.get(API_KEY_KEY)? {
            Some(key) => println!("{}", Credential::new(key).masked()),
            None => println!("No API key stored"),
        },
        KeyCommands::Clear => {
            store.remove(API_KEY_KEY)?;
            println!("API key removed");
        }
    }
    Ok(())
}

pub fn handle_tools() -> Result<()> {
    let registry = ToolRegistry::builtin()?;
    let catalogue: Vec<serde_json::Value> =
        registry.definitions().iter().map(|d| d.to_wire()).collect();
    println!("{}", serde_json::to_string_pretty(&catalogue)?);
    Ok(())
}

pub fn handle_submissions(command: SubmissionCommands) -> Result<()> {
    let store = FileSubmissionStore::new_default();
    match command {
        SubmissionCommands::List => {
            println!("{}", serde_json::to_string_pretty(&store.list()?)?);
        }
        SubmissionCommands::Clear => {
            store.clear()?;
            println!("Submissions cleared");
        }
    }
    Ok(())
}
