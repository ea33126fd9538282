use anyhow::{Context, Result};

use super::cli::{ConfigCommands, ProjectCommands};
use super::types::{ChatState, Command, CommandResult};
use crate::config::Config;
use crate::memory::MemoryRegistry;
use crate::storage::{ChunkSubmission, ProjectStore};

const MASKED: &str = "****";

pub fn handle_chat_command(
    command: &Command,
    state: &mut ChatState,
    memories: &MemoryRegistry,
) -> CommandResult {
    match command {
        Command::New => {
            memories.clear(&state.session);
            CommandResult::visible("Session reset. Starting fresh.")
        }
        Command::Debug { enabled } => {
            state.debug = enabled.unwrap_or(!state.debug);
            let label = if state.debug { "on" } else { "off" };
            CommandResult::visible(format!("Debug output {label}."))
        }
        Command::History => {
            let turns = memories.snapshot(&state.session).len();
            CommandResult::visible(format!("{turns} message(s) remembered in this session."))
        }
        Command::Help => CommandResult::visible(
            "/new     -- Forget this session's history\n\
             /debug   -- Toggle the structured trace (/debug on|off)\n\
             /history -- Show how many messages are remembered\n\
             /help    -- Show this help message\n\
             exit     -- Leave the chat",
        ),
        Command::Exit => CommandResult::exit("Goodbye."),
    }
}

pub fn handle_project_command(command: ProjectCommands, store: &dyn ProjectStore) -> Result<String> {
    match command {
        ProjectCommands::Save {
            project,
            module,
            language,
            chunk_id,
            content,
        } => {
            let stored = store.save_chunk(ChunkSubmission {
                project: Some(project),
                module: Some(module),
                language,
                chunk_id: Some(chunk_id),
                content,
            })?;
            Ok(serde_json::to_string_pretty(&stored)?)
        }
        ProjectCommands::Show { name } => match store.project(&name)? {
            Some(project) => Ok(serde_json::to_string_pretty(&project)?),
            None => anyhow::bail!("project not found: {name}"),
        },
        ProjectCommands::Clear => {
            store.clear_all()?;
            Ok("All projects cleared.".to_string())
        }
    }
}

pub fn handle_config_command(command: &ConfigCommands, config: &Config) -> Result<String> {
    match command {
        ConfigCommands::Show => {
            let mut shown = config.clone();
            if shown.api_key.is_some() {
                shown.api_key = Some(MASKED.to_string());
            }
            let body = toml::to_string_pretty(&shown).context("Failed to serialize config")?;
            Ok(format!(
                "# {}\n# workspace: {}\n{body}",
                config.config_path.display(),
                config.workspace_dir.display()
            ))
        }
    }
}
