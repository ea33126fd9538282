use serde::{Deserialize, Serialize};

/// Slash commands understood by the interactive chat loop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Command {
    New,
    Debug { enabled: Option<bool> },
    History,
    Help,
    Exit,
}

#[derive(Debug, Clone)]
pub struct CommandResult {
    pub text: String,
    pub exit: bool,
}

impl CommandResult {
    pub fn visible(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            exit: false,
        }
    }

    pub fn exit(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            exit: true,
        }
    }
}

/// Per-loop settings a chat command can change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatState {
    pub session: String,
    pub debug: bool,
}

impl ChatState {
    pub fn new(session: impl Into<String>, debug: bool) -> Self {
        Self {
            session: session.into(),
            debug,
        }
    }
}
