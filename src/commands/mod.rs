pub mod cli;
pub mod handlers;
pub mod parser;
pub mod types;

pub use cli::{ConfigCommands, ProjectCommands};
pub use handlers::{handle_chat_command, handle_config_command, handle_project_command};
pub use parser::parse_command;
pub use types::{ChatState, Command, CommandResult};
