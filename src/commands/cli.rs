use clap::Subcommand;
use serde::{Deserialize, Serialize};

/// Project chunk storage subcommands
#[derive(Subcommand, Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum ProjectCommands {
    /// Append a chunk version to a project module
    Save {
        /// Project name
        #[arg(long)]
        project: String,
        /// Module inside the project
        #[arg(long)]
        module: String,
        /// Language of the module (recorded on first save)
        #[arg(long)]
        language: Option<String>,
        /// Chunk number, starting at 1
        #[arg(long)]
        chunk_id: u32,
        /// Chunk content
        #[arg(long)]
        content: Option<String>,
    },
    /// Print a stored project as JSON
    Show {
        /// Project name
        name: String,
    },
    /// Delete every stored project
    Clear,
}

/// Configuration subcommands
#[derive(Subcommand, Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum ConfigCommands {
    /// Print the effective configuration with secrets masked
    Show,
}
