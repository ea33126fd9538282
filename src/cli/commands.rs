use adbhutam::{ConfigCommands, ProjectCommands};
use clap::{Parser, Subcommand};

/// `Adbhutam` - stage-gated intent pipeline with auditable decision records.
#[derive(Parser, Debug)]
#[command(name = "adbhutam")]
#[command(version)]
#[command(about = "Understand, decide, plan, execute, validate and finalize a request.", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run one input through the pipeline and print the reply
    Run {
        /// Text to process
        input: String,

        /// Print the full structured trace instead of the summary
        #[arg(long)]
        debug: bool,
    },

    /// Interactive chat loop with session memory
    Chat {
        /// Print the full structured trace for every turn
        #[arg(long)]
        debug: bool,
    },

    /// Start the HTTP gateway
    Gateway {
        /// Port to listen on (use 0 for random available port)
        #[arg(short, long)]
        port: Option<u16>,

        /// Host to bind to
        #[arg(long)]
        host: Option<String>,
    },

    /// Manage stored project chunks
    Project {
        #[command(subcommand)]
        project_command: ProjectCommands,
    },

    /// Inspect configuration
    Config {
        #[command(subcommand)]
        config_command: ConfigCommands,
    },
}
