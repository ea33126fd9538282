use crate::cli::commands::{Cli, Commands};
use adbhutam::agent::Agent;
use adbhutam::commands::{
    ChatState, handle_chat_command, handle_config_command, handle_project_command, parse_command,
};
use adbhutam::storage::JsonFileStore;
use adbhutam::ui::{self, RenderMode, style};
use adbhutam::Config;
use anyhow::Result;
use std::io::Write;
use tokio::io::{self, AsyncBufReadExt, BufReader};
use tracing::info;

/// Memory session used by `run` and `chat`.
const CLI_SESSION: &str = "cli";

pub async fn dispatch(cli: Cli, config: Config) -> Result<()> {
    match cli.command {
        Commands::Run { input, debug } => {
            let agent = Agent::from_config(&config)?;
            let output = agent.handle(CLI_SESSION, &input).await;
            println!("{}", ui::render(&output, RenderMode::from_debug_flag(debug))?);
            Ok(())
        }

        Commands::Chat { debug } => run_chat(&config, debug).await,

        Commands::Gateway { port, host } => {
            let port = port.unwrap_or(config.gateway.port);
            let host = host.unwrap_or_else(|| config.gateway.host.clone());
            if port == 0 {
                info!("Starting Adbhutam gateway on {host} (random port)");
            } else {
                info!("Starting Adbhutam gateway on {host}:{port}");
            }
            adbhutam::gateway::run_gateway(&host, port, config).await
        }

        Commands::Project { project_command } => {
            let store = JsonFileStore::new(config.store_path());
            println!("{}", handle_project_command(project_command, &store)?);
            Ok(())
        }

        Commands::Config { config_command } => {
            println!("{}", handle_config_command(&config_command, &config)?);
            Ok(())
        }
    }
}

async fn run_chat(config: &Config, debug: bool) -> Result<()> {
    let agent = Agent::from_config(config)?;
    let mut state = ChatState::new(CLI_SESSION, debug);

    println!(
        "{} {}",
        style::accent("◆"),
        style::header("Adbhutam chat")
    );
    println!("  {}\n", style::dim("Type /help for commands, exit to leave."));

    let mut lines = BufReader::new(io::stdin()).lines();
    loop {
        print!("{} ", style::cyan("you ›"));
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };

        if let Some(command) = parse_command(&line) {
            let result = handle_chat_command(&command, &mut state, agent.memories());
            println!("{}\n", style::dim(&result.text));
            if result.exit {
                break;
            }
            continue;
        }

        let output = agent.handle(&state.session, &line).await;
        println!(
            "{}\n",
            ui::render(&output, RenderMode::from_debug_flag(state.debug))?
        );
    }

    Ok(())
}
