//! Terminal chat with a configured hosted agent.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use colored::*;

use foundry_agent::cli::{display_error_with_suggestions, ChatSession, Flow};
use foundry_agent::invoker::Invoker;

#[derive(Parser, Debug)]
#[command(name = "foundry-chat", version, about = "Chat with a hosted agent and its MCP tools")]
struct Cli {
    /// Agent name, as configured under [agents.<name>]
    agent_name: String,

    /// Agent config file (default: $FOUNDRY_AGENT_CONFIG or agent_config.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Environment file (default: ai_foundry.env when present)
    #[arg(short, long)]
    env_file: Option<PathBuf>,

    /// Send one message, print the reply and exit
    #[arg(short, long)]
    message: Option<String>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let session = Invoker::from_environment(cli.config.as_deref(), cli.env_file.as_deref())
        .and_then(|invoker| ChatSession::new(invoker, &cli.agent_name));
    let mut session = match session {
        Ok(session) => session,
        Err(e) => {
            display_error_with_suggestions(&e, "could not start the chat session");
            std::process::exit(1);
        }
    };

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    if let Some(message) = cli.message {
        runtime.block_on(session.handle(&message));
        return Ok(());
    }

    session.print_welcome();
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        print!("{} ", "You:".blue().bold());
        io::stdout().flush()?;

        let Some(line) = lines.next() else {
            println!();
            break;
        };
        if runtime.block_on(session.handle(&line?)) == Flow::Exit {
            break;
        }
    }

    Ok(())
}
