//! Interactive chat session over one configured agent.

use colored::*;

use crate::error::AgentResult;
use crate::invoker::Invoker;
use crate::orchestration::{RunResult, TranscriptEntry, TranscriptRole};
use crate::profile::AgentProfile;

/// One line of user input, interpreted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Leave the session
    Exit,
    /// Show the command list
    Help,
    /// Show agent and thread
    Status,
    /// Forget the current thread
    NewThread,
    /// Blank input
    Empty,
    /// Anything else goes to the agent
    Message(String),
}

impl Command {
    /// Parse one input line.
    pub fn parse(input: &str) -> Self {
        let trimmed = input.trim();
        match trimmed.to_lowercase().as_str() {
            "" => Command::Empty,
            "exit" | "quit" | "bye" | "q" => Command::Exit,
            "help" | "?" => Command::Help,
            "status" => Command::Status,
            "new" => Command::NewThread,
            _ => Command::Message(trimmed.to_string()),
        }
    }
}

/// What the input loop should do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Read the next line
    Continue,
    /// Stop reading
    Exit,
}

/// Chat session state: the agent profile and the thread carried across turns.
pub struct ChatSession {
    invoker: Invoker,
    profile: AgentProfile,
    thread_id: Option<String>,
    turns: usize,
}

impl ChatSession {
    /// Start a session with `agent_name`.
    ///
    /// # Errors
    ///
    /// Fails with a configuration error when the agent is unknown.
    pub fn new(invoker: Invoker, agent_name: &str) -> AgentResult<Self> {
        let profile = invoker.profile(agent_name)?;
        Ok(Self {
            invoker,
            profile,
            thread_id: None,
            turns: 0,
        })
    }

    /// Agent name.
    pub fn agent_name(&self) -> &str {
        &self.profile.name
    }

    /// Thread the next turn continues, if any.
    pub fn thread_id(&self) -> Option<&str> {
        self.thread_id.as_deref()
    }

    /// Turns sent so far.
    pub fn turns(&self) -> usize {
        self.turns
    }

    /// Print the banner.
    pub fn print_welcome(&self) {
        println!(
            "{} {}",
            "Chatting with".bold(),
            self.profile.name.cyan().bold()
        );
        println!("   {}", format!("Tools: {}", self.profile.gateway).dimmed());
        println!("   {}", "Type 'help' for commands, 'exit' to leave.".dimmed());
    }

    /// Handle one input line.
    pub async fn handle(&mut self, input: &str) -> Flow {
        match Command::parse(input) {
            Command::Exit => {
                println!("{}", "Goodbye!".cyan());
                return Flow::Exit;
            }
            Command::Help => print_help(),
            Command::Status => self.print_status(),
            Command::NewThread => {
                self.thread_id = None;
                println!("{}", "Started a new conversation.".yellow());
            }
            Command::Empty => {
                println!("{}", "Please enter a message (or 'help').".yellow());
            }
            Command::Message(message) => {
                let result = self.send(&message).await;
                print_reply(&self.profile.name, &result);
            }
        }
        Flow::Continue
    }

    /// Send one message and remember the thread for the next turn.
    pub async fn send(&mut self, message: &str) -> RunResult {
        let result = self
            .invoker
            .run_turn_with_profile(&self.profile, message, self.thread_id.as_deref())
            .await;
        self.turns += 1;

        // The thread is gone once the agent is torn down
        self.thread_id = if self.profile.delete_after_run {
            None
        } else {
            result.thread_id.clone()
        };
        result
    }

    fn print_status(&self) {
        println!("{} {}", "Agent: ".bold(), self.profile.name);
        println!(
            "{} {}",
            "Thread:".bold(),
            self.thread_id.as_deref().unwrap_or("(none)")
        );
        println!("{} {}", "Turns: ".bold(), self.turns);
    }
}

/// Entries produced by the latest turn: everything after the last user
/// message.
pub fn latest_reply(result: &RunResult) -> &[TranscriptEntry] {
    let start = result
        .response
        .iter()
        .rposition(|e| e.role == TranscriptRole::User)
        .map(|i| i + 1)
        .unwrap_or(0);
    &result.response[start..]
}

fn print_reply(agent_name: &str, result: &RunResult) {
    for entry in latest_reply(result) {
        match entry.role {
            TranscriptRole::Assistant => {
                println!("{} {}", format!("{}:", agent_name).green().bold(), entry.content)
            }
            TranscriptRole::Error => {
                eprintln!("{} {}", "Error:".red().bold(), entry.content.red())
            }
            TranscriptRole::User => {}
        }
    }
}

fn print_help() {
    println!("{}", "Commands:".bold());
    println!("   exit, quit, bye, q   leave the chat");
    println!("   help, ?              show this list");
    println!("   status               show agent and thread");
    println!("   new                  start a new conversation");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::InMemoryBackend;
    use crate::config::{ConfigurationLoader, EnvironmentLoader};
    use std::sync::Arc;

    fn session(backend: Arc<InMemoryBackend>, delete_after_run: bool) -> ChatSession {
        let config = ConfigurationLoader::from_toml(&format!(
            r#"
[agents.echo]
model = "gpt-4o"
delete_after_run = {}

[agents.echo.gateway]
label = "docs"
url = "https://mcp.example.com"

[agents.echo.logging]
enabled = false
"#,
            delete_after_run
        ))
        .unwrap();
        let invoker = Invoker::new(config, EnvironmentLoader::default(), backend);
        ChatSession::new(invoker, "echo").unwrap()
    }

    #[test]
    fn test_command_parsing() {
        assert_eq!(Command::parse("  QUIT "), Command::Exit);
        assert_eq!(Command::parse("?"), Command::Help);
        assert_eq!(Command::parse("status"), Command::Status);
        assert_eq!(Command::parse("new"), Command::NewThread);
        assert_eq!(Command::parse("   "), Command::Empty);
        assert_eq!(
            Command::parse(" what is new? "),
            Command::Message("what is new?".to_string())
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_thread_is_kept_across_turns() {
        let backend = Arc::new(InMemoryBackend::new());
        let mut session = session(backend.clone(), false);

        let first = session.send("one").await;
        let thread = first.thread_id.clone();
        assert_eq!(session.thread_id(), thread.as_deref());

        let second = session.send("two").await;
        assert_eq!(second.thread_id, thread);
        assert_eq!(backend.call_count("create_thread"), 1);
        assert_eq!(latest_reply(&second), &[TranscriptEntry::new(TranscriptRole::Assistant, "echo: two")]);

        assert_eq!(session.handle("new").await, Flow::Continue);
        assert_eq!(session.thread_id(), None);
        assert_eq!(session.handle("bye").await, Flow::Exit);
    }

    #[tokio::test(start_paused = true)]
    async fn test_deleted_thread_is_not_reused() {
        let backend = Arc::new(InMemoryBackend::new());
        let mut session = session(backend.clone(), true);

        session.send("one").await;
        assert_eq!(session.thread_id(), None);
        assert_eq!(backend.deleted_threads().len(), 1);
        assert_eq!(session.turns(), 1);
    }

    #[test]
    fn test_unknown_agent() {
        let config = ConfigurationLoader::from_toml("").unwrap();
        let invoker = Invoker::new(
            config,
            EnvironmentLoader::default(),
            Arc::new(InMemoryBackend::new()),
        );
        assert!(ChatSession::new(invoker, "missing").is_err());
    }
}
