//! CLI feature - terminal chat loop over a configured agent
//!
//! A [`ChatSession`] keeps the thread id between turns so a conversation
//! carries on until the user starts a new one or leaves.
//!
//! # Commands
//!
//! - `exit`, `quit`, `bye`, `q` - leave
//! - `help`, `?` - list commands
//! - `status` - show agent, thread and turn count
//! - `new` - forget the thread
//!
//! # Example
//!
//! ```rust,no_run
//! use foundry_agent::cli::{ChatSession, Flow};
//! use foundry_agent::invoker::Invoker;
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let invoker = Invoker::from_environment(None, None)?;
//! let mut session = ChatSession::new(invoker, "search-agent")?;
//! if session.handle("What changed in the last release?").await == Flow::Exit {
//!     return Ok(());
//! }
//! # Ok(())
//! # }
//! ```

pub mod session;
pub mod utils;

// Re-exports for convenience
pub use session::{latest_reply, ChatSession, Command, Flow};
pub use utils::display_error_with_suggestions;
