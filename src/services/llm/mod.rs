pub mod client;
pub mod session;

pub use client::{ChatModel, LlmService};
pub use session::{ChatSession, Turn, HISTORY_TURNS};
