pub mod config;
pub mod error;
pub mod kernel;
pub mod memory;
pub mod outputs;
pub mod services;
pub mod skills;

// Re-export specific items if needed for convenient access
pub use config::EngineConfig;
pub use error::{EngineError, Result};
pub use kernel::dispatcher::{Collaborators, Dispatcher};
pub use kernel::reactor::Reactor;
