//! Error types for the resolution engine.

/// Errors owned by the engine itself (configuration, stores, plumbing).
///
/// Opaque collaborator failures (model calls, action handlers) travel as
/// `anyhow::Error` and are flattened into speech at the dispatcher boundary.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Configuration file or intent catalog is invalid.
    #[error("config error: {0}")]
    Config(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Persistence collaborator failure.
    #[error("store error: {0}")]
    Store(String),

    /// Language model / classifier collaborator failure.
    #[error("model error: {0}")]
    Model(String),

    /// Shell execution failure.
    #[error("shell error: {0}")]
    Shell(String),

    /// Event queue or speech channel closed.
    #[error("channel error: {0}")]
    Channel(String),

    /// An intent names an action that nothing registered.
    #[error("intent '{intent}' references unknown action '{action}'")]
    UnknownAction { intent: String, action: String },

    /// An intent violates the catalog invariants.
    #[error("invalid intent '{0}': {1}")]
    InvalidIntent(String, String),
}

/// Convenience result type.
pub type Result<T> = std::result::Result<T, EngineError>;
