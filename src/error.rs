use thiserror::Error;

/// Errors produced while compiling a job configuration.
///
/// A `ConfigError` is surfaced to the caller immediately; the worker is
/// never spawned.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("no source selected: choose a drive or folder to scan")]
    MissingSource,

    #[error("no destination selected: choose where recovered files are saved")]
    MissingDestination,

    #[error("source and destination are the same location ({0})")]
    SameEndpoint(String),
}

/// Errors produced by the process supervisor.
///
/// These are transient notices: session state is never corrupted by them
/// and the caller may reconfigure and retry.
#[derive(Error, Debug)]
pub enum SupervisorError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("a recovery operation is already in progress")]
    AlreadyRunning,

    #[error("failed to launch worker `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("no recovery operation is running")]
    NotRunning,

    #[error("destination path does not exist: {0}")]
    MissingDestinationDir(String),

    #[error("host operation failed: {0}")]
    Host(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for supervisor operations
pub type Result<T> = std::result::Result<T, SupervisorError>;
