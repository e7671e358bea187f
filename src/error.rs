//! Rich diagnostic error types for the orthograph engine.
//!
//! Each subsystem defines its own error type with miette `#[diagnostic]` derives,
//! providing error codes and help text so callers know what went wrong and
//! how to fix it. Duplicate content is never an error: interning folds it
//! into the existing entity.

use miette::Diagnostic;
use thiserror::Error;

/// Top-level error type for the orthograph engine.
#[derive(Debug, Error, Diagnostic)]
pub enum OrthoError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Query(#[from] QueryError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Queue(#[from] QueueError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Engine(#[from] EngineError),
}

// ---------------------------------------------------------------------------
// Query errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum QueryError {
    #[error("empty dims query")]
    #[diagnostic(
        code(ortho::query::empty_dims),
        help("Pass a comma-separated list of non-negative integers, e.g. `dims=2,1`.")
    )]
    EmptyDims,

    #[error("invalid dims component \"{component}\" in \"{input}\"")]
    #[diagnostic(
        code(ortho::query::invalid_dims),
        help(
            "Every component of a dims query must be a non-negative integer. \
             Remove stray separators or whitespace-only entries."
        )
    )]
    InvalidDims { input: String, component: String },
}

// ---------------------------------------------------------------------------
// Queue errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum QueueError {
    #[error("task queue is full: {pending} pending tasks (limit {limit})")]
    #[diagnostic(
        code(ortho::queue::full),
        help(
            "The engine is still working through earlier documents. \
             Wait for the pending count to drop, or raise `max_pending` in the settings file."
        )
    )]
    Full { pending: usize, limit: usize },

    #[error("task queue has been shut down")]
    #[diagnostic(
        code(ortho::queue::shut_down),
        help("The engine is being dropped; no further documents are accepted.")
    )]
    ShutDown,
}

// ---------------------------------------------------------------------------
// Config errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error("failed to read settings file: {path}")]
    #[diagnostic(
        code(ortho::config::read),
        help("Check that the settings file exists and is readable.")
    )]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write settings file: {path}")]
    #[diagnostic(
        code(ortho::config::write),
        help("Check that the parent directory is writable and the disk is not full.")
    )]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse settings file {path}: {message}")]
    #[diagnostic(
        code(ortho::config::parse),
        help("The settings file must be valid TOML with `[engine]` and `[server]` tables.")
    )]
    Parse { path: String, message: String },

    #[error("invalid setting `{key}`: {message}")]
    #[diagnostic(
        code(ortho::config::invalid),
        help("Fix the value in the settings file or the corresponding ORTHO_* environment variable.")
    )]
    Invalid { key: String, message: String },
}

// ---------------------------------------------------------------------------
// Engine errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum EngineError {
    #[error("failed to spawn worker thread {index}")]
    #[diagnostic(
        code(ortho::engine::spawn),
        help("The operating system refused to create a thread. Lower `workers` in the settings.")
    )]
    WorkerSpawn {
        index: usize,
        #[source]
        source: std::io::Error,
    },
}

/// Convenience result type for the orthograph engine.
pub type OrthoResult<T> = std::result::Result<T, OrthoError>;
