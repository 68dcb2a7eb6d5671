use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum OpenerError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("{what} unavailable: {source}")]
    CollaboratorUnavailable {
        what: &'static str,
        #[source]
        source: Box<OpenerError>,
    },

    #[error("failed to {op} launcher '{label}' after {applied} change(s) were applied: {source}")]
    DeltaApplication {
        op: &'static str,
        label: String,
        applied: usize,
        #[source]
        source: Box<OpenerError>,
    },

    #[error("not found: {0}")]
    NotFound(String),

    #[error("could not parse {what}: {message}")]
    Parse { what: &'static str, message: String },

    #[error("database error at {path}: {source}")]
    Database {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    #[error("cannot access launcher directory {path}: {source}")]
    LauncherAccess {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot create launcher {path}: {source}")]
    LauncherCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot remove launcher {path}: {source}")]
    LauncherRemove {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl OpenerError {
    pub fn unavailable(what: &'static str, source: OpenerError) -> Self {
        OpenerError::CollaboratorUnavailable {
            what,
            source: Box::new(source),
        }
    }
}

pub type Result<T> = std::result::Result<T, OpenerError>;
