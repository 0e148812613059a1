//! Unified error type.

use std::path::PathBuf;

use thiserror::Error;

/// The error type returned by shoal's fallible operations.
///
/// Discovery and router-building errors are returned from [`Pond::new`] and
/// [`Router::pond`] and are fatal to startup. Everything that goes wrong while
/// answering a request is logged and turned into a status code at the handler
/// boundary; the client never sees the message.
///
/// [`Pond::new`]: crate::Pond::new
/// [`Router::pond`]: crate::Router::pond
#[derive(Debug, Error)]
pub enum Error {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error("cannot find template directory: {0}")]
    NoTemplateDirectory(PathBuf),

    #[error("reading {path}: {source}")]
    NewItem {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Not fatal: the scanner skips the file.
    #[error("unrecognised content type: {0}")]
    InvalidExtension(PathBuf),

    #[error("template {path} is not valid utf-8")]
    NotUtf8 { path: PathBuf },

    #[error("template `{name}`: {source}")]
    Template {
        name: String,
        #[source]
        source: minijinja::Error,
    },

    #[error("data provider panicked while rendering `{0}`")]
    DataPanic(String),

    #[error("fragment name conflicts with page name `{0}`")]
    DuplicateTemplate(String),

    #[error("invalid route `{pattern}`: {source}")]
    Route {
        pattern: String,
        #[source]
        source: matchit::InsertError,
    },
}
