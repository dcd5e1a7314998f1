use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PostsError {
    #[error("failed to read input file '{path}': {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse XML: {0}")]
    Parse(String),

    #[error("could not connect to the document store: {0}")]
    StoreConnection(String),

    #[error("document store operation '{operation}' failed: {message}")]
    StoreOperation {
        operation: &'static str,
        message: String,
    },

    #[error("failed to render report '{path}': {message}")]
    Render { path: PathBuf, message: String },

    #[error("failed to set up logging in '{path}': {message}")]
    Logging { path: PathBuf, message: String },

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl PostsError {
    pub fn store_op(operation: &'static str, err: impl std::fmt::Display) -> Self {
        PostsError::StoreOperation {
            operation,
            message: err.to_string(),
        }
    }
}

impl From<quick_xml::Error> for PostsError {
    fn from(e: quick_xml::Error) -> Self {
        PostsError::Parse(e.to_string())
    }
}

impl From<quick_xml::events::attributes::AttrError> for PostsError {
    fn from(e: quick_xml::events::attributes::AttrError) -> Self {
        PostsError::Parse(format!("malformed attribute: {e}"))
    }
}

pub type Result<T> = std::result::Result<T, PostsError>;
