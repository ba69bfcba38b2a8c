use std::path::PathBuf;

use axum::{
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// Errors raised while answering a single HTTP request.
#[derive(Error, Debug)]
pub enum ServeError {
    #[error("Path is outside the served directory")]
    Forbidden,

    #[error("Error checking {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{} is neither a file nor a directory", .0.display())]
    UnsupportedTarget(PathBuf),
}

impl ServeError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ServeError::Io {
            path: path.into(),
            source,
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ServeError::Forbidden => StatusCode::FORBIDDEN,
            ServeError::Io { .. } | ServeError::UnsupportedTarget(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ServeError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            ServeError::Forbidden => "Forbidden".to_string(),
            other => format!("Internal Server Error\n{other}"),
        };

        (
            status,
            [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
            body,
        )
            .into_response()
    }
}

/// Errors reading or writing the persisted configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize configuration: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Invalid port: {0:?}")]
    InvalidPort(String),

    #[error("There is no such theme: {0:?}")]
    InvalidTheme(String),
}

/// Errors from serving-session operations (start, restart, port and theme changes).
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("{} does not exist", .0.display())]
    NotFound(PathBuf),

    #[error("{} is not accessible: {source}", .path.display())]
    NotAccessible {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{} is neither a file nor a directory", .0.display())]
    InvalidTarget(PathBuf),

    #[error("Failed to bind port {port}: {source}")]
    BindFailure {
        port: u16,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid port: {0:?}")]
    InvalidPort(String),

    #[error("There is no such theme: {0:?}")]
    InvalidTheme(String),

    #[error(transparent)]
    Config(ConfigError),
}

impl From<ConfigError> for SessionError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::InvalidPort(input) => SessionError::InvalidPort(input),
            ConfigError::InvalidTheme(input) => SessionError::InvalidTheme(input),
            other => SessionError::Config(other),
        }
    }
}
