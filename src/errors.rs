// src/errors.rs

//! Crate-wide error type and result alias.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DaemonError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Another daemon already owns the socket address.
    #[error("Socket address already in use: {}", .0.display())]
    AddressInUse(PathBuf),

    /// An outgoing message would not fit in one frame.
    #[error("Frame too large: {size} bytes exceeds the {limit} byte limit")]
    FrameTooLarge { size: usize, limit: u32 },

    #[error("File too large: {} is {size} bytes, limit is {limit}", path.display())]
    FileTooLarge { path: PathBuf, size: u64, limit: u64 },

    #[error("{0}")]
    InvalidParams(String),

    #[error("Session already running: {0}")]
    SessionExists(String),

    #[error("Invalid signal: {0}")]
    InvalidSignal(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl DaemonError {
    /// Process exit code the binary uses when this error is fatal.
    pub fn exit_code(&self) -> i32 {
        match self {
            DaemonError::AddressInUse(_) => EXIT_ADDRESS_IN_USE,
            _ => 1,
        }
    }
}

/// Exit code reserved for "another instance is already listening".
pub const EXIT_ADDRESS_IN_USE: i32 = 3;

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, DaemonError>;
