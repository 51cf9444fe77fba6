//! Error handling for the hostpulse crate.

use crate::channel::ChannelError;

/// A specialized `Result` type for hostpulse operations.
pub type Result<T> = std::result::Result<T, PulseError>;

/// The main error type for hostpulse operations.
#[derive(Debug, thiserror::Error)]
pub enum PulseError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// OS counter or gauge could not be read
    #[error("Sampling error: {0}")]
    Sampling(String),

    /// System information parsing failed
    #[error("Failed to parse system information: {0}")]
    ParseError(String),

    /// Publishing to or reading from the channel failed
    #[error("Channel error: {0}")]
    Channel(#[from] ChannelError),

    /// Web server error
    #[error("Web server error: {0}")]
    WebServer(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl PulseError {
    /// Create a new sampling error
    pub fn sampling_error(msg: impl Into<String>) -> Self {
        Self::Sampling(msg.into())
    }

    /// Create a new parse error
    pub fn parse_error(msg: impl Into<String>) -> Self {
        Self::ParseError(msg.into())
    }

    /// Create a new web server error
    pub fn web_server_error(msg: impl Into<String>) -> Self {
        Self::WebServer(msg.into())
    }

    /// Create a new configuration error
    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}
