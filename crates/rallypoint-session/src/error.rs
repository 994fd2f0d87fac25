//! Error types for the session layer.

use std::path::PathBuf;

use rallypoint_protocol::ParticipantId;

/// Errors raised by the roster and the settings store.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The participant isn't in the roster. Usually an event for someone
    /// who already left.
    #[error("participant {0} is not in the roster")]
    NotFound(ParticipantId),

    /// The settings file couldn't be read or written.
    #[error("settings file {path}: {source}")]
    SettingsIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The settings file exists but isn't valid settings JSON.
    #[error("malformed settings: {0}")]
    SettingsFormat(#[from] serde_json::Error),
}
