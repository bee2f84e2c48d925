//! Errors returned by the App API.

use thiserror::Error;

use crate::ConnectionState;

/// Why an outgoing message was not queued for the channel.
///
/// Sends are never silently dropped: the caller gets one of these and no
/// frame is produced.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SendError {
    /// No chat group is open.
    #[error("no group is open")]
    NoActiveGroup,

    /// Text body is empty or whitespace.
    #[error("message is empty")]
    EmptyMessage,

    /// Channel is not in the open state.
    #[error("channel is {state}, not open")]
    NotOpen {
        /// State at the time of the attempt.
        state: ConnectionState,
    },
}
