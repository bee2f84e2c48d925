//! Application input events.
//!
//! This module defines [`AppEvent`], the set of inputs that drive the
//! [`crate::App`] state machine.
//!
//! Events originate from two distinct sources:
//! - System ticks and terminal resizes.
//! - Completions of network work started by an [`crate::AppAction`]. Each
//!   completion carries the view generation it was started for, so results
//!   that arrive after the user switched groups can be discarded.

use huddle_proto::{Group, Message, SessionIdentity, StoredFile};

/// Events processed by the App state machine.
#[derive(Debug, Clone)]
pub enum AppEvent {
    /// Periodic tick.
    Tick,

    /// Terminal resize (columns, rows).
    Resize(u16, u16),

    /// `/auth/me` resolved the stored credential.
    IdentityResolved(SessionIdentity),

    /// `/auth/me` rejected the stored credential.
    SessionRejected,

    /// Group list fetched.
    GroupsLoaded(Vec<Group>),

    /// Group list fetch failed.
    GroupsFailed {
        /// Error description.
        reason: String,
    },

    /// History fetch succeeded.
    HistoryLoaded {
        /// Generation the fetch was started for.
        generation: u64,
        /// Messages, oldest first.
        messages: Vec<Message>,
    },

    /// History fetch failed.
    HistoryFailed {
        /// Generation the fetch was started for.
        generation: u64,
        /// Error description.
        reason: String,
    },

    /// Live channel opened.
    ChannelOpened {
        /// Generation the channel was opened for.
        generation: u64,
    },

    /// Live channel closed by the server or the network.
    ChannelClosed {
        /// Generation the channel was opened for.
        generation: u64,
    },

    /// One inbound frame parsed as a message.
    FrameReceived {
        /// Generation of the channel that delivered it.
        generation: u64,
        /// Received message.
        message: Message,
    },

    /// One inbound frame could not be parsed.
    FrameMalformed {
        /// Generation of the channel that delivered it.
        generation: u64,
        /// Parse error description.
        reason: String,
    },

    /// Upload stored the file.
    UploadCompleted {
        /// Generation the upload was started for.
        generation: u64,
        /// Stored resource descriptor.
        file: StoredFile,
    },

    /// Upload failed.
    UploadFailed {
        /// Generation the upload was started for.
        generation: u64,
        /// Error description.
        reason: String,
    },

    /// Writing a frame to the channel failed.
    SendFailed {
        /// Generation of the channel.
        generation: u64,
        /// Error description.
        reason: String,
    },

    /// Error occurred.
    Error {
        /// Error description.
        message: String,
    },
}
