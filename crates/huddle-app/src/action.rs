//! Application side-effects and intents.
//!
//! This module defines the [`AppAction`] enum, which represents instructions
//! produced by the [`crate::App`] state machine for the runtime to execute.

use std::path::PathBuf;

use huddle_proto::{Content, GroupId};

/// Actions produced by the App state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppAction {
    /// Render the UI.
    Render,

    /// Quit the application.
    Quit,

    /// Resolve the session identity (`GET /auth/me`).
    ResolveIdentity,

    /// Fetch the group list (`GET /groups/`).
    LoadGroups,

    /// Fetch prior messages of a group (`GET /chat/{group_id}`).
    LoadHistory {
        /// View generation to tag the completion with.
        generation: u64,
        /// Group to fetch.
        group_id: GroupId,
    },

    /// Open the live channel of a group.
    OpenChannel {
        /// View generation to tag channel events with.
        generation: u64,
        /// Group to connect to.
        group_id: GroupId,
    },

    /// Tear down the current live channel.
    CloseChannel,

    /// Write one frame to the live channel.
    SendFrame {
        /// View generation the frame belongs to.
        generation: u64,
        /// Frame body.
        content: Content,
    },

    /// Upload a local file to the storage backend.
    Upload {
        /// View generation to tag the completion with.
        generation: u64,
        /// Local file to transfer.
        path: PathBuf,
    },

    /// Remove the stored credential.
    ClearCredential,
}
