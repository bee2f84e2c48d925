//! Observable chat view state.
//!
//! [`ChatState`] is the "View Model" of one open group: the ordered message
//! sequence, the live channel state and the progress of the history fetch.
//! It is created when a group is opened and dropped when the group changes.

use std::{collections::HashSet, fmt};

use huddle_proto::{GroupId, Message};

/// Live channel state.
///
/// Gates outgoing sends: only [`ConnectionState::Open`] accepts frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Connection attempt in progress.
    Connecting,
    /// Channel is open; sends are permitted.
    Open,
    /// Channel closed by the server or the network. No automatic reconnect.
    Closed,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Connecting => "connecting",
            Self::Open => "open",
            Self::Closed => "closed",
        })
    }
}

/// Progress of the one-shot history fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryState {
    /// Fetch in flight. Live messages are buffered until it settles.
    Pending,
    /// History applied.
    Loaded,
    /// Fetch failed; the view continues with live messages only.
    Failed,
}

/// State of the open group.
///
/// # Invariants
///
/// - Messages are never reordered or mutated after they enter the sequence.
/// - While history is [`HistoryState::Pending`], live messages wait in a
///   buffer. Once history settles the sequence is `history ++ buffered`,
///   minus buffered messages already present in history.
/// - After history settles, every live message is appended exactly once.
#[derive(Debug, Clone)]
pub struct ChatState {
    /// Group shown by this view.
    pub group_id: GroupId,
    /// View generation this state belongs to.
    pub generation: u64,
    /// Live channel state.
    pub connection: ConnectionState,
    /// History fetch progress.
    pub history: HistoryState,
    /// Uploads started and not yet announced or failed.
    pub pending_uploads: usize,
    messages: Vec<Message>,
    buffered_live: Vec<Message>,
}

impl ChatState {
    /// Fresh state for a group whose history and channel are both pending.
    pub fn new(group_id: GroupId, generation: u64) -> Self {
        Self {
            group_id,
            generation,
            connection: ConnectionState::Connecting,
            history: HistoryState::Pending,
            pending_uploads: 0,
            messages: Vec::new(),
            buffered_live: Vec::new(),
        }
    }

    /// Visible ordered sequence.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Live messages waiting for history to settle.
    pub fn buffered_live(&self) -> &[Message] {
        &self.buffered_live
    }

    /// Apply the history fetch result and flush buffered live messages.
    pub fn apply_history(&mut self, history: Vec<Message>) {
        self.messages = history;
        self.history = HistoryState::Loaded;

        let buffered = std::mem::take(&mut self.buffered_live);
        let fresh: Vec<Message> = {
            let known: HashSet<&Message> = self.messages.iter().collect();
            buffered.into_iter().filter(|m| !known.contains(m)).collect()
        };
        self.messages.extend(fresh);
    }

    /// Record a failed history fetch; buffered live messages become visible.
    pub fn fail_history(&mut self) {
        self.history = HistoryState::Failed;
        self.messages.append(&mut self.buffered_live);
    }

    /// Append one live message in transport order.
    pub fn push_live(&mut self, message: Message) {
        match self.history {
            HistoryState::Pending => self.buffered_live.push(message),
            HistoryState::Loaded | HistoryState::Failed => self.messages.push(message),
        }
    }
}
