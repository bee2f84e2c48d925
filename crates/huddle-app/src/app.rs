//! Application state machine.
//!
//! This module defines the [`App`] state machine, which manages the chat view
//! completely decoupled from I/O.
//!
//! This is a pure state machine: it consumes [`crate::AppEvent`] inputs and
//! produces [`crate::AppAction`] instructions for the runtime to execute.
//!
//! # Responsibilities
//!
//! - Tracks the open group, its message sequence and live channel state.
//! - Tags every network request with the current view generation and discards
//!   completions for older generations.
//! - Gates outgoing sends on the channel being open.
//! - Holds the session identity, the group list and a transient status line.

use std::path::PathBuf;

use chrono::{FixedOffset, NaiveDate, Offset, Utc};
use huddle_proto::{Content, Group, GroupId, Message, SessionIdentity, StoredFile};

use crate::{
    AppAction, AppEvent, ChatState, ConnectionState, SendError,
    render::{self, RenderContext, RenderPlan},
};

/// Display settings for the chat view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AppConfig {
    /// Fixed offset used for calendar days and clock times.
    pub display_offset: FixedOffset,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self { display_offset: Utc.fix() }
    }
}

/// Application state machine.
///
/// Pure state machine that processes events and produces actions.
/// No I/O dependencies - fully testable in simulation.
#[derive(Debug, Clone)]
pub struct App {
    config: AppConfig,
    /// Resolved session identity. `None` until `/auth/me` answers.
    identity: Option<SessionIdentity>,
    /// Groups visible to the user.
    groups: Vec<Group>,
    /// Open group view. `None` before the first group is opened.
    chat: Option<ChatState>,
    /// Bumped on every group (re)open.
    generation: u64,
    /// Terminal dimensions (columns, rows).
    terminal_size: (u16, u16),
    /// Transient status message. `None` if no message.
    status_message: Option<String>,
}

impl App {
    /// Create a new App with the given display settings.
    pub fn new(config: AppConfig) -> Self {
        Self {
            config,
            identity: None,
            groups: Vec::new(),
            chat: None,
            generation: 0,
            terminal_size: (80, 24),
            status_message: None,
        }
    }

    /// Process an event and return actions.
    pub fn handle(&mut self, event: AppEvent) -> Vec<AppAction> {
        match event {
            AppEvent::Tick => vec![],
            AppEvent::Resize(cols, rows) => {
                self.terminal_size = (cols, rows);
                vec![AppAction::Render]
            },
            AppEvent::IdentityResolved(identity) => {
                self.identity = Some(identity);
                vec![AppAction::Render]
            },
            AppEvent::SessionRejected => {
                tracing::warn!("session rejected, clearing stored credential");
                self.identity = None;
                self.status_message = Some("Session expired, please log in again".into());
                vec![AppAction::ClearCredential, AppAction::Render, AppAction::Quit]
            },
            AppEvent::GroupsLoaded(groups) => {
                self.groups = groups;
                vec![AppAction::Render]
            },
            AppEvent::GroupsFailed { reason } => {
                tracing::warn!(%reason, "group list unavailable");
                self.groups.clear();
                vec![AppAction::Render]
            },
            AppEvent::HistoryLoaded { generation, messages } => {
                let Some(chat) = self.current_chat(generation) else {
                    return vec![];
                };
                tracing::debug!(count = messages.len(), "history loaded");
                chat.apply_history(messages);
                vec![AppAction::Render]
            },
            AppEvent::HistoryFailed { generation, reason } => {
                let Some(chat) = self.current_chat(generation) else {
                    return vec![];
                };
                tracing::warn!(%reason, "history unavailable, continuing with live messages");
                chat.fail_history();
                self.status_message = Some("History unavailable".into());
                vec![AppAction::Render]
            },
            AppEvent::ChannelOpened { generation } => {
                let Some(chat) = self.current_chat(generation) else {
                    return vec![];
                };
                chat.connection = ConnectionState::Open;
                self.status_message = None;
                vec![AppAction::Render]
            },
            AppEvent::ChannelClosed { generation } => {
                let Some(chat) = self.current_chat(generation) else {
                    return vec![];
                };
                chat.connection = ConnectionState::Closed;
                self.status_message = Some("Disconnected. Use /reconnect to rejoin".into());
                vec![AppAction::Render]
            },
            AppEvent::FrameReceived { generation, message } => {
                let Some(chat) = self.current_chat(generation) else {
                    return vec![];
                };
                chat.push_live(message);
                vec![AppAction::Render]
            },
            AppEvent::FrameMalformed { generation, reason } => {
                if self.current_chat(generation).is_none() {
                    return vec![];
                }
                self.status_message = Some(format!("Error: unreadable message: {reason}"));
                vec![AppAction::Render]
            },
            AppEvent::UploadCompleted { generation, file } => self.announce_upload(generation, file),
            AppEvent::UploadFailed { generation, reason } => {
                let Some(chat) = self.current_chat(generation) else {
                    return vec![];
                };
                chat.pending_uploads = chat.pending_uploads.saturating_sub(1);
                self.status_message = Some(format!("Error: upload failed: {reason}"));
                vec![AppAction::Render]
            },
            AppEvent::SendFailed { generation, reason } => {
                if self.current_chat(generation).is_none() {
                    return vec![];
                }
                self.status_message = Some(format!("Error: message not sent: {reason}"));
                vec![AppAction::Render]
            },
            AppEvent::Error { message } => {
                self.status_message = Some(format!("Error: {message}"));
                vec![AppAction::Render]
            },
        }
    }

    /// Open a group view.
    ///
    /// Starts a new generation: the previous group's state is dropped and
    /// history plus the channel are requested concurrently. Switching to a
    /// different group closes the previous channel first; re-opening the
    /// current group keeps a channel that is still open and reconnects one
    /// that has closed.
    pub fn open_group(&mut self, group_id: GroupId) -> Vec<AppAction> {
        let mut actions = Vec::new();
        if self.chat.as_ref().is_some_and(|chat| chat.group_id != group_id) {
            actions.push(AppAction::CloseChannel);
        }

        self.generation += 1;
        let generation = self.generation;
        self.chat = Some(ChatState::new(group_id, generation));
        self.status_message = Some(format!("Connecting to group {group_id}..."));
        tracing::info!(group_id, generation, "opening group");

        if self.identity.is_none() {
            actions.push(AppAction::ResolveIdentity);
        }
        actions.push(AppAction::LoadHistory { generation, group_id });
        actions.push(AppAction::OpenChannel { generation, group_id });
        actions.push(AppAction::Render);
        actions
    }

    /// Re-open the current group after the channel closed.
    pub fn reconnect(&mut self) -> Vec<AppAction> {
        match self.chat.as_ref().map(|chat| chat.group_id) {
            Some(group_id) => self.open_group(group_id),
            None => {
                self.status_message = Some("No group to reconnect to".into());
                vec![AppAction::Render]
            },
        }
    }

    /// Queue a text message for the live channel.
    pub fn send_text(&mut self, text: &str) -> Result<Vec<AppAction>, SendError> {
        let generation = self.open_channel_generation()?;
        if text.trim().is_empty() {
            return Err(SendError::EmptyMessage);
        }

        let content = Content::text(text);
        Ok(vec![AppAction::SendFrame { generation, content }, AppAction::Render])
    }

    /// Upload a local file and announce it once stored.
    pub fn attach_file(&mut self, path: PathBuf) -> Result<Vec<AppAction>, SendError> {
        let generation = self.open_channel_generation()?;

        if let Some(chat) = self.chat.as_mut() {
            chat.pending_uploads += 1;
        }
        self.status_message = Some(format!("Uploading {}...", path.display()));
        Ok(vec![AppAction::Upload { generation, path }, AppAction::Render])
    }

    /// Re-fetch the group list.
    pub fn refresh_groups(&self) -> Vec<AppAction> {
        vec![AppAction::LoadGroups, AppAction::Render]
    }

    /// Quit the application.
    pub fn quit(&self) -> Vec<AppAction> {
        vec![AppAction::CloseChannel, AppAction::Quit]
    }

    /// Set a status message to display to the user.
    pub fn set_status(&mut self, message: impl Into<String>) {
        self.status_message = Some(message.into());
    }

    /// Render plan of the open group relative to `today`.
    pub fn render_plan_for(&self, today: NaiveDate) -> RenderPlan {
        let ctx = RenderContext {
            viewer: self.identity.map(|identity| identity.user_id),
            offset: self.config.display_offset,
            today,
        };
        self.chat
            .as_ref()
            .map(|chat| render::render_plan(chat.messages(), &ctx))
            .unwrap_or_default()
    }

    /// Render plan of the open group relative to the current day.
    pub fn render_plan(&self) -> RenderPlan {
        let today = Utc::now().with_timezone(&self.config.display_offset).date_naive();
        self.render_plan_for(today)
    }

    /// Display settings.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Resolved session identity.
    pub fn identity(&self) -> Option<&SessionIdentity> {
        self.identity.as_ref()
    }

    /// Groups visible to the user.
    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    /// Open group view. `None` before the first group is opened.
    pub fn chat(&self) -> Option<&ChatState> {
        self.chat.as_ref()
    }

    /// Visible messages of the open group.
    pub fn messages(&self) -> &[Message] {
        self.chat.as_ref().map(ChatState::messages).unwrap_or_default()
    }

    /// Live channel state. `None` before the first group is opened.
    pub fn connection_state(&self) -> Option<ConnectionState> {
        self.chat.as_ref().map(|chat| chat.connection)
    }

    /// Current view generation.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Terminal dimensions (columns, rows).
    pub fn terminal_size(&self) -> (u16, u16) {
        self.terminal_size
    }

    /// Transient status message. `None` if no message.
    pub fn status_message(&self) -> Option<&str> {
        self.status_message.as_deref()
    }

    /// Chat state if `generation` is still current.
    fn current_chat(&mut self, generation: u64) -> Option<&mut ChatState> {
        let chat = self.chat.as_mut().filter(|chat| chat.generation == generation);
        if chat.is_none() {
            tracing::debug!(generation, current = self.generation, "discarding stale completion");
        }
        chat
    }

    fn open_channel_generation(&self) -> Result<u64, SendError> {
        let chat = self.chat.as_ref().ok_or(SendError::NoActiveGroup)?;
        match chat.connection {
            ConnectionState::Open => Ok(chat.generation),
            state @ (ConnectionState::Connecting | ConnectionState::Closed) => {
                Err(SendError::NotOpen { state })
            },
        }
    }

    fn announce_upload(&mut self, generation: u64, file: StoredFile) -> Vec<AppAction> {
        let Some(chat) = self.current_chat(generation) else {
            return vec![];
        };
        chat.pending_uploads = chat.pending_uploads.saturating_sub(1);

        if chat.connection != ConnectionState::Open {
            let state = chat.connection;
            self.status_message = Some(format!(
                "Error: uploaded {} but channel is {state}; not announced",
                file.file_name
            ));
            return vec![AppAction::Render];
        }

        self.status_message = None;
        vec![AppAction::SendFrame { generation, content: Content::File(file) }, AppAction::Render]
    }
}

#[cfg(test)]
mod tests {
    use huddle_proto::{Role, Timestamp};

    use super::*;

    fn open_app(group_id: GroupId) -> App {
        let mut app = App::new(AppConfig::default());
        let _ = app.open_group(group_id);
        let generation = app.generation();
        let _ = app.handle(AppEvent::ChannelOpened { generation });
        app
    }

    fn message(sender_id: u64, text: &str) -> Message {
        Message {
            sender_id,
            sender: None,
            time: Timestamp::parse("2024-01-01T10:00:00Z").unwrap(),
            content: Content::text(text),
        }
    }

    #[test]
    fn open_group_requests_history_and_channel() {
        let mut app = App::new(AppConfig::default());
        let actions = app.open_group(7);

        assert!(matches!(actions.as_slice(), [
            AppAction::ResolveIdentity,
            AppAction::LoadHistory { generation: 1, group_id: 7 },
            AppAction::OpenChannel { generation: 1, group_id: 7 },
            AppAction::Render
        ]));
        assert_eq!(app.connection_state(), Some(ConnectionState::Connecting));
    }

    #[test]
    fn switching_group_closes_previous_channel() {
        let mut app = open_app(1);
        let _ = app.handle(AppEvent::IdentityResolved(SessionIdentity {
            user_id: 1,
            role: Role::User,
        }));
        let actions = app.open_group(2);

        assert!(matches!(actions.as_slice(), [
            AppAction::CloseChannel,
            AppAction::LoadHistory { generation: 2, group_id: 2 },
            AppAction::OpenChannel { generation: 2, group_id: 2 },
            AppAction::Render
        ]));
    }

    #[test]
    fn send_rejected_while_connecting() {
        let mut app = App::new(AppConfig::default());
        let _ = app.open_group(1);

        assert_eq!(
            app.send_text("hi"),
            Err(SendError::NotOpen { state: ConnectionState::Connecting })
        );
    }

    #[test]
    fn send_rejected_after_close() {
        let mut app = open_app(1);
        let generation = app.generation();
        let _ = app.handle(AppEvent::ChannelClosed { generation });

        assert_eq!(app.send_text("hi"), Err(SendError::NotOpen { state: ConnectionState::Closed }));
        assert!(app.attach_file("a.png".into()).is_err());
    }

    #[test]
    fn send_without_group_or_text() {
        let mut app = App::new(AppConfig::default());
        assert_eq!(app.send_text("hi"), Err(SendError::NoActiveGroup));

        let mut app = open_app(1);
        assert_eq!(app.send_text("   "), Err(SendError::EmptyMessage));
    }

    #[test]
    fn send_when_open_produces_frame() {
        let mut app = open_app(1);
        let actions = app.send_text("hello").unwrap();

        assert!(matches!(actions.as_slice(), [
            AppAction::SendFrame { generation: 1, content: Content::Text { .. } },
            AppAction::Render
        ]));
    }

    #[test]
    fn stale_history_is_discarded() {
        let mut app = App::new(AppConfig::default());
        let _ = app.open_group(1);
        let old_generation = app.generation();
        let _ = app.open_group(2);

        let actions = app.handle(AppEvent::HistoryLoaded {
            generation: old_generation,
            messages: vec![message(1, "from group one")],
        });

        assert!(actions.is_empty());
        assert!(app.messages().is_empty());
        assert_eq!(app.chat().map(|c| c.group_id), Some(2));
    }

    #[test]
    fn stale_channel_close_does_not_affect_new_view() {
        let mut app = open_app(1);
        let old_generation = app.generation();
        let _ = app.open_group(2);
        let _ = app.handle(AppEvent::ChannelOpened { generation: app.generation() });

        let _ = app.handle(AppEvent::ChannelClosed { generation: old_generation });
        assert_eq!(app.connection_state(), Some(ConnectionState::Open));
    }

    #[test]
    fn upload_completion_announces_descriptor() {
        let mut app = open_app(1);
        let _ = app.attach_file("a.png".into()).unwrap();
        assert_eq!(app.chat().map(|c| c.pending_uploads), Some(1));

        let file = StoredFile {
            file_url: "/files/a.png".into(),
            file_name: "a.png".into(),
            file_type: "image/png".into(),
        };
        let actions = app.handle(AppEvent::UploadCompleted { generation: 1, file: file.clone() });

        assert_eq!(actions, vec![
            AppAction::SendFrame { generation: 1, content: Content::File(file) },
            AppAction::Render
        ]);
        assert_eq!(app.chat().map(|c| c.pending_uploads), Some(0));
    }

    #[test]
    fn upload_after_close_is_surfaced_not_sent() {
        let mut app = open_app(1);
        let _ = app.attach_file("a.txt".into()).unwrap();
        let _ = app.handle(AppEvent::ChannelClosed { generation: 1 });

        let file = StoredFile {
            file_url: "/files/a.txt".into(),
            file_name: "a.txt".into(),
            file_type: "text/plain".into(),
        };
        let actions = app.handle(AppEvent::UploadCompleted { generation: 1, file });

        assert_eq!(actions, vec![AppAction::Render]);
        assert!(app.status_message().is_some_and(|m| m.contains("not announced")));
    }

    #[test]
    fn upload_failure_is_user_visible() {
        let mut app = open_app(1);
        let _ = app.attach_file("a.txt".into()).unwrap();
        let _ = app.handle(AppEvent::UploadFailed { generation: 1, reason: "413".into() });

        assert!(app.status_message().is_some_and(|m| m.starts_with("Error: upload failed")));
    }

    #[test]
    fn session_rejection_clears_credential() {
        let mut app = open_app(1);
        let actions = app.handle(AppEvent::SessionRejected);

        assert_eq!(actions, vec![AppAction::ClearCredential, AppAction::Render, AppAction::Quit]);
        assert!(app.identity().is_none());
    }

    #[test]
    fn reopening_current_group_keeps_the_channel() {
        let mut app = open_app(3);
        let actions = app.open_group(3);

        assert!(!actions.contains(&AppAction::CloseChannel));
        assert!(actions.contains(&AppAction::OpenChannel { generation: 2, group_id: 3 }));
        assert!(actions.contains(&AppAction::LoadHistory { generation: 2, group_id: 3 }));
        assert!(app.messages().is_empty());
    }

    #[test]
    fn reconnect_reopens_same_group() {
        let mut app = open_app(5);
        let _ = app.handle(AppEvent::ChannelClosed { generation: 1 });
        let actions = app.reconnect();

        assert!(actions.contains(&AppAction::OpenChannel { generation: 2, group_id: 5 }));
        assert!(!actions.contains(&AppAction::CloseChannel));
        assert_eq!(app.connection_state(), Some(ConnectionState::Connecting));
    }
}
