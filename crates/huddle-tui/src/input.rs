//! Input state and key handling for the TUI.
//!
//! This module owns all text input state (buffer, cursor) and handles
//! character-level key events. Command parsing happens here on Enter.

use huddle_app::{App, AppAction, KeyInput};

use crate::commands::{self, Command, HELP};

/// Input state for the TUI.
///
/// Manages the text input buffer and cursor position. The cursor counts
/// characters, not bytes, so multi-byte input edits correctly.
#[derive(Debug, Default)]
pub struct InputState {
    /// Text buffer for user input.
    buffer: String,
    /// Cursor position within the buffer, in characters.
    cursor: usize,
}

impl InputState {
    /// Create a new empty input state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current text in the input buffer.
    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    /// Current cursor position, in characters.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Handle a key input event.
    ///
    /// Returns actions to process (may be empty for input-only keys,
    /// or contain app actions for commands).
    pub fn handle_key(&mut self, key: KeyInput, app: &mut App) -> Vec<AppAction> {
        let len = self.buffer.chars().count();
        match key {
            KeyInput::Char(c) => {
                let at = self.byte_index(self.cursor);
                self.buffer.insert(at, c);
                self.cursor += 1;
            },
            KeyInput::Backspace => {
                if self.cursor > 0 {
                    self.cursor -= 1;
                    let at = self.byte_index(self.cursor);
                    self.buffer.remove(at);
                }
            },
            KeyInput::Delete => {
                if self.cursor < len {
                    let at = self.byte_index(self.cursor);
                    self.buffer.remove(at);
                }
            },
            KeyInput::Left => self.cursor = self.cursor.saturating_sub(1),
            KeyInput::Right => self.cursor = (self.cursor + 1).min(len),
            KeyInput::Home => self.cursor = 0,
            KeyInput::End => self.cursor = len,
            KeyInput::Enter => return self.handle_enter(app),
            KeyInput::Tab => return Self::handle_tab(app),
            KeyInput::Esc => return app.quit(),
        }
        vec![AppAction::Render]
    }

    fn byte_index(&self, cursor: usize) -> usize {
        self.buffer.char_indices().nth(cursor).map_or(self.buffer.len(), |(i, _)| i)
    }

    /// Handle Enter key - parse command and call App API.
    fn handle_enter(&mut self, app: &mut App) -> Vec<AppAction> {
        let text = std::mem::take(&mut self.buffer);
        self.cursor = 0;

        if text.trim().is_empty() {
            return vec![AppAction::Render];
        }

        match commands::parse(&text) {
            Command::OpenGroup { group_id } => app.open_group(group_id),
            Command::RefreshGroups => app.refresh_groups(),
            Command::Reconnect => app.reconnect(),
            Command::Quit => app.quit(),
            Command::Help => status(app, HELP),
            Command::Upload { path } => match app.attach_file(path) {
                Ok(actions) => actions,
                Err(e) => status(app, format!("Error: cannot upload: {e}")),
            },
            Command::Message { content } => match app.send_text(&content) {
                Ok(actions) => actions,
                Err(e) => {
                    // Keep the draft so nothing typed is lost
                    self.cursor = text.chars().count();
                    self.buffer = text;
                    status(app, format!("Error: cannot send: {e}"))
                },
            },
            Command::Unknown { input } => status(app, format!("Unknown command: {input}")),
            Command::InvalidArgs { command, error } => status(app, format!("/{command}: {error}")),
        }
    }

    /// Handle Tab key - open the next group in list order, wrapping around.
    fn handle_tab(app: &mut App) -> Vec<AppAction> {
        let groups = app.groups();
        if groups.is_empty() {
            return vec![];
        }

        let current = app.chat().map(|chat| chat.group_id);
        let next = current
            .and_then(|id| groups.iter().position(|g| g.id == id))
            .map_or(0, |idx| (idx + 1) % groups.len());

        match groups.get(next).map(|g| g.id) {
            Some(group_id) if Some(group_id) != current => app.open_group(group_id),
            _ => vec![],
        }
    }
}

fn status(app: &mut App, message: impl Into<String>) -> Vec<AppAction> {
    app.set_status(message);
    vec![AppAction::Render]
}
