//! UI rendering
//!
//! Rendering functions that convert App state into terminal output using
//! ratatui widgets. All functions are pure (no I/O), taking state and
//! returning widget trees.

mod chat;
mod groups;
mod input;
mod status;

use huddle_client::ClientConfig;
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
};

use crate::{App, InputState};

/// Render the entire UI.
///
/// `files` resolves stored file paths to absolute links.
pub fn render(frame: &mut Frame, app: &App, input: &InputState, files: &ClientConfig) {
    const MAIN_AREA_MIN_HEIGHT: u16 = 3;
    const INPUT_HEIGHT: u16 = 3;
    const STATUS_HEIGHT: u16 = 1;

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(MAIN_AREA_MIN_HEIGHT),
            Constraint::Length(INPUT_HEIGHT),
            Constraint::Length(STATUS_HEIGHT),
        ])
        .split(frame.area());

    let [main_area, input_area, status_area] = chunks.as_ref() else {
        return;
    };

    render_main_area(frame, app, files, *main_area);
    input::render(frame, input, *input_area);
    status::render(frame, app, *status_area);
}

/// Render the main area (groups sidebar + chat).
fn render_main_area(frame: &mut Frame, app: &App, files: &ClientConfig, area: Rect) {
    const GROUP_SIDEBAR_WIDTH: u16 = 20;
    const CHAT_AREA_MIN_WIDTH: u16 = 20;

    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(GROUP_SIDEBAR_WIDTH), Constraint::Min(CHAT_AREA_MIN_WIDTH)])
        .split(area);

    let [groups_area, chat_area] = chunks.as_ref() else {
        return;
    };

    groups::render(frame, app, *groups_area);
    chat::render(frame, app, files, *chat_area);
}
