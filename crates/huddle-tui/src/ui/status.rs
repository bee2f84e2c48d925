//! Status bar
//!
//! Displays channel state, the signed-in user and the transient status
//! message.

use huddle_app::{App, ConnectionState};
use ratatui::{
    Frame,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
};

/// Render the status bar.
pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let connection_status = match app.connection_state() {
        None => Span::styled("No group", Style::default().fg(Color::Gray)),
        Some(ConnectionState::Closed) => Span::styled("Closed", Style::default().fg(Color::Red)),
        Some(ConnectionState::Connecting) => {
            Span::styled("Connecting...", Style::default().fg(Color::Yellow))
        },
        Some(ConnectionState::Open) => Span::styled(
            "Open",
            Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
        ),
    };

    let user = app
        .identity()
        .map_or_else(String::new, |identity| format!(" | User #{}", identity.user_id));

    let chat_info = app.chat().map_or_else(String::new, |chat| {
        let uploads = if chat.pending_uploads > 0 {
            format!(" | Uploading: {}", chat.pending_uploads)
        } else {
            String::new()
        };
        format!(" | Messages: {}{uploads}", chat.messages().len())
    });

    let message = app.status_message().map(|m| format!(" | {m}")).unwrap_or_default();
    let message_style = if message.contains("Error") {
        Style::default().fg(Color::LightRed)
    } else {
        Style::default().fg(Color::White)
    };

    let status_line = Line::from(vec![
        Span::raw(" "),
        connection_status,
        Span::raw(user),
        Span::raw(chat_info),
        Span::styled(message, message_style),
    ]);

    let paragraph =
        Paragraph::new(status_line).style(Style::default().bg(Color::DarkGray).fg(Color::White));

    frame.render_widget(paragraph, area);
}
