//! Groups sidebar
//!
//! Lists the groups visible to the user and marks the open one.

use huddle_app::App;
use ratatui::{
    Frame,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem},
};

const ACTIVE_PREFIX: &str = ">";
const INACTIVE_PREFIX: &str = " ";

/// Render the groups sidebar.
pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let active = app.chat().map(|chat| chat.group_id);

    let items: Vec<ListItem> = app
        .groups()
        .iter()
        .map(|group| {
            let (prefix, style) = if active == Some(group.id) {
                (ACTIVE_PREFIX, Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD))
            } else {
                (INACTIVE_PREFIX, Style::default())
            };

            ListItem::new(Line::from(vec![
                Span::raw(prefix),
                Span::styled(format!("{} ", group.id), Style::default().fg(Color::DarkGray)),
                Span::styled(group.name.as_str(), style),
            ]))
        })
        .collect();

    let title = if app.identity().is_some_and(|identity| identity.role.is_admin()) {
        " Groups (admin) "
    } else {
        " Groups "
    };

    let block = Block::default().borders(Borders::ALL).title(title);
    let list = List::new(items).block(block);

    frame.render_widget(list, area);
}
