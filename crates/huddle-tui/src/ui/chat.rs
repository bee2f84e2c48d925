//! Chat area
//!
//! Draws the render plan of the open group: date separators, then each
//! message as a header line (sender, time) and a body line. The viewer's own
//! messages are right-aligned.

use huddle_app::{Alignment, App, RenderBody, RenderEntry};
use huddle_client::ClientConfig;
use ratatui::{
    Frame,
    layout::{self, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem},
};

const BORDER_SIZE: u16 = 2;

/// Render the chat area.
pub fn render(frame: &mut Frame, app: &App, files: &ClientConfig, area: Rect) {
    let title = app.chat().map_or_else(
        || " No Group ".to_string(),
        |chat| {
            let name = app.groups().iter().find(|g| g.id == chat.group_id).map(|g| g.name.as_str());
            match name {
                Some(name) => format!(" {name} "),
                None => format!(" Group {} ", chat.group_id),
            }
        },
    );

    let block = Block::default().borders(Borders::ALL).title(title);

    let plan = app.render_plan();
    let items: Vec<ListItem> = if app.chat().is_none() {
        vec![ListItem::new(Line::from(Span::styled(
            "Open a group with /group <id>",
            Style::default().fg(Color::DarkGray),
        )))]
    } else {
        plan.entries.iter().flat_map(|entry| entry_lines(entry, files)).collect()
    };

    let visible_height = area.height.saturating_sub(BORDER_SIZE) as usize;
    let skip = items.len().saturating_sub(visible_height);
    let visible_items: Vec<_> = items.into_iter().skip(skip).collect();

    let list = List::new(visible_items).block(block);

    frame.render_widget(list, area);
}

fn entry_lines<'a>(entry: &'a RenderEntry, files: &ClientConfig) -> Vec<ListItem<'a>> {
    let mut lines = Vec::with_capacity(3);

    if let Some(header) = &entry.separator {
        lines.push(ListItem::new(
            Line::from(Span::styled(
                format!("── {} ──", header.label),
                Style::default().fg(Color::DarkGray),
            ))
            .alignment(layout::Alignment::Center),
        ));
    }

    let (align, name_color) = match entry.alignment {
        Alignment::Left => (layout::Alignment::Left, Color::Green),
        Alignment::Right => (layout::Alignment::Right, Color::Cyan),
    };

    lines.push(ListItem::new(
        Line::from(vec![
            Span::styled(
                entry.sender.as_str(),
                Style::default().fg(name_color).add_modifier(Modifier::BOLD),
            ),
            Span::raw(" "),
            Span::styled(entry.time_label.as_str(), Style::default().fg(Color::DarkGray)),
        ])
        .alignment(align),
    ));

    let body = match &entry.body {
        RenderBody::Text(text) => Line::from(text.as_str()),
        RenderBody::Image { url, name } => Line::from(vec![
            Span::styled("[image] ", Style::default().fg(Color::Magenta)),
            Span::raw(name.as_str()),
            Span::styled(format!(" {}", link(url, files)), Style::default().fg(Color::Blue)),
        ]),
        RenderBody::Attachment { url, name } => Line::from(vec![
            Span::styled("[file] ", Style::default().fg(Color::Yellow)),
            Span::raw(name.as_str()),
            Span::styled(format!(" {}", link(url, files)), Style::default().fg(Color::Blue)),
        ]),
    };
    lines.push(ListItem::new(body.alignment(align)));

    lines
}

fn link(url: &str, files: &ClientConfig) -> String {
    files.resolve_file_url(url).map_or_else(|_| url.to_owned(), String::from)
}
