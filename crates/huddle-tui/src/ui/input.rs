//! Input line
//!
//! Displays the input buffer with cursor.

use ratatui::{
    Frame,
    layout::Rect,
    style::{Color, Style},
    widgets::{Block, Borders, Paragraph},
};

use crate::InputState;

const PROMPT_WIDTH: u16 = 3; // "> " plus border
const INPUT_LINE_OFFSET_Y: u16 = 1; // inside top border
const RIGHT_PADDING: u16 = 1; // inside right border

/// Render the input line.
///
/// Long drafts scroll horizontally so the cursor stays visible.
pub fn render(frame: &mut Frame, input: &InputState, area: Rect) {
    let block = Block::default().borders(Borders::ALL).title(" Message ");

    let available_width = usize::from(area.width.saturating_sub(PROMPT_WIDTH + RIGHT_PADDING));
    let scroll = input.cursor().saturating_sub(available_width);
    let visible: String = input.buffer().chars().skip(scroll).collect();

    let paragraph =
        Paragraph::new(format!("> {visible}")).style(Style::default().fg(Color::White)).block(block);

    frame.render_widget(paragraph, area);

    let cursor_offset = u16::try_from(input.cursor() - scroll).unwrap_or(u16::MAX);
    let cursor_x = area.x.saturating_add(PROMPT_WIDTH).saturating_add(cursor_offset);
    let cursor_y = area.y.saturating_add(INPUT_LINE_OFFSET_Y);
    let max_x = area.x.saturating_add(area.width).saturating_sub(RIGHT_PADDING);

    frame.set_cursor_position((cursor_x.min(max_x), cursor_y));
}
