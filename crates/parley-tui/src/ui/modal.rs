//! Attachment viewer
//!
//! Centered popup describing the attachment being viewed.

use parley_app::Modal;
use ratatui::{
    Frame,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
};

const WIDTH: u16 = 48;
const HEIGHT: u16 = 9;

/// Render the viewer over `area`.
pub fn render(frame: &mut Frame, modal: &Modal, area: Rect) {
    let popup = centered(area, WIDTH, HEIGHT);
    let preview = modal.preview();
    let label = Style::default().fg(Color::DarkGray);

    let image = match preview.dimensions {
        Some((width, height)) => format!("{width}x{height}"),
        None => "not decodable".to_string(),
    };

    let lines = vec![
        Line::from(vec![Span::styled("File:  ", label), Span::raw(preview.filename.as_str())]),
        Line::from(vec![Span::styled("From:  ", label), Span::raw(preview.username.as_str())]),
        Line::from(vec![Span::styled("Type:  ", label), Span::raw(preview.media_type.as_str())]),
        Line::from(vec![Span::styled("Size:  ", label), Span::raw(human_size(preview.size))]),
        Line::from(vec![Span::styled("Image: ", label), Span::raw(image)]),
        Line::default(),
        Line::from(Span::styled("Esc to close", label.add_modifier(Modifier::ITALIC))),
    ];

    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!(" Attachment #{} ", modal.number()))
        .border_style(Style::default().fg(Color::Magenta));

    frame.render_widget(Clear, popup);
    frame.render_widget(Paragraph::new(lines).block(block), popup);
}

/// Byte count for display.
pub(crate) fn human_size(bytes: usize) -> String {
    const KIB: f64 = 1024.0;

    let bytes_f = bytes as f64;
    if bytes_f < KIB {
        format!("{bytes} B")
    } else if bytes_f < KIB * KIB {
        format!("{:.1} KiB", bytes_f / KIB)
    } else {
        format!("{:.1} MiB", bytes_f / (KIB * KIB))
    }
}

fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}
