//! Input line
//!
//! Displays the composer with cursor. While the session refuses sends the
//! line is dimmed and titled with the reason.

use parley_app::App;
use parley_core::Admission;
use ratatui::{
    Frame,
    layout::Rect,
    style::{Color, Style},
    widgets::{Block, Borders, Paragraph},
};

const PROMPT_WIDTH: u16 = 3; // border + "> "
const INPUT_LINE_OFFSET_Y: u16 = 1; // inside top border
const RIGHT_PADDING: u16 = 1; // inside right border

/// Render the input line.
pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let session = app.session();
    let mut block = Block::default().borders(Borders::ALL);
    let style = if session.input_enabled {
        Style::default().fg(Color::White)
    } else {
        block = block.title(match session.admission {
            Admission::Blocked => " Blocked ",
            Admission::Unjoined | Admission::Joined => " Waiting to join ",
        });
        Style::default().fg(Color::DarkGray)
    };

    let composer = app.composer();
    let paragraph = Paragraph::new(format!("> {}", composer.buffer())).style(style).block(block);
    frame.render_widget(paragraph, area);

    if app.modal().is_some() {
        return;
    }

    let available_width = area.width.saturating_sub(PROMPT_WIDTH + RIGHT_PADDING);
    let cursor_offset = (composer.cursor() as u16).min(available_width);

    let cursor_x = area.x.saturating_add(PROMPT_WIDTH).saturating_add(cursor_offset);
    let cursor_y = area.y.saturating_add(INPUT_LINE_OFFSET_Y);
    let max_x = area.x.saturating_add(area.width).saturating_sub(RIGHT_PADDING);

    frame.set_cursor_position((cursor_x.min(max_x), cursor_y));
}

#[cfg(test)]
mod tests {
    use parley_app::{AppEvent, KeyInput, SessionView};
    use ratatui::{Terminal, backend::TestBackend, layout::Position};

    use super::*;

    fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            app.handle(AppEvent::Key(KeyInput::Char(c)));
        }
    }

    #[test]
    fn cursor_follows_the_composer() {
        let mut app = App::new("127.0.0.1:4433", "alice");
        type_text(&mut app, "hello");
        app.handle(AppEvent::Key(KeyInput::Left));

        let mut terminal = Terminal::new(TestBackend::new(20, 3)).unwrap();
        terminal.draw(|frame| render(frame, &app, frame.area())).unwrap();

        assert_eq!(terminal.get_cursor_position().unwrap(), Position::new(7, 1));
    }

    #[test]
    fn blocked_session_is_labelled() {
        let mut app = App::new("127.0.0.1:4433", "alice");
        app.handle(AppEvent::Session(SessionView {
            admission: Admission::Blocked,
            input_enabled: false,
            block_reason: Some("Access denied".into()),
        }));

        let mut terminal = Terminal::new(TestBackend::new(20, 3)).unwrap();
        terminal.draw(|frame| render(frame, &app, frame.area())).unwrap();

        let top: String =
            (0..20).map(|x| terminal.backend().buffer()[(x, 0)].symbol().to_string()).collect();
        assert_eq!(top, "┌ Blocked ─────────┐");
    }
}
