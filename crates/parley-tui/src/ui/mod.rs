//! UI rendering
//!
//! Rendering functions that convert App state into terminal output using
//! ratatui widgets. All functions are pure (no I/O), taking state and
//! drawing into a frame.

mod chat;
mod input;
mod modal;
mod status;

use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout},
};

use crate::App;

/// Render the entire UI.
pub fn render(frame: &mut Frame, app: &App) {
    const CHAT_AREA_MIN_HEIGHT: u16 = 3;
    const INPUT_HEIGHT: u16 = 3;
    const STATUS_HEIGHT: u16 = 1;

    let area = frame.area();
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(CHAT_AREA_MIN_HEIGHT),
            Constraint::Length(INPUT_HEIGHT),
            Constraint::Length(STATUS_HEIGHT),
        ])
        .split(area);

    let [chat_area, input_area, status_area] = chunks.as_ref() else {
        return;
    };

    chat::render(frame, app, *chat_area);
    input::render(frame, app, *input_area);
    status::render(frame, app, *status_area);

    if let Some(modal) = app.modal() {
        modal::render(frame, modal, area);
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use chrono::{NaiveDate, NaiveDateTime};
    use ratatui::{Terminal, backend::TestBackend};

    use crate::App;

    /// Draw the whole UI and return the screen, one trimmed row per line.
    pub fn screen(app: &App, width: u16, height: u16) -> String {
        let mut terminal = Terminal::new(TestBackend::new(width, height)).unwrap();
        terminal.draw(|frame| super::render(frame, app)).unwrap();

        let buffer = terminal.backend().buffer();
        (0..height)
            .map(|y| {
                let row: String = (0..width).map(|x| buffer[(x, y)].symbol()).collect();
                row.trim_end().to_string()
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn at(hour: u32, min: u32, sec: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap().and_hms_opt(hour, min, sec).unwrap()
    }
}

#[cfg(test)]
mod tests {
    use parley_app::{AppEvent, ChatItem, Message, SessionView, StatusLine};
    use parley_client::TransportEvent;
    use parley_core::Admission;

    use super::test_support::{at, screen};
    use crate::App;

    fn joined_app() -> App {
        let mut app = App::new("127.0.0.1:4433", "alice");
        app.handle(AppEvent::Transport(TransportEvent::Connected));
        app.handle(AppEvent::Session(SessionView {
            admission: Admission::Joined,
            input_enabled: true,
            block_reason: None,
        }));
        app
    }

    #[test]
    fn joined_layout() {
        let mut app = joined_app();
        app.handle(AppEvent::Item(ChatItem::Message(Message {
            username: "alice".into(),
            text: "hi".into(),
            timestamp: Some(at(12, 0, 0)),
        })));
        app.handle(AppEvent::Item(ChatItem::Status(StatusLine {
            username: "bob".into(),
            status: "online".into(),
            timestamp: Some(at(12, 0, 5)),
        })));

        insta::assert_snapshot!(screen(&app, 32, 8), @r"
        ┌ Chat ────────────────────────┐
        │[12:00:00] <alice> hi         │
        │[12:00:05] bob is online      │
        └──────────────────────────────┘
        ┌──────────────────────────────┐
        │>                             │
        └──────────────────────────────┘
         Connected | Joined | alice
        ");
    }

    #[test]
    fn waiting_layout() {
        let app = App::new("127.0.0.1:4433", "alice");

        insta::assert_snapshot!(screen(&app, 36, 7), @r"
        ┌ Chat ────────────────────────────┐
        │No messages yet                   │
        └──────────────────────────────────┘
        ┌ Waiting to join ─────────────────┐
        │>                                 │
        └──────────────────────────────────┘
         Connecting... | Not joined | alice
        ");
    }
}
