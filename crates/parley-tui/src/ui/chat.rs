//! Chat area
//!
//! Messages, attachments and status notices, oldest first. The view always
//! follows the newest items.

use parley_app::{App, ChatItem, timestamp};
use ratatui::{
    Frame,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem},
};

const BORDER_SIZE: u16 = 2;

/// Render the chat area.
pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default().borders(Borders::ALL).title(" Chat ");

    let items: Vec<ListItem> = if app.chat().is_empty() {
        vec![ListItem::new(Line::from(Span::styled(
            "No messages yet",
            Style::default().fg(Color::DarkGray),
        )))]
    } else {
        lines(app).into_iter().map(ListItem::new).collect()
    };

    let visible_height = area.height.saturating_sub(BORDER_SIZE) as usize;
    let skip = items.len().saturating_sub(visible_height);
    let visible_items: Vec<_> = items.into_iter().skip(skip).collect();

    frame.render_widget(List::new(visible_items).block(block), area);
}

/// One line per chat item. Attachments are numbered from 1 in arrival order,
/// matching `/view <n>`.
fn lines(app: &App) -> Vec<Line<'_>> {
    let dim = Style::default().fg(Color::DarkGray);
    let mut attachments = 0;
    let mut lines = Vec::with_capacity(app.chat().len());

    for item in app.chat().items() {
        let line = match item {
            ChatItem::Message(message) => Line::from(vec![
                Span::styled(format!("[{}] ", timestamp::display(message.timestamp)), dim),
                sender(&message.username, app.username()),
                Span::raw(" "),
                Span::raw(message.text.as_str()),
            ]),
            ChatItem::Attachment(attachment) => {
                attachments += 1;
                Line::from(vec![
                    Span::styled(format!("[{}] ", timestamp::display(attachment.timestamp)), dim),
                    sender(&attachment.username, app.username()),
                    Span::raw(" "),
                    Span::styled(
                        format!("[image #{attachments}]"),
                        Style::default().fg(Color::Magenta),
                    ),
                    Span::raw(format!(
                        " {} ({}, {})",
                        attachment.filename,
                        attachment.media_type,
                        super::modal::human_size(attachment.data.len())
                    )),
                ])
            },
            ChatItem::Status(status) => Line::from(vec![
                Span::styled(format!("[{}] ", timestamp::display(status.timestamp)), dim),
                Span::styled(status.text(), dim.add_modifier(Modifier::ITALIC)),
            ]),
        };
        lines.push(line);
    }

    lines
}

fn sender<'a>(username: &str, own: &str) -> Span<'a> {
    let color = if username == own { Color::Cyan } else { Color::Green };
    Span::styled(format!("<{username}>"), Style::default().fg(color).add_modifier(Modifier::BOLD))
}

#[cfg(test)]
mod tests {
    use parley_app::{AppEvent, Attachment, ChatItem, Message};

    use super::*;
    use crate::ui::test_support::{at, screen};

    fn message(username: &str, text: &str) -> AppEvent {
        AppEvent::Item(ChatItem::Message(Message {
            username: username.into(),
            text: text.into(),
            timestamp: Some(at(9, 30, 0)),
        }))
    }

    #[test]
    fn attachments_are_numbered_in_arrival_order() {
        let mut app = App::new("127.0.0.1:4433", "alice");
        for (n, name) in ["a.png", "b.gif"].iter().enumerate() {
            app.handle(AppEvent::Item(ChatItem::Attachment(Attachment {
                username: "bob".into(),
                data: vec![0; 2048 * (n + 1)],
                filename: (*name).into(),
                media_type: "image/png".into(),
                timestamp: None,
            })));
        }

        let text: Vec<String> = lines(&app).iter().map(ToString::to_string).collect();
        assert_eq!(
            text,
            vec![
                "[--:--:--] <bob> [image #1] a.png (image/png, 2.0 KiB)",
                "[--:--:--] <bob> [image #2] b.gif (image/png, 4.0 KiB)",
            ]
        );
    }

    #[test]
    fn follows_the_newest_items() {
        let mut app = App::new("127.0.0.1:4433", "alice");
        for n in 0..10 {
            app.handle(message("bob", &format!("line {n}")));
        }

        let screen = screen(&app, 40, 8);
        assert!(screen.contains("line 9"));
        assert!(screen.contains("line 8"));
        assert!(!screen.contains("line 7"));
    }

    #[test]
    fn unknown_time_shows_the_placeholder() {
        let mut app = App::new("127.0.0.1:4433", "alice");
        app.handle(AppEvent::Item(ChatItem::Message(Message {
            username: "bob".into(),
            text: "when?".into(),
            timestamp: None,
        })));

        assert!(screen(&app, 40, 8).contains("[--:--:--] <bob> when?"));
    }
}
