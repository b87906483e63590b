//! Status bar
//!
//! Connection state, admission, username and the latest notice.

use parley_app::{App, LinkStatus, SessionView};
use parley_core::Admission;
use ratatui::{
    Frame,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
};

/// Render the status bar.
pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let link_color = match app.link() {
        LinkStatus::Connected => Color::Green,
        LinkStatus::Connecting | LinkStatus::Reconnecting { .. } => Color::Yellow,
        LinkStatus::Disconnected { .. } | LinkStatus::Failed => Color::Red,
    };
    let admission_color = match app.session().admission {
        Admission::Joined => Color::Green,
        Admission::Unjoined => Color::Yellow,
        Admission::Blocked => Color::Red,
    };
    let separator = Span::styled(" | ", Style::default().fg(Color::Gray));

    let mut spans = vec![
        Span::raw(" "),
        Span::styled(
            link_label(app.link()),
            Style::default().fg(link_color).add_modifier(Modifier::BOLD),
        ),
        separator.clone(),
        Span::styled(admission_label(app.session()), Style::default().fg(admission_color)),
        separator.clone(),
        Span::raw(app.username()),
    ];
    if let Some(notice) = app.notice() {
        spans.push(separator);
        spans.push(Span::styled(notice, Style::default().fg(Color::Yellow)));
    }

    let paragraph = Paragraph::new(Line::from(spans))
        .style(Style::default().bg(Color::DarkGray).fg(Color::White));

    frame.render_widget(paragraph, area);
}

fn link_label(link: &LinkStatus) -> String {
    match link {
        LinkStatus::Connecting => "Connecting...".to_string(),
        LinkStatus::Connected => "Connected".to_string(),
        LinkStatus::Reconnecting { attempt } => format!("Reconnecting (attempt {attempt})"),
        LinkStatus::Disconnected { reason } => format!("Disconnected: {reason}"),
        LinkStatus::Failed => "Offline".to_string(),
    }
}

fn admission_label(view: &SessionView) -> String {
    match (view.admission, &view.block_reason) {
        (Admission::Joined, _) => "Joined".to_string(),
        (Admission::Unjoined, _) => "Not joined".to_string(),
        (Admission::Blocked, Some(reason)) => format!("Blocked: {reason}"),
        (Admission::Blocked, None) => "Blocked".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use parley_app::AppEvent;
    use parley_client::TransportEvent;

    use super::*;
    use crate::ui::test_support::screen;

    #[test]
    fn link_labels() {
        assert_eq!(
            link_label(&LinkStatus::Reconnecting { attempt: 3 }),
            "Reconnecting (attempt 3)"
        );
        assert_eq!(
            link_label(&LinkStatus::Disconnected { reason: "timed out".into() }),
            "Disconnected: timed out"
        );
        assert_eq!(link_label(&LinkStatus::Failed), "Offline");
    }

    #[test]
    fn block_reason_is_shown() {
        let view = SessionView {
            admission: Admission::Blocked,
            input_enabled: false,
            block_reason: Some("Access denied".into()),
        };
        assert_eq!(admission_label(&view), "Blocked: Access denied");
    }

    #[test]
    fn retry_and_notice_reach_the_bar() {
        let mut app = App::new("127.0.0.1:4433", "alice");
        app.handle(AppEvent::Transport(TransportEvent::Reconnecting { attempt: 2 }));
        app.handle(AppEvent::Notice { message: "Not sent".into() });

        let screen = screen(&app, 80, 8);
        let bar = screen.lines().last().unwrap();
        assert_eq!(bar, " Reconnecting (attempt 2) | Not joined | alice | Not sent");
    }
}
