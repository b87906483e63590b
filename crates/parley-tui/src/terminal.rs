//! Terminal driver for the TUI.
//!
//! Implements the [`Driver`] trait for terminal I/O using crossterm for
//! keyboard and focus events and ratatui for rendering. The link to the room
//! server is a supervised QUIC connection from [`parley_client::transport`].

use std::{
    collections::VecDeque,
    io::{self, Stdout, stdout},
    path::{Path, PathBuf},
    time::Duration,
};

use crossterm::{
    ExecutableCommand,
    event::{
        DisableFocusChange, EnableFocusChange, Event, EventStream, KeyCode, KeyEvent,
        KeyEventKind, KeyModifiers,
    },
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use futures::StreamExt;
use parley_app::{App, AppEvent, Driver, KeyInput};
use parley_client::{
    RetryPolicy,
    transport::{self, LinkEvent, LinkHandle, TransportError},
};
use parley_proto::{Frame, FrameHeader};
use ratatui::{Terminal, backend::CrosstermBackend};
use thiserror::Error;
use tokio::sync::mpsc;

use crate::ui;

/// How long `poll_event` waits before reporting an idle cycle.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// How long a closing link may take to flush.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(1);

/// Pending file reads.
const LOAD_QUEUE_CAPACITY: usize = 16;

/// Terminal driver errors.
#[derive(Debug, Error)]
pub enum TerminalError {
    /// I/O error from terminal operations.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Transport error.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),
}

/// Terminal driver implementing the [`Driver`] trait.
pub struct TerminalDriver {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    event_stream: EventStream,
    link: Option<LinkHandle>,
    inbound: VecDeque<Frame>,
    loads_tx: mpsc::Sender<AppEvent>,
    loads_rx: mpsc::Receiver<AppEvent>,
}

impl TerminalDriver {
    /// Take over the terminal: raw mode, alternate screen, focus reporting.
    pub fn new() -> Result<Self, TerminalError> {
        enable_raw_mode()?;
        stdout().execute(EnterAlternateScreen)?;
        stdout().execute(EnableFocusChange)?;

        let backend = CrosstermBackend::new(stdout());
        let terminal = Terminal::new(backend)?;
        let (loads_tx, loads_rx) = mpsc::channel(LOAD_QUEUE_CAPACITY);

        Ok(Self {
            terminal,
            event_stream: EventStream::new(),
            link: None,
            inbound: VecDeque::new(),
            loads_tx,
            loads_rx,
        })
    }
}

/// Convert a crossterm event to an `AppEvent`.
fn convert_event(event: Event) -> Option<AppEvent> {
    match event {
        Event::Key(key) if key.kind == KeyEventKind::Press => convert_key(key).map(AppEvent::Key),
        Event::Resize(cols, rows) => Some(AppEvent::Resize(cols, rows)),
        Event::FocusGained => Some(AppEvent::FocusGained),
        Event::FocusLost => Some(AppEvent::FocusLost),
        _ => None,
    }
}

/// Convert a crossterm key to `KeyInput`. Ctrl+C acts as Esc.
fn convert_key(key: KeyEvent) -> Option<KeyInput> {
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return (key.code == KeyCode::Char('c')).then_some(KeyInput::Esc);
    }

    match key.code {
        KeyCode::Char(c) => Some(KeyInput::Char(c)),
        KeyCode::Enter => Some(KeyInput::Enter),
        KeyCode::Backspace => Some(KeyInput::Backspace),
        KeyCode::Delete => Some(KeyInput::Delete),
        KeyCode::Esc => Some(KeyInput::Esc),
        KeyCode::Left => Some(KeyInput::Left),
        KeyCode::Right => Some(KeyInput::Right),
        KeyCode::Home => Some(KeyInput::Home),
        KeyCode::End => Some(KeyInput::End),
        _ => None,
    }
}

async fn next_link_event(link: &mut Option<LinkHandle>) -> Option<LinkEvent> {
    match link {
        Some(link) => link.next_event().await,
        None => std::future::pending().await,
    }
}

impl Driver for TerminalDriver {
    type Error = TerminalError;

    async fn poll_event(&mut self) -> Result<Option<AppEvent>, Self::Error> {
        let Self { event_stream, link, inbound, loads_rx, .. } = self;

        tokio::select! {
            biased;

            maybe_event = event_stream.next() => match maybe_event {
                Some(Ok(event)) => Ok(convert_event(event)),
                Some(Err(e)) => Err(TerminalError::Io(e)),
                None => Ok(None),
            },

            Some(event) = loads_rx.recv() => Ok(Some(event)),

            Some(event) = next_link_event(link) => match event {
                LinkEvent::Transport(event) => Ok(Some(AppEvent::Transport(event))),
                LinkEvent::Frame(frame) => {
                    inbound.push_back(frame);
                    Ok(None)
                },
            },

            () = tokio::time::sleep(POLL_INTERVAL) => Ok(None),
        }
    }

    async fn send_frame(&mut self, frame: Frame) -> Result<(), Self::Error> {
        let Some(link) = &self.link else {
            tracing::warn!(kind = frame.header.kind(), "no link, frame dropped");
            return Ok(());
        };

        match link.send(frame) {
            Ok(()) => Ok(()),
            Err(TransportError::Backpressure) => {
                tracing::warn!("send queue full, frame dropped");
                Ok(())
            },
            Err(e) => Err(e.into()),
        }
    }

    async fn recv_frame(&mut self) -> Option<Frame> {
        self.inbound.pop_front()
    }

    async fn connect(&mut self, addr: &str, retry: &RetryPolicy) -> Result<(), Self::Error> {
        tracing::info!(addr, "starting link");
        self.link = Some(transport::spawn_link(addr.to_string(), retry.clone()));
        Ok(())
    }

    async fn disconnect(&mut self) {
        if let Some(mut link) = self.link.take() {
            link.shutdown(SHUTDOWN_GRACE).await;
        }
    }

    fn load_attachment(&mut self, path: PathBuf, filename: String, media_type: String) {
        let tx = self.loads_tx.clone();
        tokio::spawn(async move {
            let event = match read_attachment(&path).await {
                Ok(data) => AppEvent::AttachmentLoaded { filename, media_type, data },
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "cannot read attachment");
                    AppEvent::AttachmentFailed {
                        path: path.display().to_string(),
                        error: e.to_string(),
                    }
                },
            };
            if tx.send(event).await.is_err() {
                tracing::debug!("attachment read finished after shutdown");
            }
        });
    }

    fn render(&mut self, app: &App) -> Result<(), Self::Error> {
        self.terminal.draw(|frame| ui::render(frame, app))?;
        Ok(())
    }

    fn stop(&mut self) {
        if let Some(link) = self.link.take() {
            link.abort();
        }
    }
}

impl Drop for TerminalDriver {
    fn drop(&mut self) {
        self.stop();
        let _ = disable_raw_mode();
        let _ = stdout().execute(DisableFocusChange);
        let _ = stdout().execute(LeaveAlternateScreen);
    }
}

/// Read an attachment, refusing files that cannot fit in one frame.
async fn read_attachment(path: &Path) -> io::Result<Vec<u8>> {
    let size = tokio::fs::metadata(path).await?.len();
    let limit = u64::from(FrameHeader::MAX_PAYLOAD_SIZE);
    if size > limit {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("file is too large ({size} bytes, limit {limit} bytes)"),
        ));
    }
    tokio::fs::read(path).await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(code: KeyCode, modifiers: KeyModifiers) -> Event {
        Event::Key(KeyEvent::new(code, modifiers))
    }

    #[test]
    fn keys_map_to_composer_input() {
        assert_eq!(
            convert_event(press(KeyCode::Char('x'), KeyModifiers::NONE)),
            Some(AppEvent::Key(KeyInput::Char('x')))
        );
        assert_eq!(
            convert_event(press(KeyCode::Char('X'), KeyModifiers::SHIFT)),
            Some(AppEvent::Key(KeyInput::Char('X')))
        );
        assert_eq!(
            convert_event(press(KeyCode::Enter, KeyModifiers::NONE)),
            Some(AppEvent::Key(KeyInput::Enter))
        );
        assert_eq!(convert_event(press(KeyCode::F(5), KeyModifiers::NONE)), None);
    }

    #[test]
    fn ctrl_c_quits_and_other_chords_are_ignored() {
        assert_eq!(
            convert_event(press(KeyCode::Char('c'), KeyModifiers::CONTROL)),
            Some(AppEvent::Key(KeyInput::Esc))
        );
        assert_eq!(convert_event(press(KeyCode::Char('a'), KeyModifiers::CONTROL)), None);
    }

    #[test]
    fn key_releases_are_ignored() {
        let mut key = KeyEvent::new(KeyCode::Char('x'), KeyModifiers::NONE);
        key.kind = KeyEventKind::Release;
        assert_eq!(convert_event(Event::Key(key)), None);
    }

    #[tokio::test]
    async fn oversized_files_are_not_read() {
        let dir = std::env::temp_dir().join(format!("parley-attach-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();

        let big = dir.join("big.png");
        let file = std::fs::File::create(&big).unwrap();
        file.set_len(u64::from(FrameHeader::MAX_PAYLOAD_SIZE) + 1024).unwrap();
        let small = dir.join("small.png");
        std::fs::write(&small, [1, 2, 3]).unwrap();

        let err = read_attachment(&big).await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
        assert!(err.to_string().starts_with("file is too large"));
        assert_eq!(read_attachment(&small).await.unwrap(), vec![1, 2, 3]);

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn focus_and_resize_pass_through() {
        assert_eq!(convert_event(Event::FocusGained), Some(AppEvent::FocusGained));
        assert_eq!(convert_event(Event::FocusLost), Some(AppEvent::FocusLost));
        assert_eq!(convert_event(Event::Resize(120, 40)), Some(AppEvent::Resize(120, 40)));
    }
}
