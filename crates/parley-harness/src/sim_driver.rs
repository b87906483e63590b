//! Simulation driver implementing the Driver trait.
//!
//! `SimDriver` provides the same interface as the terminal driver but for
//! deterministic testing. It implements [`Driver`] so the same
//! [`parley_app::Runtime`] orchestration code runs in both production and
//! simulation. Nothing touches the network or the file system: events and
//! server frames are injected, files live in an in-memory map, and every
//! frame the client sends is kept for inspection.

use std::{
    collections::{HashMap, VecDeque},
    path::{Path, PathBuf},
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use parley_app::{App, AppEvent, Driver};
use parley_client::{RetryPolicy, TransportEvent};
use parley_proto::{ClientEvent, Frame, ServerEvent};

/// Error type for simulation driver.
#[derive(Debug, Clone)]
pub struct SimDriverError(pub String);

impl std::fmt::Display for SimDriverError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SimDriverError: {}", self.0)
    }
}

impl std::error::Error for SimDriverError {}

/// Shared state for event injection.
///
/// This allows injection from outside async contexts.
#[derive(Default)]
struct SharedState {
    pending_events: VecDeque<AppEvent>,
    incoming_frames: VecDeque<Frame>,
    outgoing_frames: Vec<Frame>,
    files: HashMap<PathBuf, Vec<u8>>,
    connected_to: Option<String>,
    disconnects: usize,
    renders: usize,
    stopped: bool,
}

/// Simulation driver for deterministic testing.
///
/// Clones share state, so a test can keep a handle after moving the driver
/// into a runtime.
#[derive(Clone, Default)]
pub struct SimDriver {
    state: Arc<Mutex<SharedState>>,
}

impl SimDriver {
    /// Create a new simulation driver.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make a file readable by `/image`.
    #[must_use]
    pub fn with_file(self, path: impl Into<PathBuf>, bytes: Vec<u8>) -> Self {
        self.lock().files.insert(path.into(), bytes);
        self
    }

    /// Inject an `AppEvent` for processing.
    pub fn inject_event(&self, event: AppEvent) {
        self.lock().pending_events.push_back(event);
    }

    /// Inject a transport lifecycle notification.
    pub fn inject_transport(&self, event: TransportEvent) {
        self.inject_event(AppEvent::Transport(event));
    }

    /// Inject a frame from the server.
    pub fn inject_frame(&self, frame: Frame) {
        self.lock().incoming_frames.push_back(frame);
    }

    /// Encode and inject a server event.
    ///
    /// # Errors
    ///
    /// Returns an error if the event cannot be encoded.
    pub fn inject_server_event(&self, event: ServerEvent) -> Result<(), SimDriverError> {
        let frame = event.into_frame().map_err(|e| SimDriverError(e.to_string()))?;
        self.inject_frame(frame);
        Ok(())
    }

    /// True if injected events or frames are waiting.
    pub fn has_pending(&self) -> bool {
        let state = self.lock();
        !state.pending_events.is_empty() || !state.incoming_frames.is_empty()
    }

    /// Take all frames the client sent.
    pub fn take_outgoing(&self) -> Vec<Frame> {
        std::mem::take(&mut self.lock().outgoing_frames)
    }

    /// Take all frames the client sent, decoded.
    ///
    /// Frames that do not decode are skipped; the client never produces any.
    pub fn take_client_events(&self) -> Vec<ClientEvent> {
        self.take_outgoing()
            .iter()
            .filter_map(|frame| match ClientEvent::from_frame(frame) {
                Ok(event) => Some(event),
                Err(e) => {
                    tracing::warn!(error = %e, "client sent an undecodable frame");
                    None
                },
            })
            .collect()
    }

    /// Address passed to the last `connect`.
    pub fn connected_to(&self) -> Option<String> {
        self.lock().connected_to.clone()
    }

    /// Number of times the runtime closed the transport.
    pub fn disconnects(&self) -> usize {
        self.lock().disconnects
    }

    /// Number of renders.
    pub fn renders(&self) -> usize {
        self.lock().renders
    }

    /// True once the runtime released the driver.
    pub fn is_stopped(&self) -> bool {
        self.lock().stopped
    }

    fn lock(&self) -> MutexGuard<'_, SharedState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Driver for SimDriver {
    type Error = SimDriverError;

    async fn poll_event(&mut self) -> Result<Option<AppEvent>, Self::Error> {
        Ok(self.lock().pending_events.pop_front())
    }

    async fn send_frame(&mut self, frame: Frame) -> Result<(), Self::Error> {
        let mut state = self.lock();
        if state.stopped {
            return Err(SimDriverError("driver stopped".to_string()));
        }
        state.outgoing_frames.push(frame);
        Ok(())
    }

    async fn recv_frame(&mut self) -> Option<Frame> {
        self.lock().incoming_frames.pop_front()
    }

    async fn connect(&mut self, addr: &str, retry: &RetryPolicy) -> Result<(), Self::Error> {
        tracing::debug!(addr, max_attempts = retry.max_attempts, "simulated connect");
        self.lock().connected_to = Some(addr.to_string());
        Ok(())
    }

    async fn disconnect(&mut self) {
        self.lock().disconnects += 1;
    }

    fn load_attachment(&mut self, path: PathBuf, filename: String, media_type: String) {
        let mut state = self.lock();
        let event = match state.files.get(Path::new(&path)) {
            Some(data) => AppEvent::AttachmentLoaded { filename, media_type, data: data.clone() },
            None => AppEvent::AttachmentFailed {
                path: path.display().to_string(),
                error: "No such file or directory".to_string(),
            },
        };
        state.pending_events.push_back(event);
    }

    fn render(&mut self, _app: &App) -> Result<(), Self::Error> {
        self.lock().renders += 1;
        Ok(())
    }

    fn stop(&mut self) {
        self.lock().stopped = true;
    }
}
