//! Driver trait for abstracting I/O operations.
//!
//! The [`Driver`] trait decouples the application runtime from specific I/O
//! implementations. Each frontend implements the trait to provide
//! platform-specific I/O, while the generic [`crate::Runtime`] handles all
//! orchestration.

use std::{future::Future, path::PathBuf};

use parley_client::RetryPolicy;
use parley_proto::Frame;

use crate::{App, AppEvent};

/// Abstracts I/O operations for the application runtime.
///
/// Implementations provide platform-specific I/O while the generic
/// [`Runtime`](crate::Runtime) handles orchestration logic. This ensures
/// the same orchestration code runs in the terminal and in simulation.
///
/// # Implementations
///
/// - **TUI**: crossterm for terminal events, quinn for QUIC transport
/// - **Simulation**: in-memory queues with injected events and frames
pub trait Driver: Send {
    /// Platform-specific error type.
    type Error: std::error::Error + Send + 'static;

    /// Wait briefly for the next input event.
    ///
    /// Terminal input, focus changes, transport lifecycle notifications and
    /// completed attachment reads all arrive here. Returns `None` if nothing
    /// happened before the driver's poll interval elapsed.
    fn poll_event(&mut self) -> impl Future<Output = Result<Option<AppEvent>, Self::Error>> + Send;

    /// Send a frame to the server.
    ///
    /// # Errors
    ///
    /// Returns an error if the transport has stopped for good.
    fn send_frame(&mut self, frame: Frame) -> impl Future<Output = Result<(), Self::Error>> + Send;

    /// Take a frame received from the server, if one is waiting. Never
    /// blocks.
    fn recv_frame(&mut self) -> impl Future<Output = Option<Frame>> + Send;

    /// Start the transport. Lifecycle notifications follow through
    /// [`Driver::poll_event`].
    ///
    /// # Errors
    ///
    /// Returns an error if the transport cannot be started at all.
    fn connect(
        &mut self,
        addr: &str,
        retry: &RetryPolicy,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send;

    /// Close the transport and stop reconnecting. Frames already handed to
    /// [`Driver::send_frame`] are flushed first; returns once the transport
    /// has wound down or given up trying.
    fn disconnect(&mut self) -> impl Future<Output = ()> + Send;

    /// Read a file off the event loop. Completion arrives through
    /// [`Driver::poll_event`] as `AttachmentLoaded` or `AttachmentFailed`.
    fn load_attachment(&mut self, path: PathBuf, filename: String, media_type: String);

    /// Render the application state.
    ///
    /// # Errors
    ///
    /// Returns an error if rendering fails.
    fn render(&mut self, app: &App) -> Result<(), Self::Error>;

    /// Release all resources.
    fn stop(&mut self);
}
