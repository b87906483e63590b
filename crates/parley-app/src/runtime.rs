//! Generic runtime for application orchestration.
//!
//! The Runtime drives the event loop, coordinating between:
//! - [`App`]: View model
//! - [`Dispatcher`]: Session rules and wire encoding
//! - [`Driver`]: Platform-specific I/O
//!
//! It is the only place any of them is mutated.

use parley_core::Environment;

use crate::{App, AppAction, AppEvent, ClientConfig, Dispatcher, Driver};

/// Generic runtime that orchestrates App, Dispatcher, and Driver.
///
/// # Type Parameters
///
/// - `D`: Platform-specific I/O driver
/// - `E`: Environment providing time
pub struct Runtime<D, E>
where
    D: Driver,
    E: Environment,
{
    driver: D,
    env: E,
    app: App,
    dispatcher: Dispatcher<E>,
    config: ClientConfig,
}

impl<D, E> Runtime<D, E>
where
    D: Driver,
    E: Environment,
{
    /// Create a new runtime with the given driver, environment and config.
    pub fn new(driver: D, env: E, config: ClientConfig) -> Self {
        let dispatcher =
            Dispatcher::new(env.clone(), config.credentials().clone(), &config.presence);
        let mut app = App::new(config.server_addr(), config.username());
        let _ = app.handle(AppEvent::Session(dispatcher.view().clone()));
        Self { driver, env, app, dispatcher, config }
    }

    /// Run the main event loop until the user quits.
    ///
    /// Each cycle:
    /// 1. Polls the driver for one input event
    /// 2. Drains frames received from the server
    /// 3. Ticks the presence broadcaster
    /// 4. Sends outgoing frames through the driver
    ///
    /// On quit the session is torn down: a best-effort Offline goes out
    /// before the transport closes.
    ///
    /// # Errors
    ///
    /// Returns an error if the driver encounters an I/O error.
    pub async fn run(mut self) -> Result<(), D::Error> {
        self.start().await?;

        loop {
            if self.step().await? {
                break;
            }
        }

        self.shutdown().await
    }

    /// Render once and start the transport.
    ///
    /// # Errors
    ///
    /// Returns an error if the driver cannot render or connect.
    pub async fn start(&mut self) -> Result<(), D::Error> {
        self.driver.render(&self.app)?;
        self.driver.connect(self.config.server_addr(), &self.config.retry).await
    }

    /// Process one cycle of the event loop.
    ///
    /// Returns `true` if the application should quit.
    ///
    /// # Errors
    ///
    /// Returns an error if the driver encounters an I/O error.
    pub async fn step(&mut self) -> Result<bool, D::Error> {
        if let Some(event) = self.driver.poll_event().await?
            && self.handle_event(event).await?
        {
            return Ok(true);
        }

        while let Some(frame) = self.driver.recv_frame().await {
            let events = self.dispatcher.handle_frame(&frame);
            if self.deliver(events).await? {
                return Ok(true);
            }
        }

        let now = self.env.now();
        let events = self.dispatcher.handle_tick(now);
        self.deliver(events).await
    }

    /// Tear the session down and release the driver.
    ///
    /// # Errors
    ///
    /// Returns an error if the farewell frames cannot be handed to the
    /// driver.
    pub async fn shutdown(&mut self) -> Result<(), D::Error> {
        let events = self.dispatcher.teardown();
        for event in events {
            let _ = self.app.handle(event);
        }
        let flushed = self.flush().await;
        self.driver.stop();
        flushed
    }

    /// Route one input event.
    ///
    /// Focus and transport events also drive the session; everything reaches
    /// the App.
    async fn handle_event(&mut self, event: AppEvent) -> Result<bool, D::Error> {
        let derived = match &event {
            AppEvent::FocusGained => self.dispatcher.handle_focus(),
            AppEvent::FocusLost => self.dispatcher.handle_blur(),
            AppEvent::Transport(transport) => self.dispatcher.handle_transport(transport),
            _ => vec![],
        };

        let actions = self.app.handle(event);
        if self.process_actions(actions).await? {
            return Ok(true);
        }

        self.deliver(derived).await
    }

    /// Feed dispatcher events to the App and execute what follows.
    async fn deliver(&mut self, events: Vec<AppEvent>) -> Result<bool, D::Error> {
        for event in events {
            let actions = self.app.handle(event);
            if self.process_actions(actions).await? {
                return Ok(true);
            }
        }
        self.flush().await?;
        Ok(false)
    }

    /// Process actions returned by the App.
    ///
    /// Returns `true` if should quit.
    async fn process_actions(&mut self, initial_actions: Vec<AppAction>) -> Result<bool, D::Error> {
        let mut pending_actions = initial_actions;

        while !pending_actions.is_empty() {
            let actions = std::mem::take(&mut pending_actions);

            for action in actions {
                match action {
                    AppAction::Render => self.driver.render(&self.app)?,
                    AppAction::Quit => return Ok(true),
                    AppAction::LoadAttachment { path, filename, media_type } => {
                        self.driver.load_attachment(path, filename, media_type);
                    },
                    AppAction::SendMessage { .. } | AppAction::SendAttachment { .. } => {
                        for event in self.dispatcher.process_app_action(action) {
                            pending_actions.extend(self.app.handle(event));
                        }
                    },
                }
            }
        }

        self.flush().await?;
        Ok(false)
    }

    /// Send pending frames, then close the transport if the session asked.
    async fn flush(&mut self) -> Result<(), D::Error> {
        for frame in self.dispatcher.take_outgoing() {
            self.driver.send_frame(frame).await?;
        }
        if self.dispatcher.take_disconnect() {
            tracing::info!("closing transport");
            self.driver.disconnect().await;
        }
        Ok(())
    }

    /// Get a reference to the App
    pub fn app(&self) -> &App {
        &self.app
    }

    /// Get a reference to the Dispatcher
    pub fn dispatcher(&self) -> &Dispatcher<E> {
        &self.dispatcher
    }

    /// Get a reference to the Driver
    pub fn driver(&self) -> &D {
        &self.driver
    }
}
