//! Scripted client runs with invariant checking.
//!
//! A [`Scenario`] owns a production [`Runtime`] wired to a [`SimDriver`] and
//! a [`SimEnv`]. Each operation injects one input, steps the runtime until
//! nothing is pending, and returns the events the client sent in response.
//! The standard invariants are asserted after every operation.

use std::time::Duration;

use parley_app::{App, AppEvent, ClientConfig, Dispatcher, KeyInput, Runtime, timestamp};
use parley_client::TransportEvent;
use parley_core::{Environment, Session};
use parley_proto::{
    ClientEvent, PresenceStatus, ServerEvent,
    events::{IncomingImage, IncomingMessage, JoinAck, StatusNotice, UsernameError},
};

use crate::{InvariantRegistry, PriorState, SessionSnapshot, SimDriver, SimDriverError, SimEnv};

/// A client under test.
pub struct Scenario {
    runtime: Runtime<SimDriver, SimEnv>,
    driver: SimDriver,
    env: SimEnv,
    invariants: InvariantRegistry,
    sent: Vec<ClientEvent>,
    operations: usize,
    finished: bool,
}

impl Scenario {
    /// Start a client with an empty file system.
    ///
    /// # Errors
    ///
    /// Returns an error if the runtime fails to start.
    pub async fn start(config: ClientConfig) -> Result<Self, SimDriverError> {
        Self::start_with(config, SimDriver::new()).await
    }

    /// Start a client on a prepared driver.
    ///
    /// # Errors
    ///
    /// Returns an error if the runtime fails to start.
    pub async fn start_with(
        config: ClientConfig,
        driver: SimDriver,
    ) -> Result<Self, SimDriverError> {
        let env = SimEnv::new();
        let mut runtime = Runtime::new(driver.clone(), env.clone(), config);
        runtime.start().await?;

        Ok(Self {
            runtime,
            driver,
            env,
            invariants: InvariantRegistry::standard(),
            sent: Vec::new(),
            operations: 0,
            finished: false,
        })
    }

    /// Deliver an input event.
    ///
    /// # Errors
    ///
    /// Returns an error if the driver fails.
    pub async fn event(&mut self, event: AppEvent) -> Result<Vec<ClientEvent>, SimDriverError> {
        self.driver.inject_event(event);
        self.settle().await
    }

    /// Deliver a transport notification.
    ///
    /// # Errors
    ///
    /// Returns an error if the driver fails.
    pub async fn transport(
        &mut self,
        event: TransportEvent,
    ) -> Result<Vec<ClientEvent>, SimDriverError> {
        self.event(AppEvent::Transport(event)).await
    }

    /// The link comes up for the first time.
    ///
    /// # Errors
    ///
    /// Returns an error if the driver fails.
    pub async fn connect(&mut self) -> Result<Vec<ClientEvent>, SimDriverError> {
        self.transport(TransportEvent::Connected).await
    }

    /// The live link drops.
    ///
    /// # Errors
    ///
    /// Returns an error if the driver fails.
    pub async fn drop_link(&mut self) -> Result<Vec<ClientEvent>, SimDriverError> {
        self.transport(TransportEvent::Disconnected { reason: "connection lost".to_string() })
            .await
    }

    /// The link comes back after a drop.
    ///
    /// # Errors
    ///
    /// Returns an error if the driver fails.
    pub async fn reconnect(&mut self) -> Result<Vec<ClientEvent>, SimDriverError> {
        self.transport(TransportEvent::Reconnected { attempts: 1 }).await
    }

    /// Deliver a server event.
    ///
    /// # Errors
    ///
    /// Returns an error if the event cannot be encoded or the driver fails.
    pub async fn server(&mut self, event: ServerEvent) -> Result<Vec<ClientEvent>, SimDriverError> {
        self.driver.inject_server_event(event)?;
        self.settle().await
    }

    /// Server admits the client.
    ///
    /// # Errors
    ///
    /// Returns an error if the driver fails.
    pub async fn ack(&mut self) -> Result<Vec<ClientEvent>, SimDriverError> {
        let username = self.app().username().to_string();
        self.server(ServerEvent::JoinAck(JoinAck { username, status: "joined".to_string() }))
            .await
    }

    /// Server refuses the client.
    ///
    /// # Errors
    ///
    /// Returns an error if the driver fails.
    pub async fn refuse(
        &mut self,
        message: &str,
        block: bool,
    ) -> Result<Vec<ClientEvent>, SimDriverError> {
        self.server(ServerEvent::UsernameError(UsernameError {
            message: message.to_string(),
            block,
        }))
        .await
    }

    /// Another member's presence changes.
    ///
    /// # Errors
    ///
    /// Returns an error if the driver fails.
    pub async fn status_of(
        &mut self,
        username: &str,
        status: PresenceStatus,
    ) -> Result<Vec<ClientEvent>, SimDriverError> {
        self.server(ServerEvent::UserStatus(StatusNotice {
            username: username.to_string(),
            status: status.as_str().to_string(),
        }))
        .await
    }

    /// Server broadcasts a chat message.
    ///
    /// # Errors
    ///
    /// Returns an error if the driver fails.
    pub async fn message_from(
        &mut self,
        username: &str,
        message: &str,
    ) -> Result<Vec<ClientEvent>, SimDriverError> {
        let timestamp = self.server_timestamp();
        self.server(ServerEvent::Message(IncomingMessage {
            username: username.to_string(),
            message: message.to_string(),
            timestamp,
        }))
        .await
    }

    /// Server broadcasts an image.
    ///
    /// # Errors
    ///
    /// Returns an error if the driver fails.
    pub async fn image_from(
        &mut self,
        username: &str,
        filename: &str,
        mime_type: &str,
        image_data: Vec<u8>,
    ) -> Result<Vec<ClientEvent>, SimDriverError> {
        let timestamp = self.server_timestamp();
        self.server(ServerEvent::Image(IncomingImage {
            username: username.to_string(),
            image_data,
            filename: filename.to_string(),
            mime_type: mime_type.to_string(),
            timestamp,
        }))
        .await
    }

    /// Press one key.
    ///
    /// # Errors
    ///
    /// Returns an error if the driver fails.
    pub async fn key(&mut self, key: KeyInput) -> Result<Vec<ClientEvent>, SimDriverError> {
        self.event(AppEvent::Key(key)).await
    }

    /// Type a line into the composer and press Enter.
    ///
    /// # Errors
    ///
    /// Returns an error if the driver fails.
    pub async fn submit(&mut self, line: &str) -> Result<Vec<ClientEvent>, SimDriverError> {
        let mut sent = Vec::new();
        for c in line.chars() {
            sent.extend(self.key(KeyInput::Char(c)).await?);
        }
        sent.extend(self.key(KeyInput::Enter).await?);
        Ok(sent)
    }

    /// Terminal gains focus.
    ///
    /// # Errors
    ///
    /// Returns an error if the driver fails.
    pub async fn focus(&mut self) -> Result<Vec<ClientEvent>, SimDriverError> {
        self.event(AppEvent::FocusGained).await
    }

    /// Terminal loses focus.
    ///
    /// # Errors
    ///
    /// Returns an error if the driver fails.
    pub async fn blur(&mut self) -> Result<Vec<ClientEvent>, SimDriverError> {
        self.event(AppEvent::FocusLost).await
    }

    /// Let virtual time pass, then run one idle step.
    ///
    /// # Errors
    ///
    /// Returns an error if the driver fails.
    pub async fn advance(&mut self, by: Duration) -> Result<Vec<ClientEvent>, SimDriverError> {
        self.env.advance(by);
        self.settle().await
    }

    /// Press Esc until the client quits and tears the session down.
    ///
    /// # Errors
    ///
    /// Returns an error if the driver fails.
    pub async fn quit(&mut self) -> Result<Vec<ClientEvent>, SimDriverError> {
        let mut sent = Vec::new();
        if self.app().modal().is_some() {
            sent.extend(self.key(KeyInput::Esc).await?);
        }
        sent.extend(self.key(KeyInput::Esc).await?);
        Ok(sent)
    }

    fn server_timestamp(&self) -> String {
        self.env.wall_clock().format(timestamp::SERVER_FORMAT).to_string()
    }

    /// Step until nothing is pending, then check invariants.
    async fn settle(&mut self) -> Result<Vec<ClientEvent>, SimDriverError> {
        if self.finished {
            return Ok(vec![]);
        }
        self.operations += 1;

        let prior = PriorState::of(self.runtime.dispatcher().session());
        loop {
            if self.runtime.step().await? {
                self.runtime.shutdown().await?;
                self.finished = true;
                break;
            }
            if !self.driver.has_pending() {
                break;
            }
        }

        let outbound = self.driver.take_client_events();
        let snapshot = SessionSnapshot::capture(
            prior,
            self.runtime.app(),
            self.runtime.dispatcher(),
            outbound.clone(),
        );
        self.invariants.assert_all(&snapshot, &format!("after operation {}", self.operations));

        self.sent.extend(outbound.iter().cloned());
        Ok(outbound)
    }

    /// App state.
    pub fn app(&self) -> &App {
        self.runtime.app()
    }

    /// Dispatcher state.
    pub fn dispatcher(&self) -> &Dispatcher<SimEnv> {
        self.runtime.dispatcher()
    }

    /// Session state.
    pub fn session(&self) -> &Session {
        self.runtime.dispatcher().session()
    }

    /// Driver handle.
    pub fn driver(&self) -> &SimDriver {
        &self.driver
    }

    /// Virtual clock.
    pub fn env(&self) -> &SimEnv {
        &self.env
    }

    /// Everything the client has sent so far.
    pub fn sent(&self) -> &[ClientEvent] {
        &self.sent
    }

    /// True once the client has quit.
    pub fn is_finished(&self) -> bool {
        self.finished
    }
}
