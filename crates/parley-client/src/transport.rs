//! QUIC transport for the client.
//!
//! Two layers:
//! - [`connect`] dials once and returns a [`ConnectedClient`]: a pair of frame
//!   channels bridged to QUIC streams by a background task.
//! - [`spawn_link`] runs a [`Link`] against real connections: it dials,
//!   retries under the [`RetryPolicy`], and reports lifecycle events and
//!   inbound frames on one channel.
//!
//! Each frame travels on its own unidirectional stream.

use std::{
    collections::VecDeque,
    net::{Ipv4Addr, SocketAddr},
    sync::Arc,
    time::Duration,
};

use bytes::BytesMut;
use parley_proto::{Frame, FrameHeader};
use quinn::{ClientConfig, Endpoint, RecvStream, SendStream, VarInt};
use thiserror::Error;
use tokio::{sync::mpsc, time::Instant};
use zerocopy::FromBytes;

use crate::{Link, LinkAction, LinkError, LinkState, RetryPolicy, TransportEvent};

/// ALPN protocol identifier; must match the server.
pub const ALPN: &[u8] = b"parley";

/// Capacity of each frame channel.
const CHANNEL_CAPACITY: usize = 64;

/// QUIC idle timeout before the connection is considered dead.
const IDLE_TIMEOUT: Duration = Duration::from_secs(30);

/// Keep-alive interval, well under [`IDLE_TIMEOUT`].
const KEEP_ALIVE: Duration = Duration::from_secs(10);

/// Transport errors.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Connection failed.
    #[error("connection failed: {0}")]
    Connection(String),

    /// Stream error.
    #[error("stream error: {0}")]
    Stream(String),

    /// Protocol error.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// Outbound queue is full.
    #[error("outbound queue full")]
    Backpressure,

    /// Link task has stopped.
    #[error("link closed")]
    Closed,
}

/// Handle to a connected client with QUIC transport.
///
/// `from_server` yields `None` once the connection is gone.
pub struct ConnectedClient {
    /// Send frames to the server.
    pub to_server: mpsc::Sender<Frame>,
    /// Receive frames from the server.
    pub from_server: mpsc::Receiver<Frame>,
    abort_handle: tokio::task::AbortHandle,
}

impl ConnectedClient {
    /// Stop the connection.
    pub fn stop(&self) {
        self.abort_handle.abort();
    }

    /// Stop sending. Frames already queued go out, then the connection
    /// closes.
    pub fn finish(self) {
        drop(self.to_server);
    }
}

/// Connect to a Parley server via QUIC.
///
/// # Errors
///
/// - `TransportError::Connection` if the address is invalid or the handshake
///   fails
pub async fn connect(server_addr: &str) -> Result<ConnectedClient, TransportError> {
    let addr: SocketAddr = server_addr
        .parse()
        .map_err(|e| TransportError::Connection(format!("invalid address: {e}")))?;

    let mut endpoint = Endpoint::client(SocketAddr::from((Ipv4Addr::UNSPECIFIED, 0)))
        .map_err(|e| TransportError::Connection(format!("endpoint creation failed: {e}")))?;
    endpoint.set_default_client_config(insecure_client_config()?);

    let connection = endpoint
        .connect(addr, "localhost")
        .map_err(|e| TransportError::Connection(format!("connect failed: {e}")))?
        .await
        .map_err(|e| TransportError::Connection(format!("connection failed: {e}")))?;

    tracing::debug!(%addr, "QUIC connection established");

    let (to_server_tx, to_server_rx) = mpsc::channel::<Frame>(CHANNEL_CAPACITY);
    let (from_server_tx, from_server_rx) = mpsc::channel::<Frame>(CHANNEL_CAPACITY);

    let handle = tokio::spawn(run_connection(connection, to_server_rx, from_server_tx));

    Ok(ConnectedClient {
        to_server: to_server_tx,
        from_server: from_server_rx,
        abort_handle: handle.abort_handle(),
    })
}

/// Bridge the frame channels to QUIC until either side goes away.
async fn run_connection(
    connection: quinn::Connection,
    mut to_server: mpsc::Receiver<Frame>,
    from_server: mpsc::Sender<Frame>,
) {
    let conn_recv = connection.clone();
    let recv_handle = tokio::spawn(async move {
        loop {
            match conn_recv.accept_uni().await {
                Ok(recv) => {
                    let tx = from_server.clone();
                    tokio::spawn(async move {
                        if let Err(e) = handle_incoming_stream(recv, tx).await {
                            tracing::warn!(error = %e, "incoming stream dropped");
                        }
                    });
                },
                Err(e) => {
                    tracing::debug!(error = %e, "stopped accepting streams");
                    break;
                },
            }
        }
    });

    let mut sequence: u32 = 0;
    loop {
        tokio::select! {
            maybe_frame = to_server.recv() => {
                let Some(mut frame) = maybe_frame else {
                    connection.close(VarInt::from_u32(0), b"bye");
                    break;
                };
                sequence = sequence.wrapping_add(1);
                frame.header.set_sequence(sequence);

                match connection.open_uni().await {
                    Ok(send) => {
                        if let Err(e) = send_frame(send, &frame).await {
                            tracing::warn!(error = %e, "send failed");
                        }
                    },
                    Err(e) => {
                        tracing::warn!(error = %e, "cannot open stream");
                        break;
                    },
                }
            }

            reason = connection.closed() => {
                tracing::info!(%reason, "connection closed");
                break;
            }
        }
    }

    recv_handle.abort();
}

/// Read one frame from a server-initiated stream.
async fn handle_incoming_stream(
    mut recv: RecvStream,
    tx: mpsc::Sender<Frame>,
) -> Result<(), TransportError> {
    let mut buf = BytesMut::zeroed(FrameHeader::SIZE);

    recv.read_exact(&mut buf[..FrameHeader::SIZE])
        .await
        .map_err(|e| TransportError::Stream(format!("header read failed: {e}")))?;

    let header = FrameHeader::ref_from_bytes(&buf[..FrameHeader::SIZE])
        .map_err(|e| TransportError::Protocol(format!("invalid header: {e}")))?;

    let payload_size = header.payload_size() as usize;
    if payload_size > FrameHeader::MAX_PAYLOAD_SIZE as usize {
        return Err(TransportError::Protocol(format!("payload of {payload_size} bytes refused")));
    }

    if payload_size > 0 {
        buf.resize(FrameHeader::SIZE + payload_size, 0);
        recv.read_exact(&mut buf[FrameHeader::SIZE..])
            .await
            .map_err(|e| TransportError::Stream(format!("payload read failed: {e}")))?;
    }

    let frame = Frame::decode(&buf)
        .map_err(|e| TransportError::Protocol(format!("frame decode failed: {e}")))?;

    tx.send(frame).await.map_err(|e| TransportError::Stream(format!("channel send failed: {e}")))
}

/// Send a frame on a stream.
async fn send_frame(mut send: SendStream, frame: &Frame) -> Result<(), TransportError> {
    let mut buf = Vec::with_capacity(frame.encoded_len());
    frame.encode(&mut buf).map_err(|e| TransportError::Protocol(format!("encode failed: {e}")))?;

    send.write_all(&buf).await.map_err(|e| TransportError::Stream(format!("write failed: {e}")))?;
    send.finish().map_err(|e| TransportError::Stream(format!("finish failed: {e}")))?;

    Ok(())
}

/// Create an insecure client config that accepts any certificate.
///
/// WARNING: Development only. Production should verify certificates.
fn insecure_client_config() -> Result<ClientConfig, TransportError> {
    let mut crypto = rustls::ClientConfig::builder()
        .dangerous()
        .with_custom_certificate_verifier(Arc::new(InsecureCertVerifier))
        .with_no_client_auth();
    crypto.alpn_protocols = vec![ALPN.to_vec()];

    let quic = quinn::crypto::rustls::QuicClientConfig::try_from(crypto)
        .map_err(|e| TransportError::Connection(format!("TLS config rejected: {e}")))?;
    let mut config = ClientConfig::new(Arc::new(quic));

    let idle = IDLE_TIMEOUT
        .try_into()
        .map_err(|e| TransportError::Connection(format!("idle timeout out of range: {e}")))?;
    let mut transport = quinn::TransportConfig::default();
    transport.max_idle_timeout(Some(idle));
    transport.keep_alive_interval(Some(KEEP_ALIVE));
    config.transport_config(Arc::new(transport));

    Ok(config)
}

/// Certificate verifier that accepts any certificate.
#[derive(Debug)]
struct InsecureCertVerifier;

impl rustls::client::danger::ServerCertVerifier for InsecureCertVerifier {
    fn verify_server_cert(
        &self,
        _end_entity: &rustls::pki_types::CertificateDer<'_>,
        _intermediates: &[rustls::pki_types::CertificateDer<'_>],
        _server_name: &rustls::pki_types::ServerName<'_>,
        _ocsp_response: &[u8],
        _now: rustls::pki_types::UnixTime,
    ) -> Result<rustls::client::danger::ServerCertVerified, rustls::Error> {
        Ok(rustls::client::danger::ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        _message: &[u8],
        _cert: &rustls::pki_types::CertificateDer<'_>,
        _dss: &rustls::DigitallySignedStruct,
    ) -> Result<rustls::client::danger::HandshakeSignatureValid, rustls::Error> {
        Ok(rustls::client::danger::HandshakeSignatureValid::assertion())
    }

    fn verify_tls13_signature(
        &self,
        _message: &[u8],
        _cert: &rustls::pki_types::CertificateDer<'_>,
        _dss: &rustls::DigitallySignedStruct,
    ) -> Result<rustls::client::danger::HandshakeSignatureValid, rustls::Error> {
        Ok(rustls::client::danger::HandshakeSignatureValid::assertion())
    }

    fn supported_verify_schemes(&self) -> Vec<rustls::SignatureScheme> {
        vec![
            rustls::SignatureScheme::RSA_PKCS1_SHA256,
            rustls::SignatureScheme::RSA_PKCS1_SHA384,
            rustls::SignatureScheme::RSA_PKCS1_SHA512,
            rustls::SignatureScheme::ECDSA_NISTP256_SHA256,
            rustls::SignatureScheme::ECDSA_NISTP384_SHA384,
            rustls::SignatureScheme::ECDSA_NISTP521_SHA512,
            rustls::SignatureScheme::RSA_PSS_SHA256,
            rustls::SignatureScheme::RSA_PSS_SHA384,
            rustls::SignatureScheme::RSA_PSS_SHA512,
            rustls::SignatureScheme::ED25519,
        ]
    }
}

/// Commands accepted by the link supervisor.
#[derive(Debug)]
enum LinkCommand {
    Send(Frame),
    Close,
}

/// Output of the link supervisor.
#[derive(Debug)]
pub enum LinkEvent {
    /// Lifecycle notification
    Transport(TransportEvent),
    /// Frame from the server
    Frame(Frame),
}

/// Handle to a running link supervisor.
///
/// Dropping the handle stops the supervisor and any live connection.
pub struct LinkHandle {
    commands: mpsc::Sender<LinkCommand>,
    events: mpsc::Receiver<LinkEvent>,
    abort_handle: tokio::task::AbortHandle,
}

impl LinkHandle {
    /// Queue a frame for the server.
    ///
    /// Frames queued while the link is down are dropped by the supervisor.
    ///
    /// # Errors
    ///
    /// - `TransportError::Backpressure` if the queue is full
    /// - `TransportError::Closed` if the supervisor has stopped
    pub fn send(&self, frame: Frame) -> Result<(), TransportError> {
        self.commands.try_send(LinkCommand::Send(frame)).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => TransportError::Backpressure,
            mpsc::error::TrySendError::Closed(_) => TransportError::Closed,
        })
    }

    /// Ask the supervisor to hang up and stop reconnecting.
    ///
    /// Frames queued before this call are flushed first.
    pub fn close(&self) {
        if self.commands.try_send(LinkCommand::Close).is_err() {
            self.abort_handle.abort();
        }
    }

    /// Next lifecycle event or inbound frame. `None` once the supervisor has
    /// stopped.
    pub async fn next_event(&mut self) -> Option<LinkEvent> {
        self.events.recv().await
    }

    /// Close the link and wait up to `grace` for the supervisor to finish.
    ///
    /// Events still in flight are discarded.
    pub async fn shutdown(&mut self, grace: Duration) {
        self.close();
        let drained = tokio::time::timeout(grace, async {
            while self.events.recv().await.is_some() {}
        })
        .await;
        if drained.is_err() {
            tracing::debug!(?grace, "link did not wind down in time");
            self.abort();
        }
    }

    /// Stop the supervisor immediately.
    pub fn abort(&self) {
        self.abort_handle.abort();
    }
}

impl Drop for LinkHandle {
    fn drop(&mut self) {
        self.abort_handle.abort();
    }
}

/// Spawn a supervisor that keeps a link to `server_addr` alive.
///
/// The first dial starts immediately.
pub fn spawn_link(server_addr: String, policy: RetryPolicy) -> LinkHandle {
    let (commands_tx, commands_rx) = mpsc::channel(CHANNEL_CAPACITY);
    let (events_tx, events_rx) = mpsc::channel(CHANNEL_CAPACITY);

    let handle = tokio::spawn(supervise(server_addr, policy, commands_rx, events_tx));

    LinkHandle { commands: commands_tx, events: events_rx, abort_handle: handle.abort_handle() }
}

enum Wake {
    Command(Option<LinkCommand>),
    Inbound(Option<Frame>),
    BackoffElapsed,
}

async fn supervise(
    server_addr: String,
    policy: RetryPolicy,
    mut commands: mpsc::Receiver<LinkCommand>,
    events: mpsc::Sender<LinkEvent>,
) {
    let mut link: Link<Instant> = Link::new(policy);
    let mut connection: Option<ConnectedClient> = None;
    let mut queue: VecDeque<LinkAction> =
        link.start(Instant::now()).unwrap_or_default().into_iter().collect();

    loop {
        while let Some(action) = queue.pop_front() {
            match action {
                LinkAction::Notify(event) => {
                    if events.send(LinkEvent::Transport(event)).await.is_err() {
                        return;
                    }
                },
                LinkAction::Hangup => {
                    if let Some(client) = connection.take() {
                        client.finish();
                    }
                },
                LinkAction::Dial { attempt } => {
                    tracing::debug!(%server_addr, attempt, "dialing");
                    let started = Instant::now();
                    let timeout = link.policy().handshake_timeout;
                    let outcome = tokio::time::timeout(timeout, connect(&server_addr)).await;

                    let now = Instant::now();
                    let result = match outcome {
                        Ok(Ok(client)) => {
                            connection = Some(client);
                            link.dial_succeeded()
                        },
                        Ok(Err(e)) => link.dial_failed(now, LinkError::Connect(e.to_string())),
                        Err(_) => link.dial_failed(now, LinkError::HandshakeTimeout {
                            elapsed: now - started,
                        }),
                    };
                    match result {
                        Ok(actions) => queue.extend(actions),
                        Err(e) => tracing::warn!(error = %e, "link rejected dial outcome"),
                    }
                },
            }
        }

        let wake = match link.state() {
            LinkState::Closed | LinkState::Exhausted | LinkState::Idle => return,
            LinkState::Dialing => {
                // Dials complete inline above; reaching here means a lost outcome.
                queue.extend(link.tick(Instant::now()));
                continue;
            },
            LinkState::Connected => match connection.as_mut() {
                None => Wake::Inbound(None),
                Some(client) => tokio::select! {
                    cmd = commands.recv() => Wake::Command(cmd),
                    frame = client.from_server.recv() => Wake::Inbound(frame),
                },
            },
            LinkState::Backoff => {
                let until = link.next_dial().unwrap_or_else(Instant::now);
                tokio::select! {
                    cmd = commands.recv() => Wake::Command(cmd),
                    () = tokio::time::sleep_until(until) => Wake::BackoffElapsed,
                }
            },
        };

        match wake {
            Wake::Command(Some(LinkCommand::Send(frame))) => {
                let Some(client) = connection.as_ref() else {
                    tracing::warn!(kind = frame.header.kind(), "link down, frame dropped");
                    continue;
                };
                if client.to_server.send(frame).await.is_err() {
                    connection = None;
                    queue.extend(
                        link.connection_lost(Instant::now(), "connection task ended")
                            .unwrap_or_default(),
                    );
                }
            },
            Wake::Command(Some(LinkCommand::Close) | None) => {
                queue.extend(link.close());
            },
            Wake::Inbound(Some(frame)) => {
                if events.send(LinkEvent::Frame(frame)).await.is_err() {
                    return;
                }
            },
            Wake::Inbound(None) => {
                connection = None;
                queue.extend(
                    link.connection_lost(Instant::now(), "connection closed").unwrap_or_default(),
                );
            },
            Wake::BackoffElapsed => {
                queue.extend(link.tick(Instant::now()));
            },
        }
    }
}
