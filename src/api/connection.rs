use futures::{SinkExt, StreamExt};
use log::{debug, info, warn};
use std::future::Future;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, watch};
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use url::Url;

use crate::api::error::ClientError;
use crate::api::events::{ClientRequest, ServerEvent};
use crate::api::models::{ClientId, ConnectionStatus};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backoff {
    Fixed,
    Exponential { max_delay: Duration },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectPolicy {
    pub delay: Duration,
    pub backoff: Backoff,
    /// Consecutive attempts allowed without a successful open. `None` retries forever.
    pub max_attempts: Option<u32>,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self { delay: DEFAULT_RECONNECT_DELAY, backoff: Backoff::Fixed, max_attempts: None }
    }
}

impl ReconnectPolicy {
    /// Wait before the reconnect following `attempt` consecutive failures,
    /// or `None` once the budget is spent.
    pub fn delay_for(&self, attempt: u32) -> Option<Duration> {
        if self.max_attempts.is_some_and(|max| attempt >= max) {
            return None;
        }
        Some(match self.backoff {
            Backoff::Fixed => self.delay,
            Backoff::Exponential { max_delay } => self
                .delay
                .saturating_mul(2u32.saturating_pow(attempt.min(16)))
                .min(max_delay),
        })
    }
}

/// Everything the connection reports back to the UI thread.
#[derive(Debug, Clone, PartialEq)]
pub enum ConnectionEvent {
    Status(ConnectionStatus),
    Server(ServerEvent),
    RetriesExhausted { attempts: u32 },
    /// A request accepted by `send` that never reached the socket.
    RequestLost(ClientRequest),
}

/// Outbound side of the connection as seen by the view state.
pub trait RequestSink {
    fn is_open(&self) -> bool;
    fn send(&self, request: &ClientRequest) -> Result<(), ClientError>;
}

/// `<endpoint>/ws/<client_id>`
pub fn session_url(endpoint: &Url, client_id: &ClientId) -> Result<Url, url::ParseError> {
    let base = endpoint.as_str().trim_end_matches('/');
    Url::parse(&format!("{base}/ws/{client_id}"))
}

pub struct ConnectionManager;

impl ConnectionManager {
    /// Builds the handle and the connection task. The task must be spawned on a
    /// tokio runtime; it runs until the handle is closed or dropped, or until
    /// the reconnect budget runs out.
    pub fn connect(
        endpoint: &Url,
        client_id: &ClientId,
        policy: ReconnectPolicy,
        events: mpsc::UnboundedSender<ConnectionEvent>,
    ) -> Result<(ConnectionHandle, impl Future<Output = ()> + Send + use<>), ClientError> {
        let url = session_url(endpoint, client_id)?;
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let (status_tx, status_rx) = watch::channel(ConnectionStatus::Connecting);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let worker = Worker {
            url,
            policy,
            events,
            outbound: outbound_rx,
            status: status_tx,
            shutdown: shutdown_rx,
        };
        let handle = ConnectionHandle {
            outbound: outbound_tx,
            status: status_rx,
            shutdown: shutdown_tx,
        };
        Ok((handle, worker.run()))
    }
}

pub struct ConnectionHandle {
    outbound: mpsc::UnboundedSender<ClientRequest>,
    status: watch::Receiver<ConnectionStatus>,
    shutdown: watch::Sender<bool>,
}

impl ConnectionHandle {
    pub fn status(&self) -> ConnectionStatus {
        *self.status.borrow()
    }

    /// Closes the live socket and cancels any pending reconnect. Safe to call repeatedly.
    pub fn close(&self) {
        if !self.shutdown.send_replace(true) {
            info!("Closing simulator connection");
        }
    }
}

impl RequestSink for ConnectionHandle {
    fn is_open(&self) -> bool {
        self.status() == ConnectionStatus::Connected
    }

    fn send(&self, request: &ClientRequest) -> Result<(), ClientError> {
        if !self.is_open() {
            return Err(ClientError::NotConnected);
        }
        self.outbound.send(request.clone()).map_err(|_| ClientError::Closed)
    }
}

impl Drop for ConnectionHandle {
    fn drop(&mut self) {
        self.close();
    }
}

enum SessionEnd {
    Shutdown,
    Closed,
    Failed,
}

struct Worker {
    url: Url,
    policy: ReconnectPolicy,
    events: mpsc::UnboundedSender<ConnectionEvent>,
    outbound: mpsc::UnboundedReceiver<ClientRequest>,
    status: watch::Sender<ConnectionStatus>,
    shutdown: watch::Receiver<bool>,
}

impl Worker {
    async fn run(mut self) {
        let mut attempt: u32 = 0;
        loop {
            if *self.shutdown.borrow() || self.events.is_closed() {
                break;
            }
            self.set_status(ConnectionStatus::Connecting);
            debug!("Connecting to {}", self.url);

            let connected = tokio::select! {
                res = connect_async(self.url.as_str()) => res,
                _ = self.shutdown.changed() => break,
            };
            let end = match connected {
                Ok((stream, _)) => {
                    attempt = 0;
                    self.session(stream).await
                }
                Err(e) => {
                    warn!("Connecting to {} failed: {}", self.url, e);
                    SessionEnd::Failed
                }
            };
            match end {
                SessionEnd::Shutdown => break,
                SessionEnd::Closed => self.set_status(ConnectionStatus::Disconnected),
                SessionEnd::Failed => self.set_status(ConnectionStatus::Error),
            }
            self.discard_queued();

            let Some(delay) = self.policy.delay_for(attempt) else {
                warn!("Giving up on {} after {} reconnect attempts", self.url, attempt);
                let _ = self.events.send(ConnectionEvent::RetriesExhausted { attempts: attempt });
                break;
            };
            attempt += 1;
            info!("Reconnecting in {}ms (attempt {})", delay.as_millis(), attempt);
            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                _ = self.shutdown.changed() => break,
            }
        }
        self.set_status(ConnectionStatus::Disconnected);
        self.discard_queued();
        debug!("Connection task for {} finished", self.url);
    }

    async fn session(&mut self, stream: WsStream) -> SessionEnd {
        let (mut write, mut read) = stream.split();

        // queued while the previous socket was going away
        self.discard_queued();
        info!("WebSocket connected to {}", self.url);
        self.set_status(ConnectionStatus::Connected);

        loop {
            tokio::select! {
                _ = self.shutdown.changed() => {
                    let _ = write.send(WsMessage::Close(None)).await;
                    return SessionEnd::Shutdown;
                }
                Some(request) = self.outbound.recv() => {
                    let text = match request.encode() {
                        Ok(text) => text,
                        Err(e) => {
                            warn!("Could not encode request: {}", e);
                            self.lost(request);
                            continue;
                        }
                    };
                    if let Err(e) = write.send(WsMessage::Text(text)).await {
                        warn!("WebSocket write failed: {}", e);
                        self.lost(request);
                        return SessionEnd::Failed;
                    }
                }
                frame = read.next() => match frame {
                    Some(Ok(WsMessage::Text(text))) => self.dispatch(&text),
                    Some(Ok(WsMessage::Close(frame))) => {
                        info!("WebSocket closed by server: {:?}", frame);
                        return SessionEnd::Closed;
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        warn!("WebSocket read failed: {}", e);
                        return SessionEnd::Failed;
                    }
                    None => return SessionEnd::Closed,
                },
            }
        }
    }

    fn dispatch(&self, text: &str) {
        match ServerEvent::decode(text) {
            Ok(Some(event)) => {
                debug!("Received {:?}", event);
                let _ = self.events.send(ConnectionEvent::Server(event));
            }
            Ok(None) => debug!("Ignoring unrecognized event: {}", text),
            Err(e) => warn!("Skipping malformed frame ({}): {}", e, text),
        }
    }

    /// Requests left in the queue belong to a socket that is gone; report them.
    fn discard_queued(&mut self) {
        while let Ok(stale) = self.outbound.try_recv() {
            warn!("Dropping request queued for a closed socket: {:?}", stale);
            self.lost(stale);
        }
    }

    fn lost(&self, request: ClientRequest) {
        let _ = self.events.send(ConnectionEvent::RequestLost(request));
    }

    fn set_status(&self, status: ConnectionStatus) {
        if self.status.send_replace(status) != status {
            let _ = self.events.send(ConnectionEvent::Status(status));
        }
    }
}
