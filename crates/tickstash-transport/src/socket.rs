//! Authenticated WebSocket session with the game server.
//!
//! ```text
//! ScreepsClient::connect
//!     |-- API: sign in (if no token), look up user id
//!     |-- socket: send `auth <token>`, wait for `auth ok`
//!     |-- spawn writer task  <-- commands (subscribe/unsubscribe)
//!     +-- spawn reader task  --> TransportEvent queue (bounded)
//! ```
//!
//! The reader emits `Connected` and `Auth { ok: true }` first, then one
//! `Message` per channel push, then `Disconnected` when the socket closes.
//! After that the queue ends. There is no reconnect.
//!
//! `Subscribed` is queued before the command is handed to the writer, so it
//! always precedes the first push on that channel.
//!
//! The reader task holds the only strong sender. The client keeps a weak
//! one for acks, so the queue ends when the socket does even while the
//! client is still alive.

use std::collections::BTreeSet;
use std::time::Duration;

use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use tickstash_core::config::ServerConfig;
use tickstash_types::{ChannelMessage, ShardName, TransportEvent};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::protocol::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, info, trace, warn};

use crate::api::ApiClient;
use crate::error::TransportError;
use crate::frame::{self, AuthReply, Frame};
use crate::transport::Transport;

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// How long to wait for the reply to `auth`.
pub const AUTH_TIMEOUT: Duration = Duration::from_secs(30);

/// How long [`ScreepsClient`] waits for the server to close the socket
/// after the close frame has been sent.
const CLOSE_TIMEOUT: Duration = Duration::from_secs(5);

/// Live connection to the game server.
#[derive(Debug)]
pub struct ScreepsClient {
    api: ApiClient,
    token: String,
    user_id: String,
    commands: mpsc::UnboundedSender<String>,
    events: mpsc::WeakSender<TransportEvent>,
    subscriptions: BTreeSet<String>,
    writer: JoinHandle<()>,
    reader: JoinHandle<()>,
}

impl ScreepsClient {
    /// Authenticate against the HTTP API and open the socket.
    ///
    /// Returns the client and the receiving end of its event queue, which
    /// holds at most `event_buffer` undelivered events.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::MissingCredentials`] without a token or
    /// email/password, [`TransportError::Api`] if the API refuses them,
    /// and any error from [`ScreepsClient::open`].
    pub async fn connect(
        config: &ServerConfig,
        event_buffer: usize,
    ) -> Result<(Self, mpsc::Receiver<TransportEvent>), TransportError> {
        let api = ApiClient::new(&config.url)?;
        let token = match (&config.token, &config.email, &config.password) {
            (Some(token), _, _) => token.clone(),
            (None, Some(email), Some(password)) => api.sign_in(email, password).await?,
            _ => return Err(TransportError::MissingCredentials),
        };
        let user_id = api.me(&token).await?;
        info!(user_id = user_id, server = api.base_url(), "authenticated with game server API");

        let url = api.socket_url()?;
        Self::open(api, &url, token, user_id, event_buffer).await
    }

    /// Open and authenticate the socket at `url` for an already known user.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::WebSocket`] if the connection fails,
    /// [`TransportError::AuthFailed`] if the token is rejected,
    /// [`TransportError::AuthTimeout`] if no reply arrives in time, and
    /// [`TransportError::Closed`] if the server hangs up first.
    pub async fn open(
        api: ApiClient,
        url: &str,
        token: String,
        user_id: String,
        event_buffer: usize,
    ) -> Result<(Self, mpsc::Receiver<TransportEvent>), TransportError> {
        info!(url = url, "connecting to game server socket");
        let (socket, _response) = connect_async(url)
            .await
            .map_err(|e| TransportError::WebSocket(format!("failed to connect to {url}: {e}")))?;
        let (mut sink, mut stream) = socket.split();

        sink.send(Message::Text(format!("auth {token}").into()))
            .await
            .map_err(|e| TransportError::WebSocket(format!("failed to send auth: {e}")))?;
        let refreshed = tokio::time::timeout(AUTH_TIMEOUT, await_auth(&mut stream))
            .await
            .map_err(|_elapsed| TransportError::AuthTimeout)??;
        info!("socket authenticated");

        let (events_tx, events_rx) = mpsc::channel(event_buffer.max(1));
        let (commands_tx, commands_rx) = mpsc::unbounded_channel();
        let writer = tokio::spawn(write_commands(sink, commands_rx));
        let events = events_tx.downgrade();
        let reader = tokio::spawn(read_frames(stream, events_tx));

        Ok((
            Self {
                api,
                token: refreshed.unwrap_or(token),
                user_id,
                commands: commands_tx,
                events,
                subscriptions: BTreeSet::new(),
                writer,
                reader,
            },
            events_rx,
        ))
    }

    /// Id of the authenticated user.
    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    fn command(&self, text: String) -> Result<(), TransportError> {
        self.commands
            .send(text)
            .map_err(|_closed| TransportError::Closed)
    }

    /// Queue a lifecycle event without waiting. These are informational,
    /// so a full or ended queue drops them.
    fn emit(&self, event: TransportEvent) {
        let Some(events) = self.events.upgrade() else {
            debug!("event stream ended, lifecycle event dropped");
            return;
        };
        if let Err(e) = events.try_send(event) {
            debug!(error = %e, "lifecycle event not queued");
        }
    }
}

impl Transport for ScreepsClient {
    async fn shards(&self) -> Result<Vec<ShardName>, TransportError> {
        self.api.shards(&self.token).await
    }

    async fn subscribe(&mut self, channel: &str) -> Result<(), TransportError> {
        if !self.subscriptions.insert(channel.to_owned()) {
            return Ok(());
        }
        self.emit(TransportEvent::Subscribed {
            channel: channel.to_owned(),
        });
        self.command(format!("subscribe {}", frame::user_path(&self.user_id, channel)))?;
        debug!(channel = channel, "subscribe command queued");
        Ok(())
    }

    async fn unsubscribe(&mut self, channel: &str) -> Result<(), TransportError> {
        if !self.subscriptions.remove(channel) {
            return Ok(());
        }
        self.emit(TransportEvent::Unsubscribed {
            channel: channel.to_owned(),
        });
        self.command(format!("unsubscribe {}", frame::user_path(&self.user_id, channel)))?;
        debug!(channel = channel, "unsubscribe command queued");
        Ok(())
    }

    fn subscriptions(&self) -> Vec<String> {
        self.subscriptions.iter().cloned().collect()
    }

    async fn disconnect(self) {
        let Self {
            commands,
            writer,
            mut reader,
            ..
        } = self;
        drop(commands);

        if let Err(e) = writer.await {
            warn!(error = %e, "socket writer task failed");
        }
        if tokio::time::timeout(CLOSE_TIMEOUT, &mut reader).await.is_err() {
            debug!("server did not close the socket in time");
            reader.abort();
        }
        info!("disconnected from game server");
    }
}

/// Read frames until the auth reply arrives. Returns the refreshed token,
/// if any.
async fn await_auth(stream: &mut SplitStream<Socket>) -> Result<Option<String>, TransportError> {
    while let Some(message) = stream.next().await {
        match message {
            Ok(Message::Text(text)) => match frame::parse(text.as_str()) {
                Frame::Auth(AuthReply::Ok { token }) => return Ok(token),
                Frame::Auth(AuthReply::Failed) => return Err(TransportError::AuthFailed),
                other => trace!(frame = ?other, "frame before auth reply"),
            },
            Ok(Message::Close(_)) => return Err(TransportError::Closed),
            Ok(_) => {}
            Err(e) => return Err(TransportError::WebSocket(e.to_string())),
        }
    }
    Err(TransportError::Closed)
}

async fn write_commands(
    mut sink: SplitSink<Socket, Message>,
    mut commands: mpsc::UnboundedReceiver<String>,
) {
    while let Some(command) = commands.recv().await {
        debug!(command = command, "sending socket command");
        if let Err(e) = sink.send(Message::Text(command.into())).await {
            warn!(error = %e, "failed to send socket command");
            break;
        }
    }
    if let Err(e) = sink.close().await {
        debug!(error = %e, "socket close");
    }
}

async fn read_frames(mut stream: SplitStream<Socket>, events: mpsc::Sender<TransportEvent>) {
    for event in [TransportEvent::Connected, TransportEvent::Auth { ok: true }] {
        if events.send(event).await.is_err() {
            return;
        }
    }

    while let Some(message) = stream.next().await {
        let text = match message {
            Ok(Message::Text(text)) => text,
            Ok(Message::Close(frame)) => {
                debug!(frame = ?frame, "server closed the socket");
                break;
            }
            Ok(Message::Binary(bytes)) => {
                trace!(len = bytes.len(), "ignoring binary frame");
                continue;
            }
            Ok(_) => continue,
            Err(e) => {
                warn!(error = %e, "socket read failed");
                break;
            }
        };

        match frame::parse(text.as_str()) {
            Frame::Channel { path, data } => {
                let Some(channel) = frame::channel_name(&path) else {
                    debug!(path = path, "push on unrecognized path");
                    continue;
                };
                let event = TransportEvent::Message(ChannelMessage::new(channel, data));
                if events.send(event).await.is_err() {
                    debug!("event receiver dropped, stopping reader");
                    return;
                }
            }
            Frame::Compressed => warn!("dropping compressed frame"),
            Frame::Auth(reply) => debug!(reply = ?reply, "late auth reply"),
            Frame::Time(time) => trace!(time = time, "server time"),
            Frame::Protocol(version) => trace!(version = version, "server protocol"),
            Frame::Package(version) => trace!(version = version, "server package"),
            Frame::Unknown(text) => debug!(frame = text, "unrecognized frame"),
        }
    }

    if events.send(TransportEvent::Disconnected).await.is_err() {
        debug!("event receiver dropped before disconnect");
    }
}
