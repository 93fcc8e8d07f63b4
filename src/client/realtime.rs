use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use futures::{Sink, SinkExt, StreamExt};
use thiserror::Error;
use tokio::{
    sync::mpsc::{self, UnboundedReceiver, UnboundedSender},
    task::JoinHandle,
};
use tokio_tungstenite::{
    connect_async,
    tungstenite::{Error as WsError, Message},
};
use uuid::Uuid;

use crate::websocket::types::{ClientMessage, JoinRoomPayload, WsMessage};

#[derive(Error, Debug)]
pub enum RealtimeError {
    #[error(transparent)]
    Socket(#[from] WsError),

    #[error(transparent)]
    Encode(#[from] serde_json::Error),
}

/// Supplies the access token for each connection attempt.
#[async_trait]
pub trait TokenSource: Send + Sync {
    /// `None` once the session is gone.
    fn access_token(&self) -> Option<String>;

    /// Called after the server rejected the current token. True when a new
    /// token is available.
    async fn renew(&self) -> bool;
}

/// Exponential backoff: `base_delay`, doubled per attempt, `max_attempts`
/// tries in a row before giving up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectPolicy {
    pub base_delay: Duration,
    pub max_attempts: u32,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            base_delay: Duration::from_secs(1),
            max_attempts: 5,
        }
    }
}

impl ReconnectPolicy {
    /// Wait before reconnect number `attempt` (zero based); `None` once the
    /// attempts are used up.
    pub fn delay(&self, attempt: u32) -> Option<Duration> {
        (attempt < self.max_attempts).then(|| self.base_delay * 2u32.saturating_pow(attempt))
    }
}

/// Live feed of server frames for one user. Dropping it closes the socket.
pub struct RealtimeSubscription {
    events: UnboundedReceiver<WsMessage>,
    outbound: UnboundedSender<ClientMessage>,
    task: JoinHandle<()>,
}

impl RealtimeSubscription {
    /// `None` once the channel has given up reconnecting.
    pub async fn recv(&mut self) -> Option<WsMessage> {
        self.events.recv().await
    }

    /// Queues a relay frame. Returns false when the channel is gone.
    pub fn send(&self, frame: ClientMessage) -> bool {
        self.outbound.send(frame).is_ok()
    }

    pub fn close(self) {
        self.task.abort();
    }
}

impl Drop for RealtimeSubscription {
    fn drop(&mut self) {
        self.task.abort();
    }
}

pub struct RealtimeClient {
    ws_url: String,
    policy: ReconnectPolicy,
}

impl RealtimeClient {
    pub fn new(ws_url: impl Into<String>, policy: ReconnectPolicy) -> Self {
        Self {
            ws_url: ws_url.into(),
            policy,
        }
    }

    fn connect_url(&self, token: &str) -> String {
        let separator = if self.ws_url.contains('?') { '&' } else { '?' };
        format!("{}{}token={}", self.ws_url, separator, token)
    }

    /// Connects in the background and keeps reconnecting per the policy. The
    /// token is read again before every attempt.
    pub fn subscribe(self, tokens: Arc<dyn TokenSource>, user_id: Uuid) -> RealtimeSubscription {
        let (events_tx, events) = mpsc::unbounded_channel();
        let (outbound, outbound_rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(self.run(tokens, user_id, events_tx, outbound_rx));

        RealtimeSubscription {
            events,
            outbound,
            task,
        }
    }

    async fn run(
        self,
        tokens: Arc<dyn TokenSource>,
        user_id: Uuid,
        events: UnboundedSender<WsMessage>,
        mut outbound: UnboundedReceiver<ClientMessage>,
    ) {
        let mut attempt = 0;

        loop {
            let Some(token) = tokens.access_token() else {
                tracing::info!("Realtime channel closed: no active session");
                return;
            };

            match connect_async(self.connect_url(&token).as_str()).await {
                Ok((stream, _)) => {
                    attempt = 0;
                    tracing::info!("Realtime channel connected for user {}", user_id);
                    let (sink, source) = stream.split();
                    if !pump(sink, source, user_id, &events, &mut outbound).await {
                        return;
                    }
                    tracing::info!("Realtime channel disconnected for user {}", user_id);
                }
                Err(WsError::Http(response)) if response.status().as_u16() == 401 => {
                    tracing::info!("Realtime token rejected, renewing session");
                    if !tokens.renew().await {
                        tracing::info!("Realtime channel closed: session could not be renewed");
                        return;
                    }
                }
                Err(e) => tracing::warn!("Realtime connection failed: {}", e),
            }

            let Some(delay) = self.policy.delay(attempt) else {
                tracing::info!("Realtime channel gave up after {} attempts", attempt);
                return;
            };
            attempt += 1;
            tracing::debug!("Reconnecting realtime channel in {:?} (attempt {})", delay, attempt);
            tokio::time::sleep(delay).await;
        }
    }
}

async fn send_frame<S>(sink: &mut S, frame: &ClientMessage) -> Result<(), RealtimeError>
where
    S: Sink<Message, Error = WsError> + Unpin,
{
    let text = serde_json::to_string(frame)?;
    sink.send(Message::Text(text)).await?;
    Ok(())
}

/// Moves frames until the socket closes. Returns false when the subscriber
/// went away and reconnecting is pointless.
async fn pump<S, R>(
    mut sink: S,
    mut source: R,
    user_id: Uuid,
    events: &UnboundedSender<WsMessage>,
    outbound: &mut UnboundedReceiver<ClientMessage>,
) -> bool
where
    S: Sink<Message, Error = WsError> + Unpin,
    R: futures::Stream<Item = Result<Message, WsError>> + Unpin,
{
    let join = ClientMessage::JoinUserRoom(JoinRoomPayload { user_id });
    if let Err(e) = send_frame(&mut sink, &join).await {
        tracing::warn!("Failed to join room {}: {}", user_id, e);
        return true;
    }

    loop {
        tokio::select! {
            frame = source.next() => match frame {
                Some(Ok(Message::Text(text))) => match serde_json::from_str::<WsMessage>(&text) {
                    Ok(message) => {
                        if events.send(message).is_err() {
                            return false;
                        }
                    }
                    Err(e) => tracing::debug!("Ignoring unreadable frame: {}", e),
                },
                Some(Ok(Message::Close(_))) | None => return true,
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    tracing::warn!("Realtime channel error: {}", e);
                    return true;
                }
            },
            outgoing = outbound.recv() => match outgoing {
                Some(frame) => {
                    if let Err(e) = send_frame(&mut sink, &frame).await {
                        tracing::warn!("Failed to send frame: {}", e);
                        return true;
                    }
                }
                None => return false,
            },
        }
    }
}
