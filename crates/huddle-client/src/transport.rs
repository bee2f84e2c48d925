//! WebSocket transport for the live channel.
//!
//! Provides [`ConnectedChannel`] which handles WebSocket I/O for chat frames.
//! This is a thin layer that only encodes, decodes and moves frames; deciding
//! when a frame may be sent stays in the Sans-IO app.
//!
//! Both directions are unbounded queues and the bridge task reads and writes
//! concurrently, so a slow reader on one side never stalls the other.

use std::time::Duration;

use futures::{SinkExt, StreamExt};
use huddle_proto::{Content, Message, codec};
use thiserror::Error;
use tokio::{net::TcpStream, sync::mpsc};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, tungstenite::Message as WsMessage};
use url::Url;

/// Transport errors.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Handshake or TCP connect failed.
    #[error("connection failed: {0}")]
    Connection(String),

    /// Handshake did not complete within the connect timeout.
    #[error("connection timed out after {0:?}")]
    Timeout(Duration),
}

/// Something that arrived on the channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelEvent {
    /// A well-formed message, in transport order.
    Message(Message),
    /// A frame that could not be decoded. The channel stays open.
    Malformed(String),
    /// Channel closed by the peer, the network or a local stop. Always the
    /// last event.
    Closed,
}

/// Handle to an open WebSocket.
///
/// Frames are sent and received via the channels; an internal task handles
/// the WebSocket I/O.
pub struct ConnectedChannel {
    /// Send frames to the server.
    pub to_server: mpsc::UnboundedSender<Content>,
    /// Receive events from the server.
    pub from_server: mpsc::UnboundedReceiver<ChannelEvent>,
    /// Abort handle to stop the connection task.
    abort_handle: tokio::task::AbortHandle,
}

impl ConnectedChannel {
    /// Stop the connection.
    pub fn stop(&self) {
        self.abort_handle.abort();
    }
}

impl std::fmt::Debug for ConnectedChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectedChannel")
            .field("finished", &self.abort_handle.is_finished())
            .finish_non_exhaustive()
    }
}

/// Open a WebSocket to `url`.
///
/// The handshake is bounded by `connect_timeout`. The URL is not logged
/// because it carries the bearer token.
pub async fn connect(url: &Url, connect_timeout: Duration) -> Result<ConnectedChannel, TransportError> {
    let handshake = tokio_tungstenite::connect_async(url.as_str());
    let (stream, _response) = tokio::time::timeout(connect_timeout, handshake)
        .await
        .map_err(|_| TransportError::Timeout(connect_timeout))?
        .map_err(|e| TransportError::Connection(e.to_string()))?;

    tracing::info!(host = url.host_str().unwrap_or_default(), path = url.path(), "channel open");

    let (to_server_tx, to_server_rx) = mpsc::unbounded_channel::<Content>();
    let (from_server_tx, from_server_rx) = mpsc::unbounded_channel::<ChannelEvent>();

    let handle = tokio::spawn(run_connection(stream, to_server_rx, from_server_tx));

    Ok(ConnectedChannel {
        to_server: to_server_tx,
        from_server: from_server_rx,
        abort_handle: handle.abort_handle(),
    })
}

/// Run the connection, bridging between channels and the WebSocket.
///
/// Reading and writing are separate futures polled together, so inbound
/// frames keep flowing while a write waits on the socket. Ends when either
/// side goes away, then reports [`ChannelEvent::Closed`].
async fn run_connection(
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
    mut to_server: mpsc::UnboundedReceiver<Content>,
    from_server: mpsc::UnboundedSender<ChannelEvent>,
) {
    let (mut sink, mut source) = stream.split();

    let writer = async {
        while let Some(content) = to_server.recv().await {
            match codec::encode_outgoing(&content) {
                Ok(text) => {
                    if let Err(e) = sink.send(WsMessage::Text(text)).await {
                        tracing::warn!(error = %e, "channel write failed");
                        return;
                    }
                },
                Err(e) => tracing::warn!(error = %e, "dropping unencodable frame"),
            }
        }
        // Owner dropped its sender: close politely
        let _ = sink.send(WsMessage::Close(None)).await;
    };

    let reader = async {
        while let Some(incoming) = source.next().await {
            let event = match incoming {
                Ok(WsMessage::Text(text)) => match codec::decode_inbound(&text) {
                    Ok(message) => ChannelEvent::Message(message),
                    Err(e) => ChannelEvent::Malformed(e.to_string()),
                },
                Ok(WsMessage::Binary(_)) => {
                    ChannelEvent::Malformed("unexpected binary frame".to_owned())
                },
                // Ping replies are queued by tungstenite and flushed on the next write
                Ok(WsMessage::Ping(_) | WsMessage::Pong(_) | WsMessage::Frame(_)) => continue,
                Ok(WsMessage::Close(frame)) => {
                    tracing::info!(?frame, "channel closed by server");
                    return;
                },
                Err(e) => {
                    tracing::warn!(error = %e, "channel read failed");
                    return;
                },
            };
            if from_server.send(event).is_err() {
                return;
            }
        }
    };

    tokio::select! {
        () = writer => {},
        () = reader => {},
    }

    let _ = from_server.send(ChannelEvent::Closed);
}
