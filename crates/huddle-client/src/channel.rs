//! Owned live channel for one chat view.
//!
//! A [`LiveChannel`] belongs to exactly one view and is never shared. It
//! holds at most one connection; opening the address it is already open (or
//! opening) to is a no-op, and opening a different address closes the old
//! connection first.
//!
//! # Invariants
//!
//! - Sends are accepted only in [`ChannelState::Open`].
//! - [`ChannelState::Closed`] is terminal for a connection; only a new
//!   [`LiveChannel::open`] leaves it.
//! - The stored connection always matches the stored address.

use std::{fmt, time::Duration};

use huddle_proto::Content;
use thiserror::Error;
use url::Url;

use crate::transport::{self, ChannelEvent, ConnectedChannel, TransportError};

/// Channel state as seen by the owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelState {
    /// Handshake in flight.
    Connecting,
    /// Frames may be sent.
    Open,
    /// Nothing connected.
    Closed,
}

impl fmt::Display for ChannelState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Connecting => "connecting",
            Self::Open => "open",
            Self::Closed => "closed",
        })
    }
}

/// Live channel errors.
#[derive(Debug, Error)]
pub enum ChannelError {
    /// Send attempted outside [`ChannelState::Open`].
    #[error("channel is {state}, not open")]
    NotOpen {
        /// State at the time of the send.
        state: ChannelState,
    },

    /// Connection task went away while sending.
    #[error("channel disconnected")]
    Disconnected,
}

/// Handshake started by [`LiveChannel::begin_open`].
///
/// Owns everything it needs, so it can run on a spawned task while the owner
/// keeps servicing input. Hand the result back with
/// [`LiveChannel::complete_open`].
#[derive(Debug, Clone)]
pub struct PendingOpen {
    url: Url,
    connect_timeout: Duration,
}

impl PendingOpen {
    /// Address being connected.
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Perform the handshake.
    pub async fn connect(self) -> (Url, Result<ConnectedChannel, TransportError>) {
        let result = transport::connect(&self.url, self.connect_timeout).await;
        (self.url, result)
    }
}

/// Owned duplex channel.
#[derive(Debug)]
pub struct LiveChannel {
    state: ChannelState,
    url: Option<Url>,
    connection: Option<ConnectedChannel>,
    connect_timeout: Duration,
}

impl LiveChannel {
    /// Closed channel with the given handshake timeout.
    pub fn new(connect_timeout: Duration) -> Self {
        Self { state: ChannelState::Closed, url: None, connection: None, connect_timeout }
    }

    /// Current state.
    pub fn state(&self) -> ChannelState {
        self.state
    }

    /// Address of the current or in-flight connection.
    pub fn url(&self) -> Option<&Url> {
        self.url.as_ref()
    }

    /// Start opening `url`.
    ///
    /// Returns `None` when the channel is already open or connecting to the
    /// same address. Otherwise closes any existing connection, moves to
    /// [`ChannelState::Connecting`] and returns the handshake to run.
    pub fn begin_open(&mut self, url: Url) -> Option<PendingOpen> {
        if self.state != ChannelState::Closed && self.url.as_ref() == Some(&url) {
            tracing::debug!(state = %self.state, "reusing live channel");
            return None;
        }

        self.close();
        self.state = ChannelState::Connecting;
        self.url = Some(url.clone());
        Some(PendingOpen { url, connect_timeout: self.connect_timeout })
    }

    /// Install the result of a handshake.
    ///
    /// Returns `Ok(false)` and stops the connection when it no longer matches
    /// the address this channel is connecting to (the owner moved on while
    /// it was in flight).
    pub fn complete_open(
        &mut self,
        url: &Url,
        result: Result<ConnectedChannel, TransportError>,
    ) -> Result<bool, TransportError> {
        let current = self.state == ChannelState::Connecting && self.url.as_ref() == Some(url);
        if !current {
            if let Ok(connection) = result {
                connection.stop();
            }
            tracing::debug!("discarding stale channel handshake");
            return Ok(false);
        }

        match result {
            Ok(connection) => {
                self.connection = Some(connection);
                self.state = ChannelState::Open;
                Ok(true)
            },
            Err(e) => {
                self.state = ChannelState::Closed;
                Err(e)
            },
        }
    }

    /// Open `url` and wait for the handshake.
    ///
    /// Returns `Ok(false)` when an existing connection was reused.
    pub async fn open(&mut self, url: Url) -> Result<bool, TransportError> {
        let Some(pending) = self.begin_open(url) else {
            return Ok(false);
        };
        let (url, result) = pending.connect().await;
        self.complete_open(&url, result)
    }

    /// Queue one frame for the connection task.
    ///
    /// Never waits: the outgoing queue is unbounded, so callers that also
    /// drain [`LiveChannel::next_event`] cannot deadlock against the socket.
    pub fn send(&mut self, content: Content) -> Result<(), ChannelError> {
        let connection = match (&self.connection, self.state) {
            (Some(connection), ChannelState::Open) => connection,
            (_, state) => return Err(ChannelError::NotOpen { state }),
        };

        if connection.to_server.send(content).is_err() {
            self.close();
            return Err(ChannelError::Disconnected);
        }
        Ok(())
    }

    /// Close the channel. Idempotent.
    pub fn close(&mut self) {
        if let Some(connection) = self.connection.take() {
            connection.stop();
            tracing::info!("live channel closed");
        }
        self.state = ChannelState::Closed;
    }

    /// Wait for the next event.
    ///
    /// Returns `None` when there is no connection, so callers can poll this
    /// unconditionally inside a select. [`ChannelEvent::Closed`] is delivered
    /// once per connection, and the channel is then [`ChannelState::Closed`].
    pub async fn next_event(&mut self) -> Option<ChannelEvent> {
        let connection = self.connection.as_mut()?;
        let event = connection.from_server.recv().await.unwrap_or(ChannelEvent::Closed);
        if event == ChannelEvent::Closed {
            self.close();
        }
        Some(event)
    }
}

impl Drop for LiveChannel {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(group: u64) -> Url {
        Url::parse(&format!("ws://127.0.0.1:9/chat/ws/{group}?token=t")).unwrap()
    }

    #[test]
    fn starts_closed() {
        let channel = LiveChannel::new(Duration::from_secs(1));
        assert_eq!(channel.state(), ChannelState::Closed);
        assert!(channel.url().is_none());
    }

    #[test]
    fn second_open_to_same_url_is_reused() {
        let mut channel = LiveChannel::new(Duration::from_secs(1));
        assert!(channel.begin_open(url(1)).is_some());
        assert_eq!(channel.state(), ChannelState::Connecting);
        assert!(channel.begin_open(url(1)).is_none());
    }

    #[test]
    fn open_to_other_url_restarts() {
        let mut channel = LiveChannel::new(Duration::from_secs(1));
        channel.begin_open(url(1));
        let pending = channel.begin_open(url(2)).unwrap();
        assert_eq!(pending.url(), &url(2));
        assert_eq!(channel.url(), Some(&url(2)));
    }

    #[test]
    fn stale_failure_is_ignored() {
        let mut channel = LiveChannel::new(Duration::from_secs(1));
        channel.begin_open(url(1));
        channel.begin_open(url(2));

        let stale = channel.complete_open(&url(1), Err(TransportError::Connection("x".into())));
        assert!(matches!(stale, Ok(false)));
        assert_eq!(channel.state(), ChannelState::Connecting);
    }

    #[test]
    fn failed_handshake_closes() {
        let mut channel = LiveChannel::new(Duration::from_secs(1));
        channel.begin_open(url(1));
        let result = channel.complete_open(&url(1), Err(TransportError::Connection("x".into())));
        assert!(result.is_err());
        assert_eq!(channel.state(), ChannelState::Closed);
    }

    #[test]
    fn send_requires_open() {
        let mut channel = LiveChannel::new(Duration::from_secs(1));
        let err = channel.send(Content::text("hi")).unwrap_err();
        assert!(matches!(err, ChannelError::NotOpen { state: ChannelState::Closed }));

        channel.begin_open(url(1));
        let err = channel.send(Content::text("hi")).unwrap_err();
        assert!(matches!(err, ChannelError::NotOpen { state: ChannelState::Connecting }));
    }

    #[tokio::test]
    async fn next_event_without_connection_is_none() {
        let mut channel = LiveChannel::new(Duration::from_secs(1));
        assert!(channel.next_event().await.is_none());
    }
}
