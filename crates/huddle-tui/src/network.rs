//! Network effects for the chat view.
//!
//! [`Network`] executes the effect actions produced by the app (REST calls,
//! live channel, uploads, credential removal) and turns their outcomes into
//! [`Incoming`] values that [`Network::apply`] feeds back into the app.
//!
//! REST calls and handshakes run on spawned tasks and report through an
//! internal queue, so the caller keeps servicing input while they are in
//! flight. The live channel itself is owned here and only touched from the
//! caller's task.
//!
//! # Invariants
//!
//! - Every completion carries the generation of the action that started it;
//!   the app discards stale ones.
//! - Channel events are tagged with the generation of the latest
//!   [`AppAction::OpenChannel`].
//! - At most one live channel exists at a time.

use std::sync::Arc;

use huddle_app::{App, AppAction, AppEvent};
use huddle_client::{
    ApiClient, ApiError, ChannelError, ChannelEvent, ChannelState, ClientConfig, ConnectedChannel,
    CredentialStore, LiveChannel, TransportError,
};
use huddle_proto::GroupId;
use tokio::{sync::mpsc, task::JoinSet};
use url::Url;

/// Something that finished or arrived since the last poll.
#[derive(Debug)]
pub enum Incoming {
    /// Completion of a spawned REST call, or a locally detected failure.
    Event(AppEvent),
    /// Event on the live channel.
    Channel(ChannelEvent),
    /// Live channel handshake finished.
    Handshake {
        /// Address that was connected.
        url: Url,
        /// Handshake outcome.
        result: Result<ConnectedChannel, TransportError>,
    },
}

/// Executes effect actions against the backend.
pub struct Network {
    api: ApiClient,
    live: LiveChannel,
    credentials: Arc<dyn CredentialStore>,
    channel_generation: u64,
    completions_tx: mpsc::UnboundedSender<Incoming>,
    completions_rx: mpsc::UnboundedReceiver<Incoming>,
    tasks: JoinSet<()>,
}

impl Network {
    /// Create an idle network layer. No request is made until an action is
    /// executed.
    pub fn new(api: ApiClient, credentials: Arc<dyn CredentialStore>) -> Self {
        let live = LiveChannel::new(api.config().connect_timeout);
        let (completions_tx, completions_rx) = mpsc::unbounded_channel();
        Self {
            api,
            live,
            credentials,
            channel_generation: 0,
            completions_tx,
            completions_rx,
            tasks: JoinSet::new(),
        }
    }

    /// Backend configuration.
    pub fn config(&self) -> &ClientConfig {
        self.api.config()
    }

    /// State of the live channel.
    pub fn channel_state(&self) -> ChannelState {
        self.live.state()
    }

    /// Start one effect action.
    ///
    /// Never waits on the network: REST calls and handshakes are spawned and
    /// frames are queued. Failures never surface here; they arrive later as [`Incoming`].
    /// [`AppAction::Render`] and [`AppAction::Quit`] are ignored.
    pub fn execute(&mut self, action: AppAction) {
        match action {
            AppAction::Render | AppAction::Quit => {},
            AppAction::ResolveIdentity => {
                let api = self.api.clone();
                self.spawn(async move {
                    match api.me().await {
                        Ok(identity) => AppEvent::IdentityResolved(identity),
                        Err(ApiError::Unauthorized) => AppEvent::SessionRejected,
                        Err(e) => AppEvent::Error { message: format!("cannot resolve session: {e}") },
                    }
                });
            },
            AppAction::LoadGroups => {
                let api = self.api.clone();
                self.spawn(async move {
                    match api.groups().await {
                        Ok(groups) => AppEvent::GroupsLoaded(groups),
                        Err(e) => AppEvent::GroupsFailed { reason: e.to_string() },
                    }
                });
            },
            AppAction::LoadHistory { generation, group_id } => {
                let api = self.api.clone();
                self.spawn(async move {
                    match api.history(group_id).await {
                        Ok(messages) => AppEvent::HistoryLoaded { generation, messages },
                        Err(e) => AppEvent::HistoryFailed { generation, reason: e.to_string() },
                    }
                });
            },
            AppAction::OpenChannel { generation, group_id } => {
                self.open_channel(generation, group_id);
            },
            AppAction::CloseChannel => self.live.close(),
            AppAction::SendFrame { generation, content } => {
                if generation != self.channel_generation {
                    tracing::debug!(generation, "dropping frame for a closed view");
                    return;
                }
                if let Err(e) = self.live.send(content) {
                    tracing::warn!(error = %e, "frame not sent");
                    self.report(AppEvent::SendFailed { generation, reason: e.to_string() });
                    if matches!(e, ChannelError::Disconnected) {
                        // The connection is gone, so no Closed event will follow
                        self.report(AppEvent::ChannelClosed { generation });
                    }
                }
            },
            AppAction::Upload { generation, path } => {
                let api = self.api.clone();
                self.spawn(async move {
                    match api.upload(&path).await {
                        Ok(file) => AppEvent::UploadCompleted { generation, file },
                        Err(e) => AppEvent::UploadFailed { generation, reason: e.to_string() },
                    }
                });
            },
            AppAction::ClearCredential => {
                if let Err(e) = self.credentials.clear() {
                    tracing::warn!(error = %e, "could not clear stored credential");
                }
            },
        }
    }

    /// Wait for the next completion or channel event.
    ///
    /// Cancel-safe: nothing is lost when the future is dropped before it
    /// resolves.
    pub async fn next(&mut self) -> Incoming {
        loop {
            tokio::select! {
                Some(incoming) = self.completions_rx.recv() => return incoming,
                Some(event) = self.live.next_event() => return Incoming::Channel(event),
                Some(joined) = self.tasks.join_next() => {
                    if let Err(e) = joined
                        && e.is_panic()
                    {
                        tracing::error!(error = %e, "network task panicked");
                    }
                },
                else => std::future::pending::<()>().await,
            }
        }
    }

    /// Feed an [`Incoming`] into the app.
    pub fn apply(&mut self, incoming: Incoming, app: &mut App) -> Vec<AppAction> {
        let generation = self.channel_generation;
        match incoming {
            Incoming::Event(event) => app.handle(event),
            Incoming::Channel(ChannelEvent::Message(message)) => {
                app.handle(AppEvent::FrameReceived { generation, message })
            },
            Incoming::Channel(ChannelEvent::Malformed(reason)) => {
                tracing::warn!(%reason, "malformed frame on live channel");
                app.handle(AppEvent::FrameMalformed { generation, reason })
            },
            Incoming::Channel(ChannelEvent::Closed) => {
                tracing::info!(generation, "live channel closed");
                app.handle(AppEvent::ChannelClosed { generation })
            },
            Incoming::Handshake { url, result } => match self.live.complete_open(&url, result) {
                Ok(true) => app.handle(AppEvent::ChannelOpened { generation }),
                Ok(false) => vec![],
                Err(e) => {
                    tracing::warn!(error = %e, "live channel handshake failed");
                    let actions = app.handle(AppEvent::ChannelClosed { generation });
                    app.set_status(format!("Error: cannot connect: {e}"));
                    actions
                },
            },
        }
    }

    /// Abort in-flight work and close the live channel.
    pub fn stop(&mut self) {
        self.tasks.abort_all();
        self.live.close();
    }

    fn open_channel(&mut self, generation: u64, group_id: GroupId) {
        self.channel_generation = generation;

        let url = match self.config().ws_url(group_id, self.api.credential()) {
            Ok(url) => url,
            Err(e) => {
                self.channel_failed(generation, &e);
                return;
            },
        };

        match self.live.begin_open(url) {
            Some(pending) => {
                let tx = self.completions_tx.clone();
                self.tasks.spawn(async move {
                    let (url, result) = pending.connect().await;
                    let _ = tx.send(Incoming::Handshake { url, result });
                });
            },
            None if self.live.state() == ChannelState::Open => {
                self.report(AppEvent::ChannelOpened { generation });
            },
            // Handshake to the same address already in flight
            None => {},
        }
    }

    /// The channel cannot be opened at all: close the view's channel so a
    /// `/reconnect` is offered, then explain why.
    fn channel_failed(&self, generation: u64, reason: &dyn std::fmt::Display) {
        tracing::warn!(%reason, "cannot build live channel address");
        self.report(AppEvent::ChannelClosed { generation });
        self.report(AppEvent::Error { message: format!("cannot connect: {reason}") });
    }

    fn spawn<F>(&mut self, work: F)
    where
        F: Future<Output = AppEvent> + Send + 'static,
    {
        let tx = self.completions_tx.clone();
        self.tasks.spawn(async move {
            let _ = tx.send(Incoming::Event(work.await));
        });
    }

    fn report(&self, event: AppEvent) {
        let _ = self.completions_tx.send(Incoming::Event(event));
    }
}

impl Drop for Network {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use huddle_app::{AppConfig, ConnectionState};
    use huddle_client::{Credential, MemoryCredentialStore};

    use super::*;

    fn network() -> Network {
        let config = ClientConfig::new("http://127.0.0.1:9").unwrap();
        let api = ApiClient::new(config, Credential::new("tok")).unwrap();
        Network::new(api, Arc::new(MemoryCredentialStore::default()))
    }

    #[tokio::test]
    async fn unusable_channel_address_closes_the_view() {
        let mut network = network();
        let mut app = App::new(AppConfig::default());
        let _ = app.open_group(1);
        assert_eq!(app.connection_state(), Some(ConnectionState::Connecting));

        network.channel_failed(app.generation(), &"relative URL without a base");
        for _ in 0..2 {
            let incoming = network.next().await;
            let _ = network.apply(incoming, &mut app);
        }

        assert_eq!(app.connection_state(), Some(ConnectionState::Closed));
        let status = app.status_message().unwrap();
        assert!(status.contains("cannot connect: relative URL without a base"), "{status}");
        assert!(app.send_text("hi").is_err());
    }

    #[tokio::test]
    async fn frames_for_a_replaced_view_are_dropped() {
        let mut network = network();
        let mut app = App::new(AppConfig::default());
        let _ = app.open_group(1);

        // No OpenChannel executed yet, so the network is still on generation 0
        network.execute(AppAction::SendFrame {
            generation: app.generation(),
            content: huddle_proto::Content::text("hi"),
        });
        assert!(network.completions_rx.try_recv().is_err());
    }
}

