//! Client
//!
//! Networked side of Huddle: the REST API client, the live chat channel and
//! credential storage. Protocol decisions (what to fetch, when a send is
//! allowed, how results merge) stay in the Sans-IO `huddle-app` crate; this
//! crate only moves bytes and reports outcomes.
//!
//! # Components
//!
//! - [`ApiClient`]: bearer-authenticated REST calls (identity, history,
//!   upload, groups, tasks, notifications, activity)
//! - [`LiveChannel`]: owned duplex channel for one chat view
//! - [`transport`]: WebSocket frame transport behind [`LiveChannel`]
//! - [`ClientConfig`]: backend address and timeouts
//! - [`CredentialStore`]: persisted bearer token

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod api;
mod channel;
mod config;
mod credential;
pub mod transport;

pub use api::{ApiClient, ApiError};
pub use channel::{ChannelError, ChannelState, LiveChannel, PendingOpen};
pub use config::{ClientConfig, ConfigError, DEFAULT_SERVER};
pub use credential::{
    Credential, CredentialError, CredentialStore, FileCredentialStore, MemoryCredentialStore,
};
pub use huddle_proto::{Content, GroupId, Message, SessionIdentity, StoredFile};
pub use transport::{ChannelEvent, ConnectedChannel, TransportError};
