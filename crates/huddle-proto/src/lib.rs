//! Huddle wire protocol
//!
//! Plain data types exchanged with the Huddle backend over REST and over the
//! live chat channel, plus the JSON frame codec used on that channel.
//!
//! No I/O lives here. Both the Sans-IO application layer and the networked
//! client depend on these types so that what the server sends is decoded in
//! exactly one place.
//!
//! # Components
//!
//! - [`Message`]: one chat message, either text or a stored file
//! - [`Content`]: message body, also the outgoing frame payload
//! - [`SessionIdentity`]: who the bearer credential belongs to
//! - [`Group`]: a named set of users sharing one chat history
//! - [`Task`], [`Notification`], [`ActivityEntry`]: task tracking records
//! - [`codec`]: one JSON object per channel frame

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod codec;
pub mod errors;
mod group;
mod message;
mod session;
mod task;

pub use errors::ProtocolError;
pub use group::{CreateGroupRequest, Group, GroupId};
pub use message::{Content, Message, StoredFile, Timestamp};
pub use session::{
    LoginRequest, LoginResponse, Role, SessionIdentity, SignupRequest, SignupResponse, UserId,
};
pub use task::{
    ActivityEntry, NewTask, Notification, NotificationKind, Priority, Task, TaskId, TaskStatus,
    TaskUpdate,
};
