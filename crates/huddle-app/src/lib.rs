//! Application layer for Huddle
//!
//! Pure state machines and a generic runtime for the chat view, enabling
//! deterministic testing with the same code that runs in the terminal client.
//!
//! # Components
//!
//! - [`App`]: chat view state machine (group selection, message stream,
//!   connection state, send gating)
//! - [`ChatState`]: ordered message sequence of the open group
//! - [`render`]: presentation reducer from messages to a [`RenderPlan`]
//! - [`Driver`]: trait for platform-specific I/O
//! - [`Runtime`]: generic orchestration loop using a Driver

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod action;
mod app;
mod driver;
mod error;
mod event;
mod input;
pub mod render;
mod runtime;
mod state;

pub use action::AppAction;
pub use app::{App, AppConfig};
pub use driver::Driver;
pub use error::SendError;
pub use event::AppEvent;
pub use input::KeyInput;
pub use render::{Alignment, DayHeader, RenderBody, RenderContext, RenderEntry, RenderPlan};
pub use runtime::Runtime;
pub use state::{ChatState, ConnectionState, HistoryState};
