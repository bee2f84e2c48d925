//! Terminal client for Huddle
//!
//! A thin shell over [`huddle_app::Driver`] that provides terminal-specific
//! I/O. All orchestration logic lives in the generic [`huddle_app::Runtime`].
//!
//! This crate handles terminal rendering, line editing, slash commands and
//! the one-shot CLI subcommands (login, group management).

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod cli;
pub mod commands;
pub mod input;
pub mod network;
pub mod terminal;
pub mod ui;

pub use huddle_app::{App, AppAction, AppConfig, AppEvent, Driver, KeyInput, Runtime};
pub use input::InputState;
pub use network::{Incoming, Network};
pub use terminal::{TerminalDriver, TerminalError};
