//! Driver trait for abstracting I/O operations.
//!
//! The [`Driver`] trait decouples the application runtime from specific I/O
//! implementations. Each frontend implements the trait to provide
//! platform-specific I/O, while the generic [`crate::Runtime`] handles all
//! orchestration.

use std::future::Future;

use crate::{App, AppAction};

/// Abstracts I/O operations for the application runtime.
///
/// Implementations provide platform-specific I/O while the generic
/// [`Runtime`](crate::Runtime) handles orchestration logic. This ensures
/// the same orchestration code runs in the terminal client and in tests.
///
/// # Completions
///
/// Effect actions ([`AppAction::LoadHistory`], [`AppAction::OpenChannel`],
/// [`AppAction::Upload`], ...) start work that finishes later. The driver
/// reports the outcome as an [`crate::AppEvent`] carrying the generation from
/// the action, fed to [`App::handle`] during a later [`Driver::poll`].
/// Recoverable failures (network errors, rejected sends) are reported the
/// same way; `Err` is reserved for failures that should end the runtime.
///
/// # Implementations
///
/// - **TUI**: crossterm for terminal events, reqwest and tokio-tungstenite
///   for the network
/// - **Tests**: scripted in-memory completions
pub trait Driver: Send {
    /// Platform-specific error type.
    type Error: std::error::Error + Send + 'static;

    /// Wait for the next batch of input or completions and apply it to `app`.
    ///
    /// Returns the actions produced; may be empty.
    fn poll(
        &mut self,
        app: &mut App,
    ) -> impl Future<Output = Result<Vec<AppAction>, Self::Error>> + Send;

    /// Start an effect action.
    ///
    /// Never called with [`AppAction::Render`] or [`AppAction::Quit`].
    fn execute(&mut self, action: AppAction) -> impl Future<Output = Result<(), Self::Error>> + Send;

    /// Render the application state.
    fn render(&mut self, app: &App) -> Result<(), Self::Error>;

    /// Stop background work and release resources.
    fn stop(&mut self);
}
