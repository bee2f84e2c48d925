//! Generic runtime for application orchestration.
//!
//! The Runtime drives the application event loop, coordinating between:
//! - [`App`]: chat view state machine
//! - [`Driver`]: platform-specific I/O

use huddle_proto::GroupId;

use crate::{App, AppAction, Driver};

/// Generic runtime that orchestrates App and Driver.
pub struct Runtime<D: Driver> {
    driver: D,
    app: App,
}

impl<D: Driver> Runtime<D> {
    /// Create a new runtime with the given driver and app.
    pub fn new(driver: D, app: App) -> Self {
        Self { driver, app }
    }

    /// Open `group_id` and run until the app quits.
    ///
    /// 1. Opens the group (history, channel, identity) and loads the group list
    /// 2. Polls the driver for input and completions
    /// 3. Executes the resulting actions
    pub async fn run(&mut self, group_id: GroupId) -> Result<(), D::Error> {
        self.driver.render(&self.app)?;

        let mut initial = self.app.open_group(group_id);
        initial.extend(self.app.refresh_groups());

        if !self.process_actions(initial).await? {
            loop {
                let actions = self.driver.poll(&mut self.app).await?;
                if self.process_actions(actions).await? {
                    break;
                }
            }
        }

        self.driver.stop();
        Ok(())
    }

    /// Execute actions in order.
    ///
    /// Returns `true` if the app should quit.
    async fn process_actions(&mut self, actions: Vec<AppAction>) -> Result<bool, D::Error> {
        for action in actions {
            match action {
                AppAction::Render => self.driver.render(&self.app)?,
                AppAction::Quit => return Ok(true),
                AppAction::ResolveIdentity
                | AppAction::LoadGroups
                | AppAction::LoadHistory { .. }
                | AppAction::OpenChannel { .. }
                | AppAction::CloseChannel
                | AppAction::SendFrame { .. }
                | AppAction::Upload { .. }
                | AppAction::ClearCredential => self.driver.execute(action).await?,
            }
        }
        Ok(false)
    }

    /// Get a reference to the App
    pub fn app(&self) -> &App {
        &self.app
    }

    /// Get a mutable reference to the App
    pub fn app_mut(&mut self) -> &mut App {
        &mut self.app
    }

    /// Get a reference to the Driver
    pub fn driver(&self) -> &D {
        &self.driver
    }
}
