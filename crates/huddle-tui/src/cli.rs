//! Command-line interface.
//!
//! `huddle chat <group>` starts the terminal client; the other subcommands
//! (account, groups, tasks, notifications, activity) are one-shot calls that
//! print a short result and exit. Output goes to the writer passed in, never
//! straight to stdout.

use std::{
    io::{self, BufRead, Write},
    path::PathBuf,
    sync::Arc,
    time::Duration,
};

use chrono::{FixedOffset, NaiveDate};
use clap::{Parser, Subcommand};
use huddle_app::{App, AppConfig, Runtime};
use huddle_client::{
    ApiClient, ApiError, ClientConfig, ConfigError, Credential, CredentialError, CredentialStore,
    DEFAULT_SERVER, FileCredentialStore,
};
use huddle_proto::{
    GroupId, NewTask, Priority, Role, SessionIdentity, SignupRequest, TaskId, TaskStatus,
    TaskUpdate, UserId,
};
use thiserror::Error;

use crate::{Network, TerminalDriver, TerminalError};

/// Huddle terminal client
#[derive(Parser, Debug)]
#[command(name = "huddle")]
#[command(about = "Terminal client for Huddle group chat")]
#[command(version)]
pub struct Args {
    /// Backend base URL
    #[arg(long, env = "HUDDLE_SERVER", default_value = DEFAULT_SERVER, global = true)]
    pub server: String,

    /// Credential file (defaults to the user config directory)
    #[arg(long, env = "HUDDLE_TOKEN_FILE", global = true)]
    pub token_file: Option<PathBuf>,

    /// REST request timeout in seconds
    #[arg(long, default_value_t = 30, global = true)]
    pub timeout_secs: u64,

    /// Connect timeout in seconds, for REST and the live channel
    #[arg(long, default_value_t = 10, global = true)]
    pub connect_timeout_secs: u64,

    /// Display offset from UTC in minutes, for day separators and times
    #[arg(long, default_value_t = 0, allow_negative_numbers = true, global = true)]
    pub utc_offset_minutes: i32,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", global = true)]
    pub log_level: String,

    /// Log file; the terminal itself is used by the UI
    #[arg(long, default_value = "huddle.log", global = true)]
    pub log_file: PathBuf,

    /// What to do
    #[command(subcommand)]
    pub command: CliCommand,
}

/// Subcommands.
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum CliCommand {
    /// Log in and store the session token
    Login {
        /// Account email
        #[arg(long)]
        email: String,
        /// Password; read from stdin when omitted
        #[arg(long, env = "HUDDLE_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },
    /// Create an account; log in afterwards
    Signup {
        /// Display name
        #[arg(long)]
        name: String,
        /// Account email
        #[arg(long)]
        email: String,
        /// Password; read from stdin when omitted
        #[arg(long, env = "HUDDLE_PASSWORD", hide_env_values = true)]
        password: Option<String>,
        /// Account role: user or admin
        #[arg(long, default_value = "user")]
        role: Role,
    },
    /// Forget the stored session token
    Logout,
    /// Show the signed-in user
    Whoami,
    /// List groups visible to the signed-in user
    Groups,
    /// Create a group (admin only)
    GroupCreate {
        /// Group name
        name: String,
        /// Initial member ids, comma separated
        #[arg(long = "members", value_delimiter = ',')]
        members: Vec<UserId>,
    },
    /// Delete a group (admin only)
    GroupDelete {
        /// Group to delete
        group_id: GroupId,
    },
    /// List tasks (admins see every task)
    Tasks,
    /// Create a task
    TaskCreate {
        /// Task title
        title: String,
        /// Optional fields
        #[command(flatten)]
        fields: TaskFields,
    },
    /// Change fields of a task
    TaskUpdate {
        /// Task to change
        task_id: TaskId,
        /// New title
        #[arg(long)]
        title: Option<String>,
        /// Fields to change
        #[command(flatten)]
        fields: TaskFields,
    },
    /// Delete a task
    TaskDelete {
        /// Task to delete
        task_id: TaskId,
    },
    /// Show due-date and priority reminders
    Notifications,
    /// Show the history of one task
    Activity {
        /// Task to inspect
        task_id: TaskId,
    },
    /// Open a group in the terminal client
    Chat {
        /// Group to open
        group_id: GroupId,
    },
}

/// Task fields shared by `task-create` and `task-update`.
#[derive(clap::Args, Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskFields {
    /// Description
    #[arg(long)]
    pub description: Option<String>,
    /// Priority: low, medium or high (replaced by the server when a due date is set)
    #[arg(long)]
    pub priority: Option<Priority>,
    /// Category
    #[arg(long)]
    pub category: Option<String>,
    /// Due date, YYYY-MM-DD
    #[arg(long)]
    pub due: Option<NaiveDate>,
    /// Status: pending, in_progress or completed
    #[arg(long)]
    pub status: Option<TaskStatus>,
    /// Assignee user id (admin only)
    #[arg(long)]
    pub assign_to: Option<UserId>,
}

impl TaskFields {
    /// New task with these fields over the defaults.
    pub fn new_task(&self, title: &str) -> NewTask {
        let mut task = NewTask::titled(title);
        if let Some(description) = &self.description {
            task.description.clone_from(description);
        }
        if let Some(priority) = self.priority {
            task.priority = priority;
        }
        if let Some(category) = &self.category {
            task.category.clone_from(category);
        }
        if let Some(status) = self.status {
            task.status = status;
        }
        task.due_date = self.due;
        task.assigned_to = self.assign_to;
        task
    }

    /// Partial update touching only the given fields.
    pub fn update(&self, title: Option<String>) -> TaskUpdate {
        TaskUpdate {
            title,
            description: self.description.clone(),
            priority: self.priority,
            category: self.category.clone(),
            due_date: self.due,
            status: self.status,
            assigned_to: self.assign_to,
        }
    }
}

/// CLI errors.
#[derive(Debug, Error)]
pub enum CliError {
    /// Bad server URL.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Credential file problem.
    #[error(transparent)]
    Credential(#[from] CredentialError),

    /// Backend call failed; names the attempted action.
    #[error("failed to {action}: {source}")]
    Api {
        /// Attempted action, e.g. "create group".
        action: &'static str,
        /// Underlying error.
        source: ApiError,
    },

    /// No stored credential.
    #[error("not logged in; run `huddle login` first")]
    NotLoggedIn,

    /// Admin-only command attempted by a regular user.
    #[error("only admins can {0}")]
    AdminRequired(&'static str),

    /// Offset outside +-24h.
    #[error("invalid UTC offset: {0} minutes")]
    InvalidOffset(i32),

    /// Group name is empty.
    #[error("group name must not be empty")]
    EmptyGroupName,

    /// Task title is empty.
    #[error("task title must not be empty")]
    EmptyTaskTitle,

    /// `task-update` without any field to change.
    #[error("nothing to update; pass at least one field")]
    NothingToUpdate,

    /// Terminal client failed.
    #[error(transparent)]
    Terminal(#[from] TerminalError),

    /// Reading input or writing output failed.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl Args {
    /// Backend configuration from the flags.
    pub fn client_config(&self) -> Result<ClientConfig, ConfigError> {
        Ok(ClientConfig::new(&self.server)?.with_timeouts(
            Duration::from_secs(self.timeout_secs),
            Duration::from_secs(self.connect_timeout_secs),
        ))
    }

    /// Display configuration from the flags.
    pub fn app_config(&self) -> Result<AppConfig, CliError> {
        let offset = self
            .utc_offset_minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .ok_or(CliError::InvalidOffset(self.utc_offset_minutes))?;
        Ok(AppConfig { display_offset: offset })
    }

    /// Credential store at `--token-file` or the default location.
    pub fn credential_store(&self) -> Result<FileCredentialStore, CredentialError> {
        match &self.token_file {
            Some(path) => Ok(FileCredentialStore::new(path)),
            None => FileCredentialStore::in_config_dir(),
        }
    }
}

/// Run the selected subcommand.
pub async fn run(
    args: &Args,
    store: Arc<dyn CredentialStore>,
    input: &mut impl BufRead,
    out: &mut impl Write,
) -> Result<(), CliError> {
    let config = args.client_config()?;

    match &args.command {
        CliCommand::Login { email, password } => {
            let password = match password {
                Some(password) => password.clone(),
                None => prompt_password(input, out)?,
            };
            let response = ApiClient::login(&config, email, &password)
                .await
                .map_err(|source| CliError::Api { action: "log in", source })?;
            store.save(&Credential::new(response.access_token))?;
            writeln!(out, "Logged in as {}", role_name(response.role))?;
        },
        CliCommand::Signup { name, email, password, role } => {
            let password = match password {
                Some(password) => password.clone(),
                None => prompt_password(input, out)?,
            };
            let request =
                SignupRequest { name: name.clone(), email: email.clone(), password, role: *role };
            let created = ApiClient::signup(&config, &request)
                .await
                .map_err(|source| CliError::Api { action: "sign up", source })?;
            writeln!(out, "Account created as {}; run `huddle login --email {email}`", role_name(created.role))?;
        },
        CliCommand::Logout => {
            store.clear()?;
            writeln!(out, "Logged out")?;
        },
        CliCommand::Whoami => {
            let api = authorized(config, store.as_ref())?;
            let identity = session(&api, store.as_ref()).await?;
            writeln!(out, "user {} ({})", identity.user_id, role_name(identity.role))?;
        },
        CliCommand::Groups => {
            let api = authorized(config, store.as_ref())?;
            let groups = api.groups().await.map_err(|source| api_error("list groups", source, store.as_ref()))?;
            if groups.is_empty() {
                writeln!(out, "No groups")?;
            }
            for group in groups {
                writeln!(out, "{}\t{}", group.id, group.name)?;
            }
        },
        CliCommand::GroupCreate { name, members } => {
            if name.trim().is_empty() {
                return Err(CliError::EmptyGroupName);
            }
            let api = authorized(config, store.as_ref())?;
            require_admin(&api, store.as_ref(), "create groups").await?;
            let group = api
                .create_group(name.trim(), members)
                .await
                .map_err(|source| api_error("create group", source, store.as_ref()))?;
            writeln!(out, "Created group {} ({})", group.id, group.name)?;
        },
        CliCommand::GroupDelete { group_id } => {
            let api = authorized(config, store.as_ref())?;
            require_admin(&api, store.as_ref(), "delete groups").await?;
            api.delete_group(*group_id)
                .await
                .map_err(|source| api_error("delete group", source, store.as_ref()))?;
            writeln!(out, "Deleted group {group_id}")?;
        },
        CliCommand::Tasks => {
            let api = authorized(config, store.as_ref())?;
            let tasks = api.tasks().await.map_err(|source| api_error("list tasks", source, store.as_ref()))?;
            if tasks.is_empty() {
                writeln!(out, "No tasks")?;
            }
            for task in tasks {
                let due = task.due_date.map_or_else(|| "-".to_owned(), |date| date.to_string());
                writeln!(out, "{}\t{}\t{}\t{due}\t{}", task.id, task.status, task.priority, task.title)?;
            }
        },
        CliCommand::TaskCreate { title, fields } => {
            if title.trim().is_empty() {
                return Err(CliError::EmptyTaskTitle);
            }
            let api = authorized(config, store.as_ref())?;
            if fields.assign_to.is_some() {
                require_admin(&api, store.as_ref(), "assign tasks").await?;
            }
            let task = api
                .create_task(&fields.new_task(title.trim()))
                .await
                .map_err(|source| api_error("create task", source, store.as_ref()))?;
            writeln!(out, "Created task {} ({}, {} priority)", task.id, task.title, task.priority)?;
        },
        CliCommand::TaskUpdate { task_id, title, fields } => {
            let update = fields.update(title.as_ref().map(|title| title.trim().to_owned()));
            if update.is_empty() {
                return Err(CliError::NothingToUpdate);
            }
            if update.title.as_ref().is_some_and(String::is_empty) {
                return Err(CliError::EmptyTaskTitle);
            }
            let api = authorized(config, store.as_ref())?;
            if update.assigned_to.is_some() {
                require_admin(&api, store.as_ref(), "assign tasks").await?;
            }
            api.update_task(*task_id, &update)
                .await
                .map_err(|source| api_error("update task", source, store.as_ref()))?;
            writeln!(out, "Updated task {task_id}")?;
        },
        CliCommand::TaskDelete { task_id } => {
            let api = authorized(config, store.as_ref())?;
            api.delete_task(*task_id)
                .await
                .map_err(|source| api_error("delete task", source, store.as_ref()))?;
            writeln!(out, "Deleted task {task_id}")?;
        },
        CliCommand::Notifications => {
            let api = authorized(config, store.as_ref())?;
            let notifications = api
                .notifications()
                .await
                .map_err(|source| api_error("load notifications", source, store.as_ref()))?;
            if notifications.is_empty() {
                writeln!(out, "No notifications")?;
            }
            for note in notifications {
                write!(out, "[{}] {} ({}, {}", note.kind, note.title, note.priority, note.status)?;
                if let Some(due) = note.due_date {
                    write!(out, ", due {due}")?;
                }
                writeln!(out, ")")?;
            }
        },
        CliCommand::Activity { task_id } => {
            let offset = args.app_config()?.display_offset;
            let api = authorized(config, store.as_ref())?;
            let entries = api
                .activity(*task_id)
                .await
                .map_err(|source| api_error("load activity", source, store.as_ref()))?;
            if entries.is_empty() {
                writeln!(out, "No activity for task {task_id}")?;
            }
            for entry in entries {
                let when = entry.timestamp.instant().with_timezone(&offset).format("%Y-%m-%d %H:%M");
                writeln!(out, "{when}\tuser {}\t{}", entry.user_id, entry.message)?;
            }
        },
        CliCommand::Chat { group_id } => {
            let api = authorized(config, store.as_ref())?;
            let app = App::new(args.app_config()?);
            let driver = TerminalDriver::new(Network::new(api, store))?;

            tracing::info!(group_id, "starting chat");
            let mut runtime = Runtime::new(driver, app);
            runtime.run(*group_id).await?;

            if let Some(status) = runtime.app().status_message() {
                writeln!(out, "{status}")?;
            }
        },
    }
    Ok(())
}

/// API client for the stored credential.
fn authorized(config: ClientConfig, store: &dyn CredentialStore) -> Result<ApiClient, CliError> {
    let credential = store.load()?.ok_or(CliError::NotLoggedIn)?;
    ApiClient::new(config, credential).map_err(|source| CliError::Api { action: "start client", source })
}

/// Resolve the session, clearing the stored credential if it was rejected.
async fn session(api: &ApiClient, store: &dyn CredentialStore) -> Result<SessionIdentity, CliError> {
    api.me().await.map_err(|source| api_error("verify session", source, store))
}

async fn require_admin(
    api: &ApiClient,
    store: &dyn CredentialStore,
    what: &'static str,
) -> Result<(), CliError> {
    let identity = session(api, store).await?;
    if identity.role.is_admin() {
        Ok(())
    } else {
        Err(CliError::AdminRequired(what))
    }
}

/// Wrap an API error; a rejected session also clears the stored credential.
fn api_error(action: &'static str, source: ApiError, store: &dyn CredentialStore) -> CliError {
    if matches!(source, ApiError::Unauthorized) {
        tracing::warn!(action, "session rejected, clearing stored credential");
        if let Err(e) = store.clear() {
            tracing::warn!(error = %e, "could not clear stored credential");
        }
    }
    CliError::Api { action, source }
}

fn prompt_password(input: &mut impl BufRead, out: &mut impl Write) -> Result<String, CliError> {
    write!(out, "Password: ")?;
    out.flush()?;
    let mut line = String::new();
    input.read_line(&mut line)?;
    Ok(line.trim_end_matches(['\r', '\n']).to_owned())
}

fn role_name(role: Role) -> &'static str {
    match role {
        Role::Admin => "admin",
        Role::User => "user",
        Role::Other => "other",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(argv: &[&str]) -> Args {
        Args::try_parse_from(argv).unwrap()
    }

    #[test]
    fn defaults() {
        let args = parse(&["huddle", "chat", "3"]);
        assert_eq!(args.command, CliCommand::Chat { group_id: 3 });
        assert_eq!(args.timeout_secs, 30);
        assert_eq!(args.log_file, PathBuf::from("huddle.log"));
    }

    #[test]
    fn global_flags_after_subcommand() {
        let args = parse(&["huddle", "groups", "--server", "https://chat.example.com", "--timeout-secs", "5"]);
        let config = args.client_config().unwrap();
        assert_eq!(config.base_url.as_str(), "https://chat.example.com/");
        assert_eq!(config.request_timeout, Duration::from_secs(5));
    }

    #[test]
    fn negative_offset() {
        let args = parse(&["huddle", "--utc-offset-minutes", "-300", "chat", "1"]);
        let config = args.app_config().unwrap();
        assert_eq!(config.display_offset.local_minus_utc(), -300 * 60);
    }

    #[test]
    fn out_of_range_offset_is_rejected() {
        let args = parse(&["huddle", "--utc-offset-minutes", "1500", "chat", "1"]);
        assert!(matches!(args.app_config(), Err(CliError::InvalidOffset(1500))));
    }

    #[test]
    fn group_create_members() {
        let args = parse(&["huddle", "group-create", "ops", "--members", "2,3,5"]);
        assert_eq!(
            args.command,
            CliCommand::GroupCreate { name: "ops".into(), members: vec![2, 3, 5] }
        );
    }

    #[test]
    fn task_create_fields() {
        let args = parse(&[
            "huddle", "task-create", "Write report", "--priority", "high", "--due", "2024-06-30",
            "--status", "in_progress",
        ]);
        let CliCommand::TaskCreate { title, fields } = args.command else {
            panic!("expected task-create");
        };
        let task = fields.new_task(&title);
        assert_eq!(task.priority, Priority::High);
        assert_eq!(task.status, TaskStatus::InProgress);
        assert_eq!(task.due_date, NaiveDate::from_ymd_opt(2024, 6, 30));
        assert_eq!(task.category, "general");
        assert_eq!(task.assigned_to, None);
    }

    #[test]
    fn task_fields_reject_unknown_values() {
        assert!(Args::try_parse_from(["huddle", "task-create", "x", "--priority", "urgent"]).is_err());
        assert!(Args::try_parse_from(["huddle", "task-create", "x", "--due", "30/06/2024"]).is_err());
        assert!(Args::try_parse_from(["huddle", "signup", "--name", "a", "--email", "b", "--role", "root"]).is_err());
    }

    #[test]
    fn task_update_without_fields_is_empty() {
        let args = parse(&["huddle", "task-update", "4"]);
        let CliCommand::TaskUpdate { title, fields, .. } = args.command else {
            panic!("expected task-update");
        };
        assert!(fields.update(title).is_empty());
    }

    #[test]
    fn chat_requires_group() {
        assert!(Args::try_parse_from(["huddle", "chat"]).is_err());
    }
}
