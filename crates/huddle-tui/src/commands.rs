//! Slash command parsing.
//!
//! A line starting with `/` is a command; anything else is a chat message.
//! Parsing is pure so that the input handler can be tested without a
//! terminal.

use std::path::PathBuf;

use huddle_proto::GroupId;

/// Help text listing every command.
pub const HELP: &str =
    "/group <id> | /groups | /upload <path> | /reconnect | /help | /quit | Tab: next group";

/// Parsed input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Switch to another group.
    OpenGroup {
        /// Group to open.
        group_id: GroupId,
    },
    /// Re-fetch the group list.
    RefreshGroups,
    /// Upload a file and announce it in the open group.
    Upload {
        /// Local file.
        path: PathBuf,
    },
    /// Re-open the current group.
    Reconnect,
    /// Show command help.
    Help,
    /// Quit the client.
    Quit,
    /// Plain chat message.
    Message {
        /// Text as typed.
        content: String,
    },
    /// Unrecognized `/command`.
    Unknown {
        /// Input line.
        input: String,
    },
    /// Known command with bad arguments.
    InvalidArgs {
        /// Command name without the slash.
        command: &'static str,
        /// What is wrong.
        error: String,
    },
}

/// Parse one input line.
pub fn parse(line: &str) -> Command {
    let Some(rest) = line.strip_prefix('/') else {
        return Command::Message { content: line.to_owned() };
    };
    // "//text" escapes a message that starts with a slash
    if rest.starts_with('/') {
        return Command::Message { content: rest.to_owned() };
    }

    let (name, args) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));
    let args = args.trim();

    match name {
        "group" | "g" => match args.parse::<GroupId>() {
            Ok(group_id) => Command::OpenGroup { group_id },
            Err(_) if args.is_empty() => invalid("group", "missing group id"),
            Err(_) => invalid("group", format!("'{args}' is not a group id")),
        },
        "groups" => Command::RefreshGroups,
        "upload" | "u" => {
            if args.is_empty() {
                invalid("upload", "missing file path")
            } else {
                Command::Upload { path: PathBuf::from(args) }
            }
        },
        "reconnect" => Command::Reconnect,
        "help" | "?" => Command::Help,
        "quit" | "q" | "exit" => Command::Quit,
        _ => Command::Unknown { input: line.to_owned() },
    }
}

fn invalid(command: &'static str, error: impl Into<String>) -> Command {
    Command::InvalidArgs { command, error: error.into() }
}
