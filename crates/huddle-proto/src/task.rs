//! Task records, due-date notifications and activity logs.
//!
//! Tasks live next to group chat on the same backend: `/tasks/` for CRUD,
//! `/notifications/` for derived reminders and `/activity/{task_id}` for the
//! per-task audit trail. The server owns every rule (role-based assignment,
//! priority recalculated from the due date, permission checks); these types
//! only carry the data.

use std::{fmt, str::FromStr};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{ProtocolError, Timestamp, UserId};

/// Server-assigned task identifier.
pub type TaskId = u64;

/// Task priority.
///
/// The backend overrides the requested priority whenever a due date is set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    /// Due in more than two days, or no due date.
    Low,
    /// Due within two days.
    Medium,
    /// Due today or overdue.
    High,
    /// Value this client does not know about.
    #[serde(other)]
    Other,
}

/// Task progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Not started.
    Pending,
    /// Being worked on.
    InProgress,
    /// Done. Completed tasks never produce due-date reminders.
    Completed,
    /// Value this client does not know about.
    #[serde(other)]
    Other,
}

impl Priority {
    /// Wire name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Other => "other",
        }
    }
}

impl TaskStatus {
    /// Wire name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Accepts the known wire names only; `other` is never sent.
impl FromStr for Priority {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            _ => Err(ProtocolError::UnknownValue { kind: "priority", value: s.to_owned() }),
        }
    }
}

/// Accepts the known wire names only; `other` is never sent.
impl FromStr for TaskStatus {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "in_progress" => Ok(Self::InProgress),
            "completed" => Ok(Self::Completed),
            _ => Err(ProtocolError::UnknownValue { kind: "status", value: s.to_owned() }),
        }
    }
}

/// A task as returned by `/tasks/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /// Task identifier.
    pub id: TaskId,
    /// Short title.
    pub title: String,
    /// Free-form description.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub description: String,
    /// Effective priority.
    pub priority: Priority,
    /// Free-form category, `general` by default.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub category: String,
    /// Calendar day the task is due.
    #[serde(default, with = "due_date")]
    pub due_date: Option<NaiveDate>,
    /// Progress.
    pub status: TaskStatus,
    /// Assignee.
    #[serde(default)]
    pub assigned_to: Option<UserId>,
    /// Author.
    #[serde(default)]
    pub created_by: Option<UserId>,
}

/// Body of `POST /tasks/`.
///
/// Regular users always get the task assigned to themselves; only admins may
/// pick an assignee.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewTask {
    /// Short title, must be non-empty.
    pub title: String,
    /// Free-form description.
    pub description: String,
    /// Requested priority; replaced by the server when a due date is set.
    pub priority: Priority,
    /// Free-form category.
    pub category: String,
    /// Calendar day the task is due.
    #[serde(with = "due_date")]
    pub due_date: Option<NaiveDate>,
    /// Initial progress.
    pub status: TaskStatus,
    /// Assignee, admins only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<UserId>,
}

impl NewTask {
    /// Pending, low-priority `general` task with only a title.
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: String::new(),
            priority: Priority::Low,
            category: "general".to_owned(),
            due_date: None,
            status: TaskStatus::Pending,
            assigned_to: None,
        }
    }
}

/// Body of `PUT /tasks/{id}`: a partial update.
///
/// Only fields that are set are serialized, so the server leaves the others
/// untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TaskUpdate {
    /// New title.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// New description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// New priority.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    /// New category.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// New due date.
    #[serde(skip_serializing_if = "Option::is_none", with = "due_date")]
    pub due_date: Option<NaiveDate>,
    /// New progress.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<TaskStatus>,
    /// New assignee.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<UserId>,
}

impl TaskUpdate {
    /// Whether the update would change nothing.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Why a reminder was raised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    /// High priority and still pending.
    HighPriority,
    /// Due tomorrow and not completed.
    DueTomorrow,
    /// Past its due date and not completed.
    Overdue,
    /// Value this client does not know about.
    #[serde(other)]
    Other,
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::HighPriority => "high priority",
            Self::DueTomorrow => "due tomorrow",
            Self::Overdue => "overdue",
            Self::Other => "notice",
        })
    }
}

/// One reminder from `GET /notifications/`, derived from a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    /// Why it was raised.
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    /// Title of the task.
    pub title: String,
    /// Priority of the task.
    pub priority: Priority,
    /// Progress of the task.
    pub status: TaskStatus,
    /// Due date of the task.
    #[serde(default, with = "due_date")]
    pub due_date: Option<NaiveDate>,
}

/// One entry of `GET /activity/{task_id}`, oldest first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityEntry {
    /// Entry identifier.
    pub id: u64,
    /// Task the entry belongs to.
    pub task_id: TaskId,
    /// User that acted.
    pub user_id: UserId,
    /// What happened, e.g. "Status changed from pending to completed".
    pub message: String,
    /// When it happened.
    pub timestamp: Timestamp,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// `YYYY-MM-DD`, with `null` and `""` both meaning no due date.
mod due_date {
    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    const FORMAT: &str = "%Y-%m-%d";

    #[allow(clippy::ref_option)]
    pub fn serialize<S: Serializer>(date: &Option<NaiveDate>, s: S) -> Result<S::Ok, S::Error> {
        match date {
            Some(date) => s.collect_str(&date.format(FORMAT)),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<NaiveDate>, D::Error> {
        match Option::<String>::deserialize(d)?.as_deref() {
            None | Some("") => Ok(None),
            Some(raw) => NaiveDate::parse_from_str(raw, FORMAT).map(Some).map_err(D::Error::custom),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn task_tolerates_sparse_records() {
        let task: Task = serde_json::from_str(
            r#"{"id": 3, "title": "Ship", "description": null, "priority": "high",
                "due_date": "", "status": "in_progress", "assigned_to": 2}"#,
        )
        .unwrap();

        assert_eq!(task.description, "");
        assert_eq!(task.category, "");
        assert_eq!(task.due_date, None);
        assert_eq!(task.status, TaskStatus::InProgress);
        assert_eq!(task.created_by, None);
    }

    #[test]
    fn unknown_enum_values_decode_as_other() {
        let task: Task = serde_json::from_str(
            r#"{"id": 1, "title": "x", "priority": "urgent", "status": "blocked", "due_date": "2024-05-01"}"#,
        )
        .unwrap();

        assert_eq!(task.priority, Priority::Other);
        assert_eq!(task.status, TaskStatus::Other);
        assert_eq!(task.due_date, NaiveDate::from_ymd_opt(2024, 5, 1));
    }

    #[test]
    fn new_task_omits_unset_assignee() {
        let mut task = NewTask::titled("Write report");
        task.due_date = NaiveDate::from_ymd_opt(2024, 6, 30);

        let value = serde_json::to_value(&task).unwrap();
        assert_eq!(value["due_date"], "2024-06-30");
        assert_eq!(value["status"], "pending");
        assert!(value.get("assigned_to").is_none());
    }

    #[test]
    fn update_serializes_only_changed_fields() {
        let update = TaskUpdate { status: Some(TaskStatus::Completed), ..TaskUpdate::default() };
        assert!(!update.is_empty());
        assert!(TaskUpdate::default().is_empty());

        let json = serde_json::to_string(&update).unwrap();
        assert_eq!(json, r#"{"status":"completed"}"#);
    }

    #[test]
    fn wire_names_parse_back() {
        for status in [TaskStatus::Pending, TaskStatus::InProgress, TaskStatus::Completed] {
            assert_eq!(status.as_str().parse::<TaskStatus>().unwrap(), status);
        }
        assert!("other".parse::<Priority>().is_err());
        assert!("urgent".parse::<Priority>().is_err());
    }

    #[test]
    fn notification_kinds() {
        let notes: Vec<Notification> = serde_json::from_str(
            r#"[{"type": "overdue", "title": "a", "priority": "high", "status": "pending", "due_date": "2024-01-01"},
                {"type": "high_priority", "title": "b", "priority": "high", "status": "pending", "due_date": null}]"#,
        )
        .unwrap();

        assert_eq!(notes[0].kind, NotificationKind::Overdue);
        assert_eq!(notes[1].kind.to_string(), "high priority");
        assert_eq!(notes[1].due_date, None);
    }

    #[test]
    fn activity_accepts_naive_timestamps() {
        let entry: ActivityEntry = serde_json::from_str(
            r#"{"id": 1, "task_id": 4, "user_id": 2, "message": "Task created: x",
                "timestamp": "2024-01-01T10:00:00.123456"}"#,
        )
        .unwrap();
        assert_eq!(entry.timestamp, Timestamp::parse("2024-01-01T10:00:00.123456Z").unwrap());
    }
}
