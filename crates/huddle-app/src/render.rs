//! Presentation reducer.
//!
//! Turns the ordered message sequence of a group into a [`RenderPlan`]: per
//! message, whether a date separator precedes it, which side it is aligned to
//! and which body variant to draw.
//!
//! # Invariants
//!
//! - Pure: the plan depends only on the messages and the [`RenderContext`].
//!   Rendering the same sequence twice with the same context produces
//!   identical plans.
//! - A separator precedes a message iff it is the first message or its
//!   calendar day (in the context's display offset) differs from the previous
//!   message's calendar day. Absolute time distance is irrelevant.

use chrono::{DateTime, FixedOffset, NaiveDate};
use huddle_proto::{Content, Message, UserId};
use serde::Serialize;

/// Inputs besides the messages themselves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderContext {
    /// Viewer's user id. `None` while the session identity is unresolved,
    /// in which case every message is left-aligned.
    pub viewer: Option<UserId>,
    /// Fixed display offset used to derive calendar days and clock times.
    pub offset: FixedOffset,
    /// Current calendar day in `offset`, for "Today"/"Yesterday" labels.
    pub today: NaiveDate,
}

/// Horizontal placement of a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Alignment {
    /// Someone else's message.
    Left,
    /// Viewer's own message.
    Right,
}

/// Date separator drawn above the first message of a calendar day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DayHeader {
    /// Calendar day in the display offset.
    pub date: NaiveDate,
    /// Human label: "Today", "Yesterday" or e.g. "1 January 2024".
    pub label: String,
}

/// Body variant selected by the message type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum RenderBody {
    /// Text message.
    Text(String),
    /// File whose MIME type is `image/*`.
    Image {
        /// Stored resource path.
        url: String,
        /// Original file name.
        name: String,
    },
    /// Any other file.
    Attachment {
        /// Stored resource path.
        url: String,
        /// Original file name.
        name: String,
    },
}

/// One rendered message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderEntry {
    /// Separator to draw before this message, if any.
    pub separator: Option<DayHeader>,
    /// Left or right placement.
    pub alignment: Alignment,
    /// Sender display name.
    pub sender: String,
    /// Clock time, e.g. "10:01 AM".
    pub time_label: String,
    /// Body to draw.
    pub body: RenderBody,
}

/// Render plan for a whole message sequence, in sequence order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RenderPlan {
    /// One entry per message.
    pub entries: Vec<RenderEntry>,
}

/// Build the render plan for `messages`.
pub fn render_plan(messages: &[Message], ctx: &RenderContext) -> RenderPlan {
    let mut previous_day: Option<NaiveDate> = None;

    let entries = messages
        .iter()
        .map(|message| {
            let local = message.time.instant().with_timezone(&ctx.offset);
            let day = local.date_naive();

            let separator = (previous_day != Some(day))
                .then(|| DayHeader { date: day, label: day_label(day, ctx.today) });
            previous_day = Some(day);

            let alignment = if ctx.viewer == Some(message.sender_id) {
                Alignment::Right
            } else {
                Alignment::Left
            };

            RenderEntry {
                separator,
                alignment,
                sender: message.sender_name().to_string(),
                time_label: time_label(&local),
                body: render_body(&message.content),
            }
        })
        .collect();

    RenderPlan { entries }
}

/// Separator label for `day`, relative to `today`.
pub fn day_label(day: NaiveDate, today: NaiveDate) -> String {
    if day == today {
        "Today".to_string()
    } else if today.pred_opt() == Some(day) {
        "Yesterday".to_string()
    } else {
        day.format("%-d %B %Y").to_string()
    }
}

/// 12-hour clock label.
pub fn time_label(local: &DateTime<FixedOffset>) -> String {
    local.format("%-I:%M %p").to_string()
}

fn render_body(content: &Content) -> RenderBody {
    match content {
        Content::Text { message } => RenderBody::Text(message.clone()),
        Content::File(file) if file.is_image() => {
            RenderBody::Image { url: file.file_url.clone(), name: file.file_name.clone() }
        },
        Content::File(file) => {
            RenderBody::Attachment { url: file.file_url.clone(), name: file.file_name.clone() }
        },
    }
}

#[cfg(test)]
mod tests {
    use huddle_proto::{StoredFile, Timestamp};

    use super::*;

    fn ctx(viewer: Option<UserId>, offset_secs: i32) -> RenderContext {
        RenderContext {
            viewer,
            offset: FixedOffset::east_opt(offset_secs).unwrap(),
            today: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
        }
    }

    fn text(sender_id: UserId, time: &str) -> Message {
        Message {
            sender_id,
            sender: Some(format!("user{sender_id}")),
            time: Timestamp::parse(time).unwrap(),
            content: Content::text("x"),
        }
    }

    #[test]
    fn scenario_history_then_live() {
        let messages = vec![text(1, "2024-01-01T10:00:00Z"), text(2, "2024-01-01T10:01:00Z")];

        let plan = render_plan(&messages, &ctx(Some(1), 0));
        assert_eq!(plan.entries.len(), 2);
        assert!(plan.entries[0].separator.is_some());
        assert!(plan.entries[1].separator.is_none());
        assert_eq!(plan.entries[0].alignment, Alignment::Right);
        assert_eq!(plan.entries[1].alignment, Alignment::Left);

        let other = render_plan(&messages, &ctx(Some(3), 0));
        assert!(other.entries.iter().all(|e| e.alignment == Alignment::Left));
    }

    #[test]
    fn minute_across_midnight_gets_separator() {
        let messages = vec![text(1, "2024-01-01T23:59:30Z"), text(1, "2024-01-02T00:00:30Z")];
        let plan = render_plan(&messages, &ctx(None, 0));
        assert!(plan.entries[1].separator.is_some());
    }

    #[test]
    fn same_day_hours_apart_has_no_separator() {
        let messages = vec![text(1, "2024-01-01T00:05:00Z"), text(1, "2024-01-01T23:55:00Z")];
        let plan = render_plan(&messages, &ctx(None, 0));
        assert!(plan.entries[1].separator.is_none());
    }

    #[test]
    fn day_boundary_follows_display_offset() {
        // 20:00 and 17:00 UTC fall on different days at +05:30
        let messages = vec![text(1, "2024-01-01T17:00:00Z"), text(1, "2024-01-01T20:00:00Z")];

        let utc = render_plan(&messages, &ctx(None, 0));
        assert!(utc.entries[1].separator.is_none());

        let ist = render_plan(&messages, &ctx(None, 5 * 3600 + 1800));
        assert!(ist.entries[1].separator.is_some());
        assert_eq!(ist.entries[1].time_label, "1:30 AM");
    }

    #[test]
    fn labels() {
        let today = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        assert_eq!(day_label(today, today), "Today");
        assert_eq!(day_label(NaiveDate::from_ymd_opt(2024, 5, 31).unwrap(), today), "Yesterday");
        assert_eq!(day_label(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(), today), "1 January 2024");
    }

    #[test]
    fn file_variants() {
        let file = |file_type: &str| Message {
            sender_id: 1,
            sender: None,
            time: Timestamp::parse("2024-01-01T10:00:00Z").unwrap(),
            content: Content::File(StoredFile {
                file_url: "/uploads/a".into(),
                file_name: "a".into(),
                file_type: file_type.into(),
            }),
        };

        let plan = render_plan(&[file("image/png"), file("application/pdf")], &ctx(None, 0));
        assert!(matches!(plan.entries[0].body, RenderBody::Image { .. }));
        assert!(matches!(plan.entries[1].body, RenderBody::Attachment { .. }));
        assert_eq!(plan.entries[0].sender, "Unknown");
    }
}
