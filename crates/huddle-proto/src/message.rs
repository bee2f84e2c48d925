//! Chat messages and their bodies.
//!
//! A [`Message`] arrives either from the history endpoint or as one frame on
//! the live channel. Both sources use the same JSON shape:
//!
//! ```json
//! {"sender_id": 1, "sender": "Asha", "time": "2024-01-01T10:00:00Z",
//!  "type": "text", "message": "hi"}
//! ```
//!
//! The `type` tag decides which of the optional fields are populated, so the
//! body is modelled as the [`Content`] enum and flattened into the message.

use std::fmt;

use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::{ProtocolError, UserId};

/// Descriptor of a file held by the storage backend.
///
/// Returned by `POST /chat/upload` and announced verbatim in a file message.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StoredFile {
    /// Path of the stored resource, relative to the backend base address.
    pub file_url: String,
    /// Original file name.
    pub file_name: String,
    /// MIME type reported at upload time.
    pub file_type: String,
}

impl StoredFile {
    /// Whether the stored file should be displayed inline as an image.
    pub fn is_image(&self) -> bool {
        self.file_type.starts_with("image/")
    }
}

/// Message body.
///
/// Also the payload of an outgoing channel frame: the server fills in sender
/// and time, the client only supplies the body.
///
/// # Invariants
///
/// - A message is exactly one variant; the `type` tag selects it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Content {
    /// Plain text.
    Text {
        /// Text body.
        message: String,
    },
    /// Stored file announcement.
    File(StoredFile),
}

impl Content {
    /// Build a text body.
    pub fn text(message: impl Into<String>) -> Self {
        Self::Text { message: message.into() }
    }
}

/// A chat message as delivered by the server.
///
/// Immutable once received: the client only appends messages to the ordered
/// sequence of the open group, it never edits them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Message {
    /// Author of the message.
    pub sender_id: UserId,
    /// Display name of the author. `None` if the server could not resolve it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender: Option<String>,
    /// Server receive time.
    pub time: Timestamp,
    /// Text or file body.
    #[serde(flatten)]
    pub content: Content,
}

impl Message {
    /// Display name, falling back to `"Unknown"`.
    pub fn sender_name(&self) -> &str {
        self.sender.as_deref().unwrap_or("Unknown")
    }
}

/// UTC instant as carried on the wire.
///
/// The backend writes naive ISO-8601 strings (no offset) that are implicitly
/// UTC, while other producers send RFC 3339. Both parse; serialization is
/// always RFC 3339 with a `Z` suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Wrap a UTC instant.
    pub fn new(instant: DateTime<Utc>) -> Self {
        Self(instant)
    }

    /// Parse RFC 3339 or naive ISO-8601 (taken as UTC).
    pub fn parse(raw: &str) -> Result<Self, ProtocolError> {
        if let Ok(instant) = DateTime::parse_from_rfc3339(raw) {
            return Ok(Self(instant.with_timezone(&Utc)));
        }

        NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
            .map(|naive| Self(naive.and_utc()))
            .map_err(|_| ProtocolError::Timestamp(raw.to_string()))
    }

    /// Underlying UTC instant.
    pub fn instant(self) -> DateTime<Utc> {
        self.0
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(instant: DateTime<Utc>) -> Self {
        Self(instant)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.to_rfc3339_opts(SecondsFormat::AutoSi, true))
    }
}

impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}
