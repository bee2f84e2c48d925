//! Group records as returned by `/groups/`.

use serde::{Deserialize, Serialize};

use crate::UserId;

/// Server-assigned group identifier.
pub type GroupId = u64;

/// A named set of users sharing one chat history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    /// Group identifier, embedded in chat URLs.
    pub id: GroupId,
    /// Display name.
    pub name: String,
    /// Admin that created the group. Older records may omit it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by: Option<UserId>,
}

/// Body of `POST /groups/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateGroupRequest {
    /// Group name, must be non-empty.
    pub name: String,
    /// Initial members besides the creator.
    #[serde(default)]
    pub members: Vec<UserId>,
}
