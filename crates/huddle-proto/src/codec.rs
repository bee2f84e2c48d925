//! Channel frame codec.
//!
//! The live channel carries exactly one JSON object per frame in each
//! direction. Outgoing frames contain only a [`Content`]; the server stamps
//! sender and time and broadcasts the resulting [`Message`] to every member
//! connected to the group, including the author.

use crate::{
    Content, Message,
    errors::{ProtocolError, Result},
};

/// Serialize an outgoing frame.
///
/// Text bodies encode as `{"type":"text","message":...}`, file announcements
/// as `{"type":"file","file_url":...,"file_name":...,"file_type":...}`.
pub fn encode_outgoing(content: &Content) -> Result<String> {
    serde_json::to_string(content).map_err(|e| ProtocolError::Encode(e.to_string()))
}

/// Parse one inbound frame as a [`Message`].
///
/// Never panics on hostile input; anything that is not a well-formed message
/// is reported as [`ProtocolError::Decode`].
pub fn decode_inbound(frame: &str) -> Result<Message> {
    serde_json::from_str(frame).map_err(|e| ProtocolError::Decode(e.to_string()))
}

/// Parse a history response body (a JSON array of messages, oldest first).
pub fn decode_history(body: &str) -> Result<Vec<Message>> {
    serde_json::from_str(body).map_err(|e| ProtocolError::Decode(e.to_string()))
}
