//! Decode a Pub/Sub-delivered admin audit-log entry into a [`MembershipEvent`].

use base64::Engine;
use grp_types::{AuditLogEntry, DecodeError, MembershipEvent, PushEnvelope};

const MEMBERSHIP_ID_PATH: &str = "protoPayload.metadata.event[0].parameter[0].value";

/// Decode an inbound HTTP body (push body or structured CloudEvent).
pub fn decode_push_body(body: &[u8]) -> Result<MembershipEvent, DecodeError> {
    let envelope: PushEnvelope =
        serde_json::from_slice(body).map_err(|e| DecodeError::Envelope(e.to_string()))?;
    let data = envelope
        .message()
        .data
        .as_deref()
        .ok_or(DecodeError::MissingData)?;
    let mut event = decode_message_data(data)?;
    event.message_id = envelope.message().message_id.clone();
    Ok(event)
}

/// Decode the base64 `message.data` field. The result carries no message id.
pub fn decode_message_data(data: &str) -> Result<MembershipEvent, DecodeError> {
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(data.trim())
        .map_err(|e| DecodeError::Base64(e.to_string()))?;
    let text = String::from_utf8(bytes).map_err(|e| DecodeError::Utf8(e.to_string()))?;
    let entry: AuditLogEntry =
        serde_json::from_str(text.trim()).map_err(|e| DecodeError::Json(e.to_string()))?;
    membership_event(&entry)
}

fn membership_event(entry: &AuditLogEntry) -> Result<MembershipEvent, DecodeError> {
    let membership_id = entry
        .membership_id()
        .ok_or(DecodeError::MissingField(MEMBERSHIP_ID_PATH))?;
    Ok(MembershipEvent {
        membership_id: membership_id.to_string(),
        caller_ip: entry.caller_ip().to_string(),
        event_name: entry.event_name().map(String::from),
        group_email: entry.parameter("GROUP_EMAIL").map(String::from),
        message_id: None,
    })
}
