//! Inbound envelope, audit-log, and Cloud Identity DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Role granted to every propagated member.
pub const MEMBER_ROLE: &str = "MEMBER";

/// Pub/Sub message as delivered by a push subscription or an Eventarc trigger.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PubSubMessage {
    /// Base64-encoded payload.
    #[serde(default)]
    pub data: Option<String>,
    #[serde(default, alias = "message_id")]
    pub message_id: Option<String>,
}

/// Body of a Pub/Sub push request (also the `data` of a Pub/Sub CloudEvent).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PubSubPush {
    pub message: PubSubMessage,
}

/// CloudEvent in structured content mode wrapping a Pub/Sub push body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StructuredCloudEvent {
    pub data: PubSubPush,
}

/// Inbound HTTP body: either a plain push body (binary CloudEvent mode) or a structured CloudEvent.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PushEnvelope {
    Push(PubSubPush),
    CloudEvent(StructuredCloudEvent),
}

impl PushEnvelope {
    pub fn message(&self) -> &PubSubMessage {
        match self {
            PushEnvelope::Push(p) => &p.message,
            PushEnvelope::CloudEvent(ce) => &ce.data.message,
        }
    }
}

/// Admin audit-log entry (only the fields the filter reads).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditLogEntry {
    pub proto_payload: ProtoPayload,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProtoPayload {
    #[serde(default)]
    pub request_metadata: Option<RequestMetadata>,
    #[serde(default)]
    pub metadata: Option<ActivityMetadata>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestMetadata {
    #[serde(default)]
    pub caller_ip: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ActivityMetadata {
    #[serde(default)]
    pub event: Vec<ActivityEvent>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityEvent {
    #[serde(default)]
    pub event_name: Option<String>,
    #[serde(default)]
    pub parameter: Vec<EventParameter>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventParameter {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub value: Option<String>,
}

impl AuditLogEntry {
    /// Caller address, empty when the entry carries none.
    pub fn caller_ip(&self) -> &str {
        self.proto_payload
            .request_metadata
            .as_ref()
            .and_then(|m| m.caller_ip.as_deref())
            .unwrap_or("")
    }

    fn first_event(&self) -> Option<&ActivityEvent> {
        self.proto_payload
            .metadata
            .as_ref()
            .and_then(|m| m.event.first())
    }

    /// `event[0].parameter[0].value`: the principal being added.
    pub fn membership_id(&self) -> Option<&str> {
        self.first_event()
            .and_then(|e| e.parameter.first())
            .and_then(|p| p.value.as_deref())
    }

    pub fn event_name(&self) -> Option<&str> {
        self.first_event().and_then(|e| e.event_name.as_deref())
    }

    /// Value of the first-event parameter with the given name.
    pub fn parameter(&self, name: &str) -> Option<&str> {
        self.first_event()?
            .parameter
            .iter()
            .find(|p| p.name.as_deref() == Some(name))
            .and_then(|p| p.value.as_deref())
    }
}

/// Decoded membership event handed to the propagation policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MembershipEvent {
    pub membership_id: String,
    /// Empty when the audit entry has no caller address.
    pub caller_ip: String,
    pub event_name: Option<String>,
    pub group_email: Option<String>,
    /// Pub/Sub message id, when the event came through a push envelope.
    pub message_id: Option<String>,
}

/// Result of testing a caller address against the trusted ranges.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IpClass {
    /// Contained in `range` (the first matching entry).
    Trusted { range: String },
    Untrusted,
    InvalidAddress,
}

impl IpClass {
    pub fn is_trusted(&self) -> bool {
        matches!(self, IpClass::Trusted { .. })
    }
}

/// What the policy decided to do with an event once ranges are available.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Propagate,
    SkipNonOktaIp,
    SkipNoIp,
}

/// Cloud Identity `EntityKey`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityKey {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
}

/// Cloud Identity `MembershipRole`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MembershipRole {
    pub name: String,
}

/// Create-membership request body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Membership {
    pub preferred_member_key: EntityKey,
    pub roles: Vec<MembershipRole>,
}

impl Membership {
    /// Plain `MEMBER` membership for the given principal.
    pub fn member(id: impl Into<String>) -> Self {
        Self {
            preferred_member_key: EntityKey {
                id: id.into(),
                namespace: None,
            },
            roles: vec![MembershipRole {
                name: MEMBER_ROLE.to_string(),
            }],
        }
    }
}

/// Response of `groups:lookup`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LookupGroupNameResponse {
    #[serde(default)]
    pub name: Option<String>,
}

/// Membership resource returned inside the create operation.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MembershipResource {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub preferred_member_key: Option<EntityKey>,
    #[serde(default)]
    pub roles: Vec<MembershipRole>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OperationStatus {
    #[serde(default)]
    pub code: Option<i32>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Long-running operation returned by `memberships.create`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Operation {
    #[serde(default)]
    pub done: bool,
    #[serde(default)]
    pub response: Option<MembershipResource>,
    #[serde(default)]
    pub error: Option<OperationStatus>,
}

/// Membership that was created in the parent group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MembershipOutcome {
    pub member_id: String,
    pub role: String,
    /// Canonical group resource name, e.g. `groups/01abc`.
    pub group: String,
}

/// OAuth bearer token.
#[derive(Clone)]
pub struct AccessToken {
    pub token: String,
    pub expires_at: Option<DateTime<Utc>>,
}

impl AccessToken {
    pub fn new(token: impl Into<String>, expires_at: Option<DateTime<Utc>>) -> Self {
        Self {
            token: token.into(),
            expires_at,
        }
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessToken")
            .field("token", &"[REDACTED]")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// (message, status) pair returned to the dispatcher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncResponse {
    pub message: String,
    pub status: u16,
}

impl SyncResponse {
    pub fn new(message: impl Into<String>, status: u16) -> Self {
        Self {
            message: message.into(),
            status,
        }
    }

    pub fn processed() -> Self {
        Self::new("Group Event Processed Successfully", 200)
    }

    pub fn not_okta_ip() -> Self {
        Self::new("Not an Okta IP", 200)
    }

    pub fn no_requesting_ip() -> Self {
        Self::new("No Requesting IP Found", 200)
    }

    pub fn ranges_unavailable() -> Self {
        Self::new("Could not retrieve Okta IP ranges", 500)
    }

    pub fn event_error() -> Self {
        Self::new("Error processing cloud event", 500)
    }
}
