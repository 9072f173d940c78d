//! GroupSync: decode → fetch ranges → decide → propagate.

use crate::decoder::decode_push_body;
use grp_ranges::classify;
use grp_types::{
    Decision, EventProcessor, IpClass, MembershipEvent, Propagator, RangeSource, SyncResponse,
};
use tracing::Instrument;
use uuid::Uuid;

/// Decide what to do with an event once trusted ranges are known.
///
/// Without restriction every event propagates. With restriction an empty caller address is
/// skipped, and anything not inside a trusted range (including unparseable addresses) is skipped.
pub fn decide<S: AsRef<str>>(okta_groups_only: bool, caller_ip: &str, ranges: &[S]) -> Decision {
    if !okta_groups_only {
        return Decision::Propagate;
    }
    if caller_ip.is_empty() {
        return Decision::SkipNoIp;
    }
    match classify(caller_ip, ranges) {
        IpClass::Trusted { .. } => Decision::Propagate,
        IpClass::Untrusted | IpClass::InvalidAddress => Decision::SkipNonOktaIp,
    }
}

/// Event processor composing a range source and a propagator.
pub struct GroupSync<R, P> {
    pub ranges: R,
    pub propagator: P,
    /// Restrict propagation to events whose caller address is a trusted Okta range.
    pub okta_groups_only: bool,
}

impl<R, P> GroupSync<R, P>
where
    R: RangeSource + Send + Sync,
    P: Propagator + Send + Sync,
{
    pub fn new(ranges: R, propagator: P, okta_groups_only: bool) -> Self {
        Self {
            ranges,
            propagator,
            okta_groups_only,
        }
    }

    async fn handle(&self, body: &[u8]) -> SyncResponse {
        let event = match decode_push_body(body) {
            Ok(event) => event,
            Err(e) => {
                tracing::error!(error = %e, "error processing cloud event");
                return SyncResponse::event_error();
            }
        };
        if let Some(message_id) = event.message_id.as_deref() {
            tracing::Span::current().record("message_id", message_id);
        }
        tracing::info!(
            membership_id = %event.membership_id,
            caller_ip = %event.caller_ip,
            event_name = event.event_name.as_deref().unwrap_or(""),
            group_email = event.group_email.as_deref().unwrap_or(""),
            "decoded group membership event"
        );

        let ranges = match self.ranges.fetch_ranges().await {
            Ok(ranges) if !ranges.is_empty() => ranges,
            Ok(_) => {
                tracing::error!("okta ip range document contained no ranges");
                return SyncResponse::ranges_unavailable();
            }
            Err(e) => {
                tracing::error!(error = %e, "error fetching okta ip ranges");
                return SyncResponse::ranges_unavailable();
            }
        };

        match decide(self.okta_groups_only, &event.caller_ip, &ranges) {
            Decision::SkipNoIp => {
                tracing::info!(
                    membership_id = %event.membership_id,
                    "no requesting ip found, skipping group add"
                );
                SyncResponse::no_requesting_ip()
            }
            Decision::SkipNonOktaIp => {
                tracing::info!(
                    caller_ip = %event.caller_ip,
                    membership_id = %event.membership_id,
                    "not an okta ip and okta_groups_only is set, ignoring"
                );
                SyncResponse::not_okta_ip()
            }
            Decision::Propagate => {
                self.propagate(&event).await;
                SyncResponse::processed()
            }
        }
    }

    /// Propagation errors are logged only; the event is still acknowledged.
    async fn propagate(&self, event: &MembershipEvent) {
        match self.propagator.propagate(&event.membership_id).await {
            Ok(outcome) => tracing::info!(
                member = %outcome.member_id,
                role = %outcome.role,
                group = %outcome.group,
                "{} added as {} to group {}",
                outcome.member_id,
                outcome.role,
                outcome.group
            ),
            Err(e) => tracing::error!(
                error = %e,
                membership_id = %event.membership_id,
                "group membership propagation failed"
            ),
        }
    }
}

#[async_trait::async_trait]
impl<R, P> EventProcessor for GroupSync<R, P>
where
    R: RangeSource + Send + Sync,
    P: Propagator + Send + Sync,
{
    async fn process(&self, body: &[u8]) -> SyncResponse {
        let invocation_id = Uuid::new_v4();
        self.handle(body)
            .instrument(tracing::info_span!(
                "group_event",
                %invocation_id,
                message_id = tracing::field::Empty
            ))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::Engine;
    use grp_directory::RecordingPropagator;
    use grp_ranges::{FailingRangeSource, StaticRangeSource};
    use serde_json::json;

    const OKTA_RANGES: &[&str] = &["3.209.158.224/28", "146.112.162.0/24"];

    fn push_body(caller_ip: Option<&str>, member: &str) -> Vec<u8> {
        let mut request_metadata = json!({});
        if let Some(ip) = caller_ip {
            request_metadata["callerIp"] = json!(ip);
        }
        let entry = json!({
            "protoPayload": {
                "requestMetadata": request_metadata,
                "metadata": {
                    "event": [ { "parameter": [ { "name": "USER_EMAIL", "value": member } ] } ]
                }
            }
        });
        let data = base64::engine::general_purpose::STANDARD.encode(entry.to_string());
        json!({ "message": { "data": data } }).to_string().into_bytes()
    }

    fn sync(okta_groups_only: bool) -> GroupSync<StaticRangeSource, RecordingPropagator> {
        GroupSync::new(
            StaticRangeSource::new(OKTA_RANGES.iter().copied()),
            RecordingPropagator::new(),
            okta_groups_only,
        )
    }

    #[test]
    fn decide_unrestricted_always_propagates() {
        assert_eq!(decide(false, "", OKTA_RANGES), Decision::Propagate);
        assert_eq!(decide(false, "8.8.8.8", OKTA_RANGES), Decision::Propagate);
        assert_eq!(decide(false, "garbage", OKTA_RANGES), Decision::Propagate);
    }

    #[test]
    fn decide_restricted() {
        assert_eq!(decide(true, "", OKTA_RANGES), Decision::SkipNoIp);
        assert_eq!(decide(true, "8.8.8.8", OKTA_RANGES), Decision::SkipNonOktaIp);
        assert_eq!(decide(true, "garbage", OKTA_RANGES), Decision::SkipNonOktaIp);
        assert_eq!(decide(true, "146.112.162.1", OKTA_RANGES), Decision::Propagate);
    }

    #[tokio::test]
    async fn trusted_ip_propagates_once_with_decoded_id() {
        let sync = sync(true);
        let res = sync
            .process(&push_body(Some("146.112.162.1"), "jane@example.com"))
            .await;
        assert_eq!(res, SyncResponse::processed());
        assert_eq!(sync.propagator.calls(), vec!["jane@example.com"]);
        assert_eq!(sync.ranges.fetch_count(), 1);
    }

    #[tokio::test]
    async fn untrusted_ip_is_acknowledged_without_propagation() {
        let sync = sync(true);
        let res = sync.process(&push_body(Some("8.8.8.8"), "jane@example.com")).await;
        assert_eq!(res, SyncResponse::not_okta_ip());
        assert_eq!(res.status, 200);
        assert!(sync.propagator.calls().is_empty());
    }

    #[tokio::test]
    async fn invalid_ip_is_treated_as_untrusted() {
        let sync = sync(true);
        let res = sync.process(&push_body(Some("10.0.0"), "jane@example.com")).await;
        assert_eq!(res, SyncResponse::not_okta_ip());
        assert!(sync.propagator.calls().is_empty());
    }

    #[tokio::test]
    async fn missing_ip_is_acknowledged_without_propagation() {
        let sync = sync(true);
        let res = sync.process(&push_body(None, "jane@example.com")).await;
        assert_eq!(res, SyncResponse::no_requesting_ip());
        assert_eq!(res.status, 200);
        assert!(sync.propagator.calls().is_empty());
    }

    #[tokio::test]
    async fn unrestricted_propagates_without_ip() {
        let sync = sync(false);
        let res = sync.process(&push_body(None, "jane@example.com")).await;
        assert_eq!(res, SyncResponse::processed());
        assert_eq!(sync.propagator.calls(), vec!["jane@example.com"]);
    }

    #[tokio::test]
    async fn empty_range_list_fails_without_propagation() {
        let sync = GroupSync::new(
            StaticRangeSource::new(Vec::<String>::new()),
            RecordingPropagator::new(),
            false,
        );
        let res = sync
            .process(&push_body(Some("146.112.162.1"), "jane@example.com"))
            .await;
        assert_eq!(res, SyncResponse::ranges_unavailable());
        assert_eq!(res.status, 500);
        assert!(sync.propagator.calls().is_empty());
    }

    #[tokio::test]
    async fn range_fetch_error_fails_without_propagation() {
        let sync = GroupSync::new(FailingRangeSource, RecordingPropagator::new(), false);
        let res = sync.process(&push_body(None, "jane@example.com")).await;
        assert_eq!(res.status, 500);
        assert!(sync.propagator.calls().is_empty());
    }

    #[tokio::test]
    async fn propagation_failure_still_acknowledges() {
        let sync = GroupSync::new(
            StaticRangeSource::new(OKTA_RANGES.iter().copied()),
            RecordingPropagator::failing(),
            true,
        );
        let res = sync
            .process(&push_body(Some("146.112.162.1"), "jane@example.com"))
            .await;
        assert_eq!(res, SyncResponse::processed());
        assert_eq!(sync.propagator.calls().len(), 1);
    }

    #[tokio::test]
    async fn undecodable_event_fails_before_fetching_ranges() {
        let sync = sync(true);
        let body = json!({ "message": { "data": "!!not-base64!!" } }).to_string();
        let res = sync.process(body.as_bytes()).await;
        assert_eq!(res, SyncResponse::event_error());
        assert_eq!(sync.ranges.fetch_count(), 0);
        assert!(sync.propagator.calls().is_empty());
    }
}
