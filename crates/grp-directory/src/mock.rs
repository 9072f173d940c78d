//! Recording propagator for tests: no network, remembers every call.

use grp_types::{DirectoryError, MembershipOutcome, PropagationError, Propagator, MEMBER_ROLE};
use std::sync::Mutex;

/// Propagator that records membership ids and either succeeds or fails every call.
pub struct RecordingPropagator {
    calls: Mutex<Vec<String>>,
    fail: bool,
}

impl RecordingPropagator {
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            fail: false,
        }
    }

    /// Every call is recorded, then returns a directory error.
    pub fn failing() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }
}

impl Default for RecordingPropagator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl Propagator for RecordingPropagator {
    async fn propagate(&self, membership_id: &str) -> Result<MembershipOutcome, PropagationError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(membership_id.to_string());
        }
        if self.fail {
            return Err(DirectoryError::Api {
                status: 403,
                body: "permission denied".to_string(),
            }
            .into());
        }
        Ok(MembershipOutcome {
            member_id: membership_id.to_string(),
            role: MEMBER_ROLE.to_string(),
            group: "groups/recorded".to_string(),
        })
    }
}
