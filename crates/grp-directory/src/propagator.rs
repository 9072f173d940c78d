//! Adds principals to the configured parent group.

use crate::token::CLOUD_IDENTITY_GROUPS_SCOPE;
use grp_types::{
    DirectoryError, GroupDirectory, Membership, MembershipOutcome, PropagationError, Propagator,
    TokenProvider, MEMBER_ROLE,
};

/// Propagator that resolves the parent group and creates a `MEMBER` membership in it.
/// Nothing is cached: every call fetches a token and looks the group up again.
pub struct CloudIdentityPropagator<T, D> {
    pub tokens: T,
    pub directory: D,
    /// Stable key of the parent group (usually its email).
    pub parent_group: String,
}

impl<T, D> CloudIdentityPropagator<T, D>
where
    T: TokenProvider + Send + Sync,
    D: GroupDirectory + Send + Sync,
{
    pub fn new(tokens: T, directory: D, parent_group: impl Into<String>) -> Self {
        Self {
            tokens,
            directory,
            parent_group: parent_group.into(),
        }
    }
}

#[async_trait::async_trait]
impl<T, D> Propagator for CloudIdentityPropagator<T, D>
where
    T: TokenProvider + Send + Sync,
    D: GroupDirectory + Send + Sync,
{
    async fn propagate(&self, membership_id: &str) -> Result<MembershipOutcome, PropagationError> {
        let token = self
            .tokens
            .access_token(&[CLOUD_IDENTITY_GROUPS_SCOPE])
            .await?;
        let group = self
            .directory
            .lookup_group_name(&token, &self.parent_group)
            .await?;
        let membership = Membership::member(membership_id);
        let op = self
            .directory
            .create_membership(&token, &group, &membership)
            .await?;
        if let Some(status) = op.error {
            return Err(DirectoryError::Operation(format!(
                "code={} {}",
                status.code.unwrap_or_default(),
                status.message.unwrap_or_default()
            ))
            .into());
        }
        let resource = op.response.unwrap_or_default();
        let member_id = resource
            .preferred_member_key
            .map(|k| k.id)
            .unwrap_or_else(|| membership_id.to_string());
        let role = resource
            .roles
            .into_iter()
            .next()
            .map(|r| r.name)
            .unwrap_or_else(|| MEMBER_ROLE.to_string());
        Ok(MembershipOutcome {
            member_id,
            role,
            group,
        })
    }
}
