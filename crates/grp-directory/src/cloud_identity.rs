//! HTTP client for the Cloud Identity v1 groups API.

use grp_types::{
    AccessToken, DirectoryError, GroupDirectory, LookupGroupNameResponse, Membership, Operation,
};
use serde::de::DeserializeOwned;

pub const DEFAULT_API_URL: &str = "https://cloudidentity.googleapis.com";

/// GroupDirectory backed by `cloudidentity.googleapis.com` (or a compatible base URL).
pub struct CloudIdentityClient {
    client: reqwest::Client,
    base_url: String,
    quota_project: Option<String>,
}

impl CloudIdentityClient {
    pub fn new(base_url: impl Into<String>, quota_project: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            quota_project,
        }
    }

    fn authorized(
        &self,
        req: reqwest::RequestBuilder,
        token: &AccessToken,
    ) -> reqwest::RequestBuilder {
        let req = req.bearer_auth(&token.token);
        match self.quota_project {
            Some(ref project) => req.header("x-goog-user-project", project),
            None => req,
        }
    }

    async fn send_json<T: DeserializeOwned>(
        req: reqwest::RequestBuilder,
    ) -> Result<T, DirectoryError> {
        let res = req
            .send()
            .await
            .map_err(|e| DirectoryError::Http(e.to_string()))?;
        let status = res.status();
        let body = res
            .text()
            .await
            .map_err(|e| DirectoryError::Http(e.to_string()))?;
        if !status.is_success() {
            return Err(DirectoryError::Api {
                status: status.as_u16(),
                body,
            });
        }
        serde_json::from_str(&body).map_err(|e| DirectoryError::Parse(e.to_string()))
    }
}

#[async_trait::async_trait]
impl GroupDirectory for CloudIdentityClient {
    async fn lookup_group_name(
        &self,
        token: &AccessToken,
        group_key_id: &str,
    ) -> Result<String, DirectoryError> {
        // groupKey.id is appended to the base query, which already carries alt=json.
        let url = format!("{}/v1/groups:lookup?alt=json", self.base_url);
        let req = self
            .client
            .get(url)
            .query(&[("groupKey.id", group_key_id)]);
        let res: LookupGroupNameResponse = Self::send_json(self.authorized(req, token)).await?;
        let name = res.name.ok_or(DirectoryError::MissingField("name"))?;
        tracing::debug!(group_key_id, group = %name, "resolved parent group");
        Ok(name)
    }

    async fn create_membership(
        &self,
        token: &AccessToken,
        group_name: &str,
        membership: &Membership,
    ) -> Result<Operation, DirectoryError> {
        let url = format!("{}/v1/{}/memberships?alt=json", self.base_url, group_name);
        let req = self.client.post(url).json(membership);
        Self::send_json(self.authorized(req, token)).await
    }
}
