//! Process configuration, read once at startup and passed to the handler.

use grp_directory::{DEFAULT_API_URL, DEFAULT_METADATA_HOST};
use grp_ranges::DEFAULT_RANGES_URL;
use std::fmt;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};

const DEFAULT_LISTEN: SocketAddr = SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), 8080);

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("invalid value for {key}: {value}")]
    Invalid { key: &'static str, value: String },
}

/// Read-only settings for the filter.
#[derive(Clone)]
pub struct SyncConfig {
    /// `PARENT_GROUP`: stable id of the group that receives members.
    pub parent_group: String,
    /// `OKTA_GROUPS_ONLY`: only the exact string `True` enables it.
    pub okta_groups_only: bool,
    pub ranges_url: String,
    pub directory_url: String,
    pub quota_project: Option<String>,
    /// Fixed bearer token for local runs; the metadata server is used when unset.
    pub static_token: Option<String>,
    pub metadata_host: String,
    pub listen: SocketAddr,
}

impl fmt::Debug for SyncConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyncConfig")
            .field("parent_group", &self.parent_group)
            .field("okta_groups_only", &self.okta_groups_only)
            .field("ranges_url", &self.ranges_url)
            .field("directory_url", &self.directory_url)
            .field("quota_project", &self.quota_project)
            .field("static_token", &self.static_token.as_ref().map(|_| "[REDACTED]"))
            .field("metadata_host", &self.metadata_host)
            .field("listen", &self.listen)
            .finish()
    }
}

impl SyncConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.is_empty());

        let parent_group = get("PARENT_GROUP").ok_or(ConfigError::Missing("PARENT_GROUP"))?;
        let okta_groups_only = lookup("OKTA_GROUPS_ONLY").as_deref() == Some("True");

        let listen: SocketAddr = match (get("GROUPSYNC_LISTEN"), get("PORT")) {
            (Some(addr), _) => addr.parse().map_err(|_| ConfigError::Invalid {
                key: "GROUPSYNC_LISTEN",
                value: addr.clone(),
            })?,
            (None, Some(port)) => {
                let port: u16 = port.parse().map_err(|_| ConfigError::Invalid {
                    key: "PORT",
                    value: port.clone(),
                })?;
                SocketAddr::from(([0, 0, 0, 0], port))
            }
            (None, None) => DEFAULT_LISTEN,
        };

        Ok(Self {
            parent_group,
            okta_groups_only,
            ranges_url: get("OKTA_IP_RANGES_URL")
                .unwrap_or_else(|| DEFAULT_RANGES_URL.to_string()),
            directory_url: get("CLOUD_IDENTITY_API_URL")
                .unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            quota_project: get("QUOTA_PROJECT"),
            static_token: get("GOOGLE_OAUTH_ACCESS_TOKEN"),
            metadata_host: get("GCE_METADATA_HOST")
                .unwrap_or_else(|| DEFAULT_METADATA_HOST.to_string()),
            listen,
        })
    }
}
