//! Cloud Identity groups client and the parent-group membership propagator.

mod cloud_identity;
#[cfg(feature = "test-util")]
pub mod mock;
mod propagator;
mod token;

pub use cloud_identity::{CloudIdentityClient, DEFAULT_API_URL};
pub use grp_types::{
    DirectoryError, GroupDirectory, PropagationError, Propagator, TokenError, TokenProvider,
};
pub use propagator::CloudIdentityPropagator;
pub use token::{
    AnyTokenProvider, MetadataTokenProvider, StaticTokenProvider, CLOUD_IDENTITY_GROUPS_SCOPE,
    DEFAULT_METADATA_HOST,
};

#[cfg(feature = "test-util")]
pub use mock::RecordingPropagator;
