//! Event decoding and the propagation policy that ties ranges, classifier, and propagator together.

pub mod decoder;
mod policy;

pub use decoder::{decode_message_data, decode_push_body};
pub use grp_types::{Decision, EventProcessor, MembershipEvent, SyncResponse};
pub use policy::{decide, GroupSync};
