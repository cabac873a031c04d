//! # Octopus-Ditto Core
//!
//! Ditto protocol model used by the Octopus bridge.
//!
//! This crate provides:
//! - Thing identifiers (`namespace:name`)
//! - Topic paths (`{namespace}/{name}/things/{channel}/{criterion}/...`)
//! - Case-insensitive protocol headers
//! - The `Adaptable` message and its JSON envelope

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod adaptable;
pub mod headers;
pub mod thing_id;
pub mod topic;

pub use adaptable::{format_as_string, normalize_pointer, Adaptable, Payload, ProtocolError};
pub use headers::DittoHeaders;
pub use thing_id::{ThingId, ThingIdError};
pub use topic::{Channel, Criterion, Group, TopicError, TopicPath};
