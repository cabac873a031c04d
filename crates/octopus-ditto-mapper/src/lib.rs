//! # Octopus-Ditto Mapper
//!
//! Bidirectional payload mapping between Octopus protobuf device messages and
//! Ditto protocol messages.
//!
//! ## Inbound (device → Ditto)
//!
//! - BME680 readings → twin merge command on `/features`
//! - Events → live message on `/features/temperature/outbox/messages/{name}`
//!
//! ## Outbound (Ditto → device)
//!
//! - Live messages → `Action`
//! - Commands on `/features/configuration` → `Configuration`
//!
//! Anything else maps to nothing. Only inbound decoding can fail.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod charset;
pub mod external;
pub mod inbound;
pub mod mapper;
pub mod octopus;
pub mod outbound;
pub mod registry;

pub use external::{ExternalMessage, ExternalPayload};
pub use mapper::{MappingError, MappingFailure, MessageMapper};
pub use octopus::{OctopusProtobufMapper, MAPPER_ALIAS};
pub use registry::{MapperRegistry, RegistryError};
