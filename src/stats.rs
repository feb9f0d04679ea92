//! Statistics Model
//!
//! Typed view of the per-entity message statistics exposed by the host.
//!
//! - [`TimeSlice`]: one bucket of message throughput
//! - [`EntitySnapshot`]: all slices of one entity, captured during a poll
//! - [`ObjectName`]: `domain:key=value,...` naming used to discover entities

mod object_name;
mod slice;

pub use object_name::{ObjectName, ObjectNameError};
pub use slice::{EntityKey, EntitySnapshot, TimeSlice};
