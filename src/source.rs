//! Statistics Sources
//!
//! Where entity statistics come from. The collector only sees the traits in
//! this module; concrete sources live in submodules.
//!
//! - [`SourceProvider`]: lazily resolves a [`StatisticsSource`]
//! - [`StatisticsSource`]: discovers entities by [`ObjectName`](crate::ObjectName) pattern
//! - [`EntityHandle`]: reads one entity's time slices
//! - [`http`]: host introspection over HTTP/JSON
//! - [`memory`]: in-process source for embedding and tests

pub mod http;
pub mod memory;
mod traits;

pub use traits::{EntityHandle, SourceError, SourceProvider, StatisticsSource};
