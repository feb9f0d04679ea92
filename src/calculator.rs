//! Rate Calculator
//!
//! Turns the time slices of one entity into the number of messages seen
//! since the previous poll, with exactly-once accounting of completed
//! slices across polls.
//!
//! # Components
//!
//! - [`RateCalculator`]: backward scan over an [`EntitySnapshot`](crate::EntitySnapshot)
//! - [`ProcessedSliceCache`]: bounded FIFO set of slices already counted
//! - [`Rate`]: three-valued result (no data, confirmed zero, count)

mod cache;
mod rate;

pub use cache::{MAX_KEYS, ProcessedSliceCache, SliceKey};
pub use rate::{CalculatorError, Rate, RateCalculator, ZeroReport};
