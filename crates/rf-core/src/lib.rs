//! rf-core: stable foundation for recycleflow.
//!
//! Contains:
//! - ids (compact IDs for streams, units, systems, chemicals)
//! - numeric (Real, tolerances, relative change, finiteness checks)
//! - units (uom SI types for the stream state edge)
//! - error (shared error types)

pub mod error;
pub mod ids;
pub mod numeric;
pub mod units;

pub use error::{RfError, RfResult};
pub use ids::*;
pub use numeric::*;
pub use units::*;
