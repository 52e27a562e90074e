//! rf-units: unit operation library for recycleflow flowsheets.
//!
//! Provides generic models for common flowsheet elements:
//! - Mixers and splitters
//! - Fractional-conversion reactors
//! - Heaters and a volatility-based flash
//! - A pass-through host for stand-alone process specifications
//!
//! All models implement the `UnitModel` trait and are deterministic functions
//! of their inlet streams and parameters, as required for fixed-point
//! convergence of recycle loops.
//!
//! # Example
//!
//! ```
//! use rf_stream::{Chemicals, Stream};
//! use rf_units::{Splitter, UnitModel};
//!
//! let chems = Chemicals::from_pairs(&[("Water", 18.015)]).unwrap();
//! let splitter = Splitter::uniform(0.25).unwrap();
//! let feed = Stream::from_flows(vec![100.0]).unwrap();
//! let mut outs = vec![Stream::new(1), Stream::new(1)];
//!
//! splitter.run(&chems, &[feed], &mut outs).unwrap();
//! assert_eq!(outs[0].flows(), &[25.0]);
//! assert_eq!(outs[1].flows(), &[75.0]);
//! ```

pub mod common;
pub mod conversion;
pub mod error;
pub mod flash;
pub mod heater;
pub mod mixer;
pub mod pass_through;
pub mod splitter;
pub mod traits;

pub use conversion::Conversion;
pub use error::{UnitError, UnitResult};
pub use flash::Flash;
pub use heater::Heater;
pub use mixer::Mixer;
pub use pass_through::PassThrough;
pub use splitter::{SplitSpec, Splitter};
pub use traits::{Arity, PortCount, UnitModel};
