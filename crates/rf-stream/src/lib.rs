//! rf-stream: material stream values for recycleflow.
//!
//! Provides:
//! - Chemical registry (names, molar masses)
//! - `Stream`: the edge value flowing between units (molar flows, T, P, phase, price)
//! - Difference metric used by the convergence driver
//!
//! # Example
//!
//! ```
//! use rf_stream::{Chemicals, Stream, StreamTolerance};
//!
//! let chems = Chemicals::from_pairs(&[("Water", 18.015), ("Ethanol", 46.07)]).unwrap();
//! let a = Stream::from_flows(vec![100.0, 5.0]).unwrap();
//! let b = Stream::from_flows(vec![100.5, 5.0]).unwrap();
//!
//! assert!(a.mass_flow(&chems) > 0.0);
//! assert!(rf_stream::difference(&a, &b).within(&StreamTolerance::default()));
//! ```

pub mod chemicals;
pub mod error;
pub mod metric;
pub mod stream;

pub use chemicals::{Chemical, Chemicals};
pub use error::{StreamError, StreamResult};
pub use metric::{FlowChange, StreamDifference, StreamTolerance, difference, distance};
pub use stream::{Phase, Stream};
