//! rf-flowsheet: flowsheet model layer for recycleflow.
//!
//! Provides:
//! - The `Flowsheet` context (chemicals, streams, units, systems, groups)
//! - An incremental builder with assembly validation
//! - System hierarchy: paths, recycle edges, facility overlay
//! - Specification and convergence option data consumed by the solver
//! - Path-order analysis and accounting views
//!
//! # Example
//!
//! ```
//! use rf_flowsheet::{FlowsheetBuilder, SystemDef, Element};
//! use rf_stream::Stream;
//! use rf_units::{Mixer, Splitter};
//!
//! let mut b = FlowsheetBuilder::new("demo");
//! b.add_chemical("Water", 18.015).unwrap();
//! let feed = b.add_feed("feed", Stream::from_flows(vec![100.0]).unwrap());
//! let mixed = b.add_stream("mixed");
//! let product = b.add_stream("product");
//! let recycle = b.add_stream("recycle");
//! let m = b.add_unit("M1", Mixer::new(), &[feed, recycle], &[mixed]);
//! let s = b.add_unit("S1", Splitter::uniform(0.8).unwrap(), &[mixed], &[product, recycle]);
//! let edge = b.recycle(recycle).unwrap();
//! let sys = b.add_system(
//!     SystemDef::new("loop")
//!         .with_path(vec![Element::Unit(m), Element::Unit(s)])
//!         .with_recycle(edge),
//! );
//! let fs = b.build().unwrap();
//!
//! assert_eq!(fs.system(sys).unwrap().recycles.len(), 1);
//! ```

pub mod accounting;
pub mod builder;
pub mod error;
pub mod flowsheet;
pub mod options;
pub mod ordering;
pub mod spec;
pub mod system;
pub(crate) mod validate;

pub use accounting::Accounting;
pub use builder::FlowsheetBuilder;
pub use error::{FlowsheetError, FlowsheetResult};
pub use flowsheet::{Flowsheet, Port, StreamEntry, Unit, UnitGroup};
pub use options::{ConvergenceMethod, ConvergenceOptions};
pub use ordering::{BackEdge, PathOrder};
pub use spec::{
    ControlVariable, FailurePolicy, Measurement, SearchMethod, SearchSpec, SecantSeed,
    Specification,
};
pub use system::{Element, RecycleEdge, System, SystemDef};
