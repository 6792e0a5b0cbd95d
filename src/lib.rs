//! Parametric minimum cut by incremental breadth-first search.
//!
//! Capacities of the arcs leaving the source may grow linearly with a parameter λ. For every
//! vertex the crate computes the λ at which it stops reaching the sink in the residual graph of
//! a maximum flow, i.e. joins the source side of the (maximal) minimum cut. All breakpoints are
//! found in one sweep over λ that reuses search trees and flow between levels.
//!
//! ```
//! use parametric_mincut::{solve, LinearFlowFunction, Network, SweepConfig};
//!
//! let mut builder = Network::builder(4, 0, 3)?;
//! builder.add_arc(0, 1, LinearFlowFunction::new(0.0, 1.0)?)?;
//! builder.add_arc(1, 3, 5.0)?;
//! builder.add_arc(0, 2, 3.0)?;
//! builder.add_arc(2, 3, 3.0)?;
//! let network = builder.build()?;
//!
//! let breakpoints = solve(&network, SweepConfig::new(0.0, 10.0)?)?;
//! assert_eq!(breakpoints.as_slice(), &[0.0, 5.0, 0.0, f64::INFINITY]);
//! assert_eq!(breakpoints.min_cut_value(2.0), Some(5.0));
//! # Ok::<(), parametric_mincut::Error>(())
//! ```

#![no_std]
#![deny(
    warnings,
    trivial_casts,
    trivial_numeric_casts,
    unused_import_braces,
    unused_qualifications,
    rust_2018_idioms
)]
#![forbid(unsafe_code)]

extern crate alloc;

pub mod algo;
pub mod amount;
pub mod breakpoints;
pub mod config;
pub mod dimacs;
pub mod error;
pub mod flow_function;
pub mod id;
pub mod instance;
pub mod network;
pub mod residual;
pub mod verify;

pub use crate::algo::ibfs::{ParametricIbfs, Sweep, SweepStats};
pub use crate::algo::ParametricMinCut;
pub use crate::amount::{Amount, LinearAmount};
pub use crate::breakpoints::{BreakpointRow, Breakpoints, CutSegment};
pub use crate::config::SweepConfig;
pub use crate::error::{Error, InvariantViolation};
pub use crate::flow_function::{FlowFunction, LinearFlowFunction};
pub use crate::id::{ArcId, VertexId};
pub use crate::instance::{Instance, RawArc};
pub use crate::network::{Network, NetworkBuilder, NetworkStats, DEFAULT_INFINITY};

/// Computes the breakpoint of every vertex of `network` over the λ range of `config`.
pub fn solve(network: &Network, config: SweepConfig) -> Result<Breakpoints, Error> {
    log::info!("{}", network.stats());
    ParametricIbfs::new(config).parametric_min_cut(network)
}
