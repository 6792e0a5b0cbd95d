use core::fmt::Debug;

use crate::breakpoints::Breakpoints;
use crate::network::Network;

pub mod ibfs;
pub mod max_flow;

/// An algorithm computing the breakpoint of every vertex of a parametric network.
pub trait ParametricMinCut {
    type Error: Debug;

    fn parametric_min_cut(&mut self, network: &Network) -> Result<Breakpoints, Self::Error>;
}
