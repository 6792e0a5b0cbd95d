use alloc::vec::Vec;

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::flow_function::{FlowFunction, LinearFlowFunction};
use crate::id::VertexId;
use crate::network::{Network, DEFAULT_INFINITY};

/// An arc as read from input, with the capacity `capacity + slope * λ`.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize, Serialize)]
pub struct RawArc {
    pub tail: VertexId,
    pub head: VertexId,
    pub capacity: f64,
    #[serde(default)]
    pub slope: f64,
}

impl RawArc {
    pub fn flow_function(&self) -> Result<FlowFunction, Error> {
        if self.slope == 0.0 {
            Ok(FlowFunction::Constant(self.capacity))
        } else {
            LinearFlowFunction::new(self.capacity, self.slope).map(FlowFunction::from)
        }
    }
}

fn default_infinity() -> f64 {
    DEFAULT_INFINITY
}

/// An unvalidated parametric min-cut instance.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct Instance {
    pub vertex_count: usize,
    pub source: VertexId,
    pub sink: VertexId,
    pub arcs: Vec<RawArc>,
    #[serde(default = "default_infinity")]
    pub infinity: f64,
}

impl Instance {
    pub fn new(vertex_count: usize, source: VertexId, sink: VertexId, arcs: Vec<RawArc>) -> Self {
        Self {
            vertex_count,
            source,
            sink,
            arcs,
            infinity: DEFAULT_INFINITY,
        }
    }
}

impl TryFrom<&Instance> for Network {
    type Error = Error;

    fn try_from(instance: &Instance) -> Result<Self, Self::Error> {
        let mut builder = Network::builder(instance.vertex_count, instance.source, instance.sink)?
            .with_infinity(instance.infinity)?;
        for (index, arc) in instance.arcs.iter().enumerate() {
            let capacity = arc.flow_function().map_err(|e| at_arc(e, index))?;
            builder.add_arc(arc.tail, arc.head, capacity)?;
        }
        builder.build()
    }
}

impl TryFrom<Instance> for Network {
    type Error = Error;

    fn try_from(instance: Instance) -> Result<Self, Self::Error> {
        Self::try_from(&instance)
    }
}

/// Points a capacity error raised outside of a network at the arc it belongs to.
fn at_arc(e: Error, arc: usize) -> Error {
    match e {
        Error::InvalidCapacity { .. } => Error::InvalidCapacity { arc },
        Error::DecreasingCapacity { slope, .. } => Error::DecreasingCapacity { arc, slope },
        e => e,
    }
}
