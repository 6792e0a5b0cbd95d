use alloc::vec;
use alloc::vec::Vec;
use core::ops::Range;

use displaydoc::Display;
use itertools::{Itertools, MinMaxResult};
use serde::Serialize;

use crate::error::Error;
use crate::flow_function::FlowFunction;
use crate::id::{ArcId, VertexId};

/// Capacities at or above this value are unbounded unless configured otherwise.
pub const DEFAULT_INFINITY: f64 = (i32::MAX / 2) as f64;

/// A flow network with a designated source and sink.
///
/// Every arc added to the builder becomes a forward arc paired with a reverse arc of capacity
/// zero. Arcs are laid out by tail so that the arcs leaving a vertex form a contiguous range.
#[derive(Clone, Debug)]
pub struct Network {
    vertex_count: usize,
    source: VertexId,
    sink: VertexId,
    infinity: f64,
    tails: Vec<VertexId>,
    heads: Vec<VertexId>,
    capacities: Vec<FlowFunction>,
    reverse: Vec<ArcId>,
    first_out: Vec<ArcId>,
    forward: Vec<ArcId>,
    parametric: Vec<ArcId>,
}

impl Network {
    pub fn builder(
        vertex_count: usize,
        source: VertexId,
        sink: VertexId,
    ) -> Result<NetworkBuilder, Error> {
        NetworkBuilder::new(vertex_count, source, sink)
    }

    pub fn vertex_count(&self) -> usize {
        self.vertex_count
    }

    /// Number of arcs including reverse partners.
    pub fn arc_count(&self) -> usize {
        self.heads.len()
    }

    pub fn source(&self) -> VertexId {
        self.source
    }

    pub fn sink(&self) -> VertexId {
        self.sink
    }

    pub fn infinity(&self) -> f64 {
        self.infinity
    }

    pub fn tail(&self, arc: ArcId) -> VertexId {
        self.tails[arc]
    }

    pub fn head(&self, arc: ArcId) -> VertexId {
        self.heads[arc]
    }

    pub fn reverse(&self, arc: ArcId) -> ArcId {
        self.reverse[arc]
    }

    pub fn out_arcs(&self, vertex: VertexId) -> Range<ArcId> {
        self.first_out[vertex]..self.first_out[vertex + 1]
    }

    pub fn capacity(&self, arc: ArcId) -> &FlowFunction {
        &self.capacities[arc]
    }

    /// The arc created for the `index`-th arc handed to the builder.
    pub fn forward_arc(&self, index: usize) -> ArcId {
        self.forward[index]
    }

    pub fn forward_arcs(&self) -> &[ArcId] {
        &self.forward
    }

    pub fn parametric_arcs(&self) -> &[ArcId] {
        &self.parametric
    }

    pub fn stats(&self) -> NetworkStats {
        let degrees = (0..self.vertex_count).map(|v| self.out_arcs(v).len());
        let (min_degree, max_degree) = match degrees.clone().minmax() {
            MinMaxResult::NoElements => (0, 0),
            MinMaxResult::OneElement(d) => (d, d),
            MinMaxResult::MinMax(min, max) => (min, max),
        };

        NetworkStats {
            vertices: self.vertex_count,
            arcs: self.forward.len(),
            parametric: self.parametric.len(),
            unbounded: self
                .forward
                .iter()
                .filter(|&&a| self.capacities[a].is_unbounded())
                .count(),
            min_degree,
            max_degree,
            isolated: degrees.filter(|&d| d == 0).count(),
        }
    }
}

/// Summary figures of a network, logged before a run.
#[derive(Clone, Copy, Debug, Display, PartialEq, Eq, Serialize)]
/// {vertices} vertices, {arcs} arcs ({parametric} parametric, {unbounded} unbounded), degree {min_degree}..{max_degree}, {isolated} isolated
pub struct NetworkStats {
    pub vertices: usize,
    pub arcs: usize,
    pub parametric: usize,
    pub unbounded: usize,
    pub min_degree: usize,
    pub max_degree: usize,
    pub isolated: usize,
}

#[derive(Clone, Debug)]
pub struct NetworkBuilder {
    vertex_count: usize,
    source: VertexId,
    sink: VertexId,
    infinity: f64,
    arcs: Vec<(VertexId, VertexId, FlowFunction)>,
}

impl NetworkBuilder {
    pub fn new(vertex_count: usize, source: VertexId, sink: VertexId) -> Result<Self, Error> {
        if vertex_count == 0 {
            return Err(Error::EmptyNetwork);
        }
        for vertex in [source, sink] {
            if vertex >= vertex_count {
                return Err(Error::VertexOutOfRange {
                    vertex,
                    vertex_count,
                });
            }
        }
        if source == sink {
            return Err(Error::SourceIsSink(source));
        }

        Ok(Self {
            vertex_count,
            source,
            sink,
            infinity: DEFAULT_INFINITY,
            arcs: Vec::new(),
        })
    }

    /// Constant capacities at or above `infinity` are treated as unbounded, including those of
    /// arcs added before the call.
    pub fn with_infinity(mut self, infinity: f64) -> Result<Self, Error> {
        if infinity.is_nan() || infinity <= 0.0 {
            return Err(Error::InvalidInfinity(infinity));
        }
        self.infinity = infinity;
        Ok(self)
    }

    /// Registers an arc and its reverse partner, returning the arc's index in insertion order.
    pub fn add_arc(
        &mut self,
        tail: VertexId,
        head: VertexId,
        capacity: impl Into<FlowFunction>,
    ) -> Result<usize, Error> {
        let arc = self.arcs.len();
        for vertex in [tail, head] {
            if vertex >= self.vertex_count {
                return Err(Error::VertexOutOfRange {
                    vertex,
                    vertex_count: self.vertex_count,
                });
            }
        }
        if tail == head {
            return Err(Error::SelfLoop { arc, vertex: tail });
        }

        let capacity = match capacity.into() {
            FlowFunction::Constant(c) if c.is_nan() => return Err(Error::InvalidCapacity { arc }),
            FlowFunction::Linear(f) if f.slope() == 0.0 => FlowFunction::Constant(f.offset()),
            capacity => capacity,
        };
        if capacity.slope() < 0.0 {
            return Err(Error::DecreasingCapacity {
                arc,
                slope: capacity.slope(),
            });
        }
        if capacity.is_parametric() && tail != self.source {
            return Err(Error::ParametricArcOffSource { arc });
        }
        self.arcs.push((tail, head, capacity));
        Ok(arc)
    }

    pub fn build(self) -> Result<Network, Error> {
        if self.arcs.is_empty() {
            return Err(Error::EmptyNetwork);
        }

        // even slots hold forward arcs, odd slots their reverse partners
        let infinity = self.infinity;
        let half_arcs: Vec<_> = self
            .arcs
            .iter()
            .flat_map(|&(tail, head, capacity)| {
                let capacity = match capacity {
                    FlowFunction::Constant(c) if c >= infinity => FlowFunction::UNBOUNDED,
                    capacity => capacity,
                };
                [(tail, head, capacity), (head, tail, FlowFunction::Constant(0.0))]
            })
            .collect();

        let mut order: Vec<usize> = (0..half_arcs.len()).collect();
        order.sort_by_key(|&i| half_arcs[i].0);
        let mut position = vec![0; half_arcs.len()];
        for (arc, &i) in order.iter().enumerate() {
            position[i] = arc;
        }

        let mut first_out = vec![0; self.vertex_count + 1];
        for &(tail, _, _) in &half_arcs {
            first_out[tail + 1] += 1;
        }
        for v in 0..self.vertex_count {
            first_out[v + 1] += first_out[v];
        }

        let tails = order.iter().map(|&i| half_arcs[i].0).collect();
        let heads = order.iter().map(|&i| half_arcs[i].1).collect();
        let capacities: Vec<_> = order.iter().map(|&i| half_arcs[i].2).collect();
        let reverse = order.iter().map(|&i| position[i ^ 1]).collect();
        let forward: Vec<_> = (0..self.arcs.len()).map(|k| position[2 * k]).collect();
        let parametric = forward
            .iter()
            .copied()
            .filter(|&a| capacities[a].is_parametric())
            .collect();

        log::debug!(
            "built network with {} vertices and {} arcs",
            self.vertex_count,
            self.arcs.len()
        );

        Ok(Network {
            vertex_count: self.vertex_count,
            source: self.source,
            sink: self.sink,
            infinity: self.infinity,
            tails,
            heads,
            capacities,
            reverse,
            first_out,
            forward,
            parametric,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flow_function::LinearFlowFunction;

    fn diamond() -> Network {
        let mut builder = Network::builder(4, 0, 3).unwrap();
        builder
            .add_arc(0, 1, LinearFlowFunction::new(0.0, 1.0).unwrap())
            .unwrap();
        builder.add_arc(1, 3, 5.0).unwrap();
        builder.add_arc(0, 2, 3.0).unwrap();
        builder.add_arc(2, 3, 3.0).unwrap();
        builder.build().unwrap()
    }

    #[test]
    fn arcs_are_paired_and_grouped_by_tail() {
        let network = diamond();
        assert_eq!(network.arc_count(), 8);
        for arc in 0..network.arc_count() {
            let reverse = network.reverse(arc);
            assert_eq!(network.reverse(reverse), arc);
            assert_eq!(network.tail(arc), network.head(reverse));
            assert!(network.out_arcs(network.tail(arc)).contains(&arc));
        }
        let first = network.forward_arc(0);
        assert_eq!((network.tail(first), network.head(first)), (0, 1));
        assert_eq!(network.parametric_arcs(), &[first]);
        assert_eq!(network.out_arcs(0).len(), 2);
        assert_eq!(network.out_arcs(3).len(), 2);
    }

    #[test]
    fn construction_errors() {
        assert_eq!(
            Network::builder(3, 1, 1).unwrap_err(),
            Error::SourceIsSink(1)
        );
        assert_eq!(
            Network::builder(3, 0, 3).unwrap_err(),
            Error::VertexOutOfRange {
                vertex: 3,
                vertex_count: 3
            }
        );
        assert_eq!(Network::builder(0, 0, 1).unwrap_err(), Error::EmptyNetwork);

        let mut builder = Network::builder(3, 0, 2).unwrap();
        assert_eq!(
            builder.add_arc(1, 1, 2.0),
            Err(Error::SelfLoop { arc: 0, vertex: 1 })
        );
        assert_eq!(
            builder.add_arc(1, 7, 2.0),
            Err(Error::VertexOutOfRange {
                vertex: 7,
                vertex_count: 3
            })
        );
        assert_eq!(
            builder.add_arc(1, 2, LinearFlowFunction::new(0.0, 1.0).unwrap()),
            Err(Error::ParametricArcOffSource { arc: 0 })
        );
        assert_eq!(
            builder.add_arc(0, 2, f64::NAN),
            Err(Error::InvalidCapacity { arc: 0 })
        );
        assert_eq!(builder.build().unwrap_err(), Error::EmptyNetwork);
    }

    #[test]
    fn capacities_above_the_threshold_are_unbounded() {
        let mut builder = Network::builder(3, 0, 2)
            .unwrap()
            .with_infinity(100.0)
            .unwrap();
        builder.add_arc(0, 1, 100.0).unwrap();
        builder.add_arc(1, 2, 99.0).unwrap();
        let network = builder.build().unwrap();
        assert!(network.capacity(network.forward_arc(0)).is_unbounded());
        assert!(!network.capacity(network.forward_arc(1)).is_unbounded());

        let stats = network.stats();
        assert_eq!(stats.unbounded, 1);
        assert_eq!(stats.arcs, 2);
        assert_eq!((stats.min_degree, stats.max_degree), (1, 2));
        assert_eq!(stats.isolated, 0);
    }

    #[test]
    fn threshold_applies_to_arcs_added_earlier() {
        let mut builder = Network::builder(3, 0, 2).unwrap();
        builder.add_arc(0, 1, 10.0).unwrap();
        builder.add_arc(1, 2, 4.0).unwrap();
        let network = builder.with_infinity(6.0).unwrap().build().unwrap();
        assert!(network.capacity(network.forward_arc(0)).is_unbounded());
        assert_eq!(network.capacity(network.forward_arc(1)).evaluate(0.0), 4.0);
    }
}
