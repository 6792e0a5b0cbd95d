//! Checks a parametric min-cut against max-flow computations from scratch at fixed λ.

use alloc::collections::BTreeMap;
use alloc::vec;
use alloc::vec::Vec;

use num_traits::float::FloatCore;
use petgraph::graphmap::DiGraphMap;
use petgraph::visit::{Bfs, Reversed};

use crate::algo::max_flow::push_relabel_max_flow;
use crate::amount::TOLERANCE;
use crate::breakpoints::Breakpoints;
use crate::error::Error;
use crate::id::VertexId;
use crate::network::Network;

/// The minimum cut at a single λ.
#[derive(Clone, Debug, PartialEq)]
pub struct ReferenceCut {
    pub value: f64,
    /// Vertices that cannot reach the sink in the residual graph of a maximum flow.
    pub source_side: Vec<bool>,
}

fn close(a: f64, b: f64) -> bool {
    FloatCore::abs(a - b) <= 1e-6 * (1.0 + FloatCore::abs(b))
}

/// Solves the max-flow problem at `lambda` with push-relabel and extracts the maximal
/// source side of the minimum cut.
pub fn reference_cut(network: &Network, lambda: f64) -> Result<ReferenceCut, Error> {
    let infinity = network.infinity();
    let mut capacities: BTreeMap<(VertexId, VertexId), f64> = BTreeMap::new();
    for &arc in network.forward_arcs() {
        let capacity = network.capacity(arc).evaluate(lambda);
        let capacity = if capacity >= infinity {
            f64::INFINITY
        } else {
            capacity
        };
        *capacities
            .entry((network.tail(arc), network.head(arc)))
            .or_default() += capacity;
    }

    // any finite min-cut is cheaper than a single unbounded arc
    let bounded: f64 = capacities.values().filter(|c| c.is_finite()).sum::<f64>() + 1.0;
    let mut graph: DiGraphMap<VertexId, f64> = DiGraphMap::new();
    for v in 0..network.vertex_count() {
        graph.add_node(v);
    }
    for (&(u, v), &capacity) in &capacities {
        graph.add_edge(u, v, if capacity.is_finite() { capacity } else { bounded });
    }

    let flow = push_relabel_max_flow(&graph, network.source(), network.sink())?;
    let net = |u: VertexId, v: VertexId| {
        flow.get(&(u, v)).copied().unwrap_or(0.0) - flow.get(&(v, u)).copied().unwrap_or(0.0)
    };

    let source = network.source();
    let value = flow
        .iter()
        .map(|(&(u, v), &f)| match (u == source, v == source) {
            (true, _) => f,
            (_, true) => -f,
            _ => 0.0,
        })
        .sum();

    let mut residual: DiGraphMap<VertexId, ()> = DiGraphMap::new();
    for v in 0..network.vertex_count() {
        residual.add_node(v);
    }
    for (u, v, &capacity) in graph.all_edges() {
        let scale = TOLERANCE * (1.0 + capacity);
        if capacity - net(u, v) > scale {
            residual.add_edge(u, v, ());
        }
        let back = graph.edge_weight(v, u).copied().unwrap_or(0.0);
        if back + net(u, v) > scale {
            residual.add_edge(v, u, ());
        }
    }

    let mut source_side = vec![true; network.vertex_count()];
    let mut bfs = Bfs::new(Reversed(&residual), network.sink());
    while let Some(v) = bfs.next(Reversed(&residual)) {
        source_side[v] = false;
    }

    Ok(ReferenceCut { value, source_side })
}

/// λ values strictly between consecutive levels, where the cut of the sweep is well defined,
/// plus one past the last level if it lies within `upper`.
pub fn sample_lambdas(breakpoints: &Breakpoints, upper: f64, count: usize) -> Vec<f64> {
    let levels = breakpoints.levels();
    let mut candidates: Vec<f64> = levels.windows(2).map(|w| (w[0] + w[1]) / 2.0).collect();
    match levels.last() {
        Some(&last) if last + 1.0 <= upper => candidates.push(last + 1.0),
        None => candidates.push(breakpoints.lower()),
        _ => {}
    }
    if count == 0 {
        return Vec::new();
    }
    let step = (candidates.len() / count).max(1);
    candidates.into_iter().step_by(step).take(count).collect()
}

/// Every level itself and a λ just below it, where a breakpoint reported too late or too early
/// changes the partition.
pub fn boundary_lambdas(breakpoints: &Breakpoints) -> Vec<f64> {
    let lower = breakpoints.lower();
    let levels = breakpoints.levels();
    let mut lambdas = Vec::with_capacity(2 * levels.len());
    let mut previous = lower;
    for &level in &levels {
        let before = level - (1e-6 * (1.0 + FloatCore::abs(level))).min((level - previous) / 2.0);
        if before > lower && before < level {
            lambdas.push(before);
        }
        lambdas.push(level);
        previous = level;
    }
    lambdas
}

/// Compares partition and cut value of `breakpoints` with a fresh max-flow at every λ in
/// `lambdas`.
pub fn check(network: &Network, breakpoints: &Breakpoints, lambdas: &[f64]) -> Result<(), Error> {
    for &lambda in lambdas {
        let reference = reference_cut(network, lambda)?;
        if let Some(vertex) = (0..network.vertex_count())
            .find(|&v| reference.source_side[v] != breakpoints.is_source_side(v, lambda))
        {
            return Err(Error::VerificationFailed { vertex, lambda });
        }
        if let Some(actual) = breakpoints.min_cut_value(lambda) {
            if !close(actual, reference.value) {
                return Err(Error::CutValueMismatch {
                    lambda,
                    expected: reference.value,
                    actual,
                });
            }
        }
        log::debug!("lambda {}: cut value {} confirmed", lambda, reference.value);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SweepConfig;
    use crate::flow_function::LinearFlowFunction;

    fn parallel_pair() -> Network {
        let mut builder = Network::builder(3, 0, 2).unwrap();
        builder
            .add_arc(0, 1, LinearFlowFunction::new(1.0, 1.0).unwrap())
            .unwrap();
        builder.add_arc(1, 2, 2.0).unwrap();
        builder.add_arc(1, 2, 1.0).unwrap();
        builder.build().unwrap()
    }

    #[test]
    fn reference_cut_of_a_parallel_pair() {
        let network = parallel_pair();

        let low = reference_cut(&network, 0.5).unwrap();
        assert_eq!(low.value, 1.5);
        assert_eq!(low.source_side, vec![true, false, false]);

        let high = reference_cut(&network, 4.0).unwrap();
        assert_eq!(high.value, 3.0);
        assert_eq!(high.source_side, vec![true, true, false]);
    }

    #[test]
    fn early_breakpoint_is_caught_at_the_level() {
        let network = parallel_pair();
        let breakpoints = crate::solve(&network, SweepConfig::new(0.0, 10.0).unwrap()).unwrap();
        assert_eq!(breakpoints.as_slice(), &[0.0, 2.0, f64::INFINITY]);

        let lambdas = boundary_lambdas(&breakpoints);
        assert_eq!(lambdas.len(), 3);
        assert_eq!(lambdas[0], 0.0);
        assert!(lambdas[1] < 2.0 && lambdas[1] > 1.99);
        assert_eq!(lambdas[2], 2.0);
        check(&network, &breakpoints, &lambdas).unwrap();

        // reported slightly early: invisible between levels, wrong at the level itself
        let early = Breakpoints::new(
            vec![0.0, 2.0 - 1e-7, f64::INFINITY],
            0.0,
            breakpoints.cut_segments().to_vec(),
            *breakpoints.stats(),
        );
        let between = sample_lambdas(&early, 10.0, 16);
        check(&network, &early, &between).unwrap();
        assert_eq!(
            check(&network, &early, &boundary_lambdas(&early)),
            Err(Error::VerificationFailed {
                vertex: 1,
                lambda: 2.0 - 1e-7
            })
        );
    }
}
