//! Incremental breadth-first search over a monotone sweep of λ.
//!
//! Two search trees, rooted at the source and at the sink, are grown alternately, always
//! extending the shallower one. Whenever they meet the path between the roots is augmented,
//! vertices cut off by saturated arcs are adopted or released, and growth resumes. Between
//! levels the trees and the flow rates are kept: at the next arc breakpoint only the arcs that
//! ran out or became unbounded are revisited, and the rate through an exhausted arc is rerouted
//! from there.

use alloc::collections::VecDeque;
use alloc::vec;
use alloc::vec::Vec;

use displaydoc::Display;
use serde::Serialize;

use crate::algo::ParametricMinCut;
use crate::amount::LinearAmount;
use crate::breakpoints::{Breakpoints, CutSegment};
use crate::config::SweepConfig;
use crate::error::{Error, InvariantViolation};
use crate::id::{ArcId, VertexId};
use crate::network::Network;
use crate::residual::ResidualNetwork;

pub use events::{Batch, BreakpointQueue, EventKind, Pending};
pub use forest::Tree;

use forest::Forest;
use throttle::Mark;

mod events;
mod forest;
mod growth;
mod throttle;

/// Work counters of a single sweep.
#[derive(Clone, Copy, Debug, Default, Display, PartialEq, Eq, Serialize)]
/// {levels} levels, {events} arc breakpoints, {scans} scans, {augmentations} augmentations, {reroutes} reroutes, {orphans} orphans, {releases} releases
pub struct SweepStats {
    pub levels: usize,
    pub events: usize,
    pub scans: usize,
    pub augmentations: usize,
    pub reroutes: usize,
    pub orphans: usize,
    pub releases: usize,
}

/// A parametric min-cut computation in progress.
///
/// Each call to [`Sweep::next_level`] solves the max-flow problem at the next λ at which the
/// minimum cut may change and records the vertices that joined the source side. The sweep can
/// be abandoned between levels at no cost.
///
/// A sweep ends at the upper end of its domain, or just before the first λ at which arcs of
/// unbounded capacity connect source and sink.
pub struct Sweep<'a> {
    network: &'a Network,
    config: SweepConfig,
    horizon: f64,
    residual: ResidualNetwork<'a>,
    forest: Forest,
    queue: BreakpointQueue,
    /// Arcs that opened or whose far end became free since they were last scanned.
    pending: Vec<ArcId>,
    flow: LinearAmount,
    breakpoints: Vec<Option<f64>>,
    /// Vertices released from the sink tree since the last level.
    left_sink: Vec<VertexId>,
    /// Vertices with a recorded breakpoint that joined the sink tree since the last level.
    entered_sink: Vec<VertexId>,
    marks: Vec<Mark>,
    cut: Vec<CutSegment>,
    stats: SweepStats,
    started: bool,
    done: bool,
}

impl<'a> Sweep<'a> {
    pub fn new(network: &'a Network, config: SweepConfig) -> Result<Self, Error> {
        config.validate()?;
        let lambda = config.lambda_min;

        for (index, &arc) in network.forward_arcs().iter().enumerate() {
            let capacity = network.capacity(arc).evaluate(lambda);
            if capacity < 0.0 {
                return Err(Error::NegativeCapacity {
                    arc: index,
                    capacity,
                    lambda,
                });
            }
        }
        let horizon = unbounded_horizon(network, lambda);
        if horizon <= lambda {
            return Err(Error::UnboundedCut);
        }
        if horizon <= config.lambda_max {
            log::info!("min-cut becomes unbounded at lambda {}, sweep ends there", horizon);
        }

        let residual = ResidualNetwork::new(network, lambda);
        let mut queue = BreakpointQueue::new(network.arc_count());
        for &arc in network.parametric_arcs() {
            if residual.residual(arc).value.is_infinite() {
                continue;
            }
            if let Some(at) = network
                .capacity(arc)
                .next_breakpoint(network.infinity(), lambda)
            {
                queue.schedule_unbounded(arc, at);
            }
        }

        let n = network.vertex_count();
        Ok(Self {
            network,
            config,
            horizon,
            residual,
            forest: Forest::new(n, network.source(), network.sink()),
            queue,
            pending: Vec::new(),
            flow: LinearAmount::ZERO,
            breakpoints: vec![None; n],
            left_sink: Vec::new(),
            entered_sink: Vec::new(),
            marks: vec![Mark::Unseen; n],
            cut: Vec::new(),
            stats: SweepStats::default(),
            started: false,
            done: false,
        })
    }

    pub fn lambda(&self) -> f64 {
        self.residual.lambda()
    }

    pub fn stats(&self) -> &SweepStats {
        &self.stats
    }

    /// Solves the next level and returns its λ, or `None` once the sweep is complete.
    pub fn next_level(&mut self) -> Result<Option<f64>, Error> {
        if self.done {
            return Ok(None);
        }
        if self.started {
            match self.queue.peek() {
                Some(lambda) if lambda <= self.config.lambda_max && lambda < self.horizon => {
                    self.advance(lambda)?
                }
                _ => {
                    self.done = true;
                    return Ok(None);
                }
            }
        }
        self.started = true;

        loop {
            self.grow()?;
            match self.queue.peek() {
                Some(lambda) if lambda <= self.lambda() => self.advance(lambda)?,
                _ => break,
            }
        }
        self.record_level()?;
        Ok(Some(self.lambda()))
    }

    /// Whether each vertex is on the source side of the minimum cut at the last solved level.
    pub fn source_side(&self) -> Vec<bool> {
        self.forest
            .vertices()
            .map(|(_, node)| node.tree != Tree::Sink)
            .collect()
    }

    /// Value of the maximum flow found so far and its rate of change in λ.
    pub fn flow_value(&self) -> LinearAmount {
        self.flow
    }

    pub fn check_conservation(&self) -> Result<(), InvariantViolation> {
        match self
            .network
            .forward_arcs()
            .iter()
            .find(|&&arc| !self.residual.is_conserved(arc))
        {
            Some(&arc) => Err(InvariantViolation::FlowNotConserved {
                arc,
                lambda: self.lambda(),
            }),
            None => Ok(()),
        }
    }

    /// Runs the remaining levels and returns the breakpoint of every vertex.
    pub fn finish(mut self) -> Result<Breakpoints, Error> {
        while self.next_level()?.is_some() {}

        log::info!("sweep finished: {}", self.stats);
        let values = self
            .breakpoints
            .iter()
            .map(|b| b.unwrap_or(f64::INFINITY))
            .collect();
        Ok(Breakpoints::new(
            values,
            self.config.lambda_min,
            self.cut,
            self.stats,
        ))
    }

    /// Moves the sweep to the arc breakpoint at `lambda`, takes the excess rate off every arc
    /// that ran out there and repairs the trees around them.
    fn advance(&mut self, lambda: f64) -> Result<(), Error> {
        let current = self.lambda();
        if lambda < current {
            return Err(InvariantViolation::LambdaRegressed { lambda, current }.into());
        }

        let batch = self.queue.pop_until(lambda);
        self.stats.events += batch.len();
        self.flow = self.flow.advanced(lambda - current);

        let shift = self
            .residual
            .shift(lambda, &batch.exhausted, &batch.unbounded);
        for &arc in &batch.unbounded {
            self.queue.reschedule(arc, None);
        }
        log::trace!(
            "lambda {}: {} arcs ran out, {} became unbounded",
            lambda,
            shift.closed.len(),
            batch.unbounded.len()
        );

        for &arc in &shift.closed {
            self.detach(arc);
        }
        for &arc in &shift.closed {
            self.throttle(arc)?;
        }
        self.pending.extend_from_slice(&shift.opened);

        self.adopt()
    }

    fn record_level(&mut self) -> Result<(), Error> {
        let lambda = self.lambda();

        for vertex in core::mem::take(&mut self.entered_sink) {
            if let (Tree::Sink, Some(recorded)) =
                (self.forest.tree(vertex), self.breakpoints[vertex])
            {
                return Err(InvariantViolation::NestingViolated {
                    vertex,
                    lambda,
                    recorded,
                }
                .into());
            }
        }

        // only vertices that left the sink tree can have joined the source side since the last
        // level
        let left = core::mem::take(&mut self.left_sink);
        let mut joined = 0;
        if self.stats.levels == 0 {
            for vertex in 0..self.network.vertex_count() {
                joined += usize::from(self.settle(vertex, lambda)?);
            }
        } else {
            for vertex in left {
                joined += usize::from(self.settle(vertex, lambda)?);
            }
        }

        self.cut.push(CutSegment {
            lambda,
            value: self.flow.value,
            slope: self.flow.slope,
        });
        self.stats.levels += 1;
        log::debug!(
            "level {}: cut value {}, {} vertices joined the source side",
            lambda,
            self.flow,
            joined
        );
        Ok(())
    }

    /// Records `lambda` as the breakpoint of `vertex` if it is off the sink side for the first
    /// time.
    fn settle(&mut self, vertex: VertexId, lambda: f64) -> Result<bool, Error> {
        let node = self.forest.node(vertex);
        if node.tree != Tree::Free && node.parent.is_none() && !self.forest.is_root(vertex) {
            return Err(InvariantViolation::DetachedOrphan { vertex, lambda }.into());
        }
        if node.tree == Tree::Sink || self.breakpoints[vertex].is_some() {
            return Ok(false);
        }
        self.breakpoints[vertex] = Some(lambda);
        Ok(true)
    }
}

/// The first λ from `lambda` on at which arcs of unbounded capacity connect source and sink.
///
/// Only arcs leaving the source depend on λ, so every other arc is either unbounded from the
/// start or never.
fn unbounded_horizon(network: &Network, lambda: f64) -> f64 {
    let infinity = network.infinity();
    let unbounded_from = |arc: ArcId| {
        let capacity = network.capacity(arc);
        if capacity.is_unbounded() || capacity.evaluate(lambda) >= infinity {
            lambda
        } else {
            capacity
                .next_breakpoint(infinity, lambda)
                .unwrap_or(f64::INFINITY)
        }
    };

    let (source, sink) = (network.source(), network.sink());
    let mut reaches_sink = vec![false; network.vertex_count()];
    reaches_sink[sink] = true;
    let mut queue: VecDeque<VertexId> = VecDeque::from([sink]);
    while let Some(v) = queue.pop_front() {
        for arc in network.out_arcs(v) {
            let tail = network.head(arc);
            if tail != source
                && !reaches_sink[tail]
                && unbounded_from(network.reverse(arc)) <= lambda
            {
                reaches_sink[tail] = true;
                queue.push_back(tail);
            }
        }
    }

    network
        .out_arcs(source)
        .filter(|&arc| reaches_sink[network.head(arc)])
        .map(unbounded_from)
        .fold(f64::INFINITY, f64::min)
}

/// The incremental-BFS parametric min-cut algorithm.
#[derive(Clone, Copy, Debug, Default)]
pub struct ParametricIbfs {
    pub config: SweepConfig,
}

impl ParametricIbfs {
    pub fn new(config: SweepConfig) -> Self {
        Self { config }
    }
}

impl ParametricMinCut for ParametricIbfs {
    type Error = Error;

    fn parametric_min_cut(&mut self, network: &Network) -> Result<Breakpoints, Self::Error> {
        Sweep::new(network, self.config)?.finish()
    }
}
