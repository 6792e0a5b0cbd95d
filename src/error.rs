use displaydoc::Display;

use crate::algo::max_flow::MaxFlowError;
use crate::id::{ArcId, VertexId};

/// Errors in the input data or the run configuration, reported before a sweep starts.
#[derive(Clone, Debug, Display, PartialEq)]
pub enum Error {
    /// Network has no vertices or no arcs
    EmptyNetwork,
    /// Source and sink are the same vertex {0}
    SourceIsSink(VertexId),
    /// Vertex {vertex} is out of range for a network of {vertex_count} vertices
    VertexOutOfRange {
        vertex: VertexId,
        vertex_count: usize,
    },
    /// Arc {arc} is a self-loop on vertex {vertex}
    SelfLoop { arc: usize, vertex: VertexId },
    /// Arc {arc} has a capacity that decreases in lambda (slope {slope})
    DecreasingCapacity { arc: usize, slope: f64 },
    /// Arc {arc} has a capacity that is not a number
    InvalidCapacity { arc: usize },
    /// Arc {arc} has negative capacity {capacity} at lambda {lambda}
    NegativeCapacity {
        arc: usize,
        capacity: f64,
        lambda: f64,
    },
    /// Parametric arc {arc} does not leave the source
    ParametricArcOffSource { arc: usize },
    /// Infinity threshold {0} must be positive
    InvalidInfinity(f64),
    /// Sweep domain [{min}, {max}] is empty or not a number
    InvalidDomain { min: f64, max: f64 },
    /// Source reaches the sink through arcs of unbounded capacity
    UnboundedCut,
    /// Line {line}: {message}
    Parse { line: usize, message: &'static str },
    /// Vertex {vertex} is on the wrong side of the reference min-cut at lambda {lambda}
    VerificationFailed { vertex: VertexId, lambda: f64 },
    /// Min-cut value {actual} differs from the reference value {expected} at lambda {lambda}
    CutValueMismatch {
        lambda: f64,
        expected: f64,
        actual: f64,
    },
    /// Reference max-flow failed: {0}
    ReferenceFlow(MaxFlowError),
    /// Internal invariant violated: {0}
    Invariant(InvariantViolation),
}

/// Broken internal invariants. Any of these is a bug in the engine, never a data problem.
#[derive(Clone, Debug, Display, PartialEq)]
pub enum InvariantViolation {
    /// Residual of arc {arc} went negative ({residual}) at lambda {lambda}
    NegativeResidual {
        arc: ArcId,
        residual: f64,
        lambda: f64,
    },
    /// Pushing {amount} exceeds the residual {residual} of arc {arc} at lambda {lambda}
    Overpush {
        arc: ArcId,
        amount: f64,
        residual: f64,
        lambda: f64,
    },
    /// Parent chain from vertex {vertex} does not reach its root at lambda {lambda}
    BrokenPath { vertex: VertexId, lambda: f64 },
    /// Augmenting path through arc {arc} has no positive bottleneck at lambda {lambda}
    EmptyAugmentation { arc: ArcId, lambda: f64 },
    /// Augmenting path through arc {arc} has unbounded capacity at lambda {lambda}
    UnboundedAugmentation { arc: ArcId, lambda: f64 },
    /// Orphan {vertex} stayed in its tree without a parent at lambda {lambda}
    DetachedOrphan { vertex: VertexId, lambda: f64 },
    /// Breakpoint {lambda} was popped behind the sweep position {current}
    LambdaRegressed { lambda: f64, current: f64 },
    /// Vertex {vertex} reaches the sink again at lambda {lambda} after leaving at {recorded}
    NestingViolated {
        vertex: VertexId,
        lambda: f64,
        recorded: f64,
    },
    /// Flow rate through vertex {vertex} cannot be traced back to a terminal at lambda {lambda}
    RateStranded { vertex: VertexId, lambda: f64 },
    /// Arc pair {arc} does not conserve its capacity at lambda {lambda}
    FlowNotConserved { arc: ArcId, lambda: f64 },
}

impl From<InvariantViolation> for Error {
    fn from(violation: InvariantViolation) -> Self {
        Self::Invariant(violation)
    }
}

impl From<MaxFlowError> for Error {
    fn from(e: MaxFlowError) -> Self {
        Self::ReferenceFlow(e)
    }
}
