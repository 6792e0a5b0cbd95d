use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Capacity of an arc as a function of λ.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum FlowFunction {
    /// A capacity that does not depend on λ. `f64::INFINITY` marks an unbounded arc.
    Constant(f64),
    Linear(LinearFlowFunction),
}

impl FlowFunction {
    pub const UNBOUNDED: Self = Self::Constant(f64::INFINITY);

    pub fn evaluate(&self, lambda: f64) -> f64 {
        match self {
            Self::Constant(c) => *c,
            Self::Linear(f) => f.evaluate(lambda),
        }
    }

    /// Smallest λ' > `after` at which the capacity reaches `target`.
    ///
    /// `target` is typically the flow already carried by the arc or the infinity threshold.
    /// Functions with zero slope never reach anything they have not reached already.
    pub fn next_breakpoint(&self, target: f64, after: f64) -> Option<f64> {
        match self {
            Self::Constant(_) => None,
            Self::Linear(f) => f.next_breakpoint(target, after),
        }
    }

    pub fn slope(&self) -> f64 {
        match self {
            Self::Constant(_) => 0.0,
            Self::Linear(f) => f.slope(),
        }
    }

    pub fn is_parametric(&self) -> bool {
        self.slope() > 0.0
    }

    pub fn is_unbounded(&self) -> bool {
        matches!(self, Self::Constant(c) if c.is_infinite())
    }
}

impl From<f64> for FlowFunction {
    fn from(capacity: f64) -> Self {
        Self::Constant(capacity)
    }
}

impl From<LinearFlowFunction> for FlowFunction {
    fn from(f: LinearFlowFunction) -> Self {
        Self::Linear(f)
    }
}

/// `offset + slope * λ` with a non-negative slope.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawLinearFlowFunction")]
pub struct LinearFlowFunction {
    offset: f64,
    slope: f64,
}

impl LinearFlowFunction {
    pub fn new(offset: f64, slope: f64) -> Result<Self, Error> {
        if !offset.is_finite() || !slope.is_finite() {
            Err(Error::InvalidCapacity { arc: 0 })
        } else if slope < 0.0 {
            Err(Error::DecreasingCapacity { arc: 0, slope })
        } else {
            Ok(Self { offset, slope })
        }
    }

    pub fn offset(&self) -> f64 {
        self.offset
    }

    pub fn slope(&self) -> f64 {
        self.slope
    }

    pub fn evaluate(&self, lambda: f64) -> f64 {
        self.offset + self.slope * lambda
    }

    pub fn next_breakpoint(&self, target: f64, after: f64) -> Option<f64> {
        if self.slope == 0.0 || !target.is_finite() {
            return None;
        }
        let mut lambda = (target - self.offset) / self.slope;
        // the quotient may round to just below the crossing
        for _ in 0..4 {
            if self.evaluate(lambda) >= target {
                break;
            }
            lambda = next_up(lambda);
        }
        (lambda > after).then_some(lambda)
    }
}

/// The smallest float above `x`.
fn next_up(x: f64) -> f64 {
    if x.is_nan() || x == f64::INFINITY {
        x
    } else if x == 0.0 {
        f64::from_bits(1)
    } else if x > 0.0 {
        f64::from_bits(x.to_bits() + 1)
    } else {
        f64::from_bits(x.to_bits() - 1)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Deserialize, Serialize)]
pub struct RawLinearFlowFunction {
    pub offset: f64,
    pub slope: f64,
}

impl TryFrom<RawLinearFlowFunction> for LinearFlowFunction {
    type Error = Error;

    fn try_from(f: RawLinearFlowFunction) -> Result<Self, Self::Error> {
        Self::new(f.offset, f.slope)
    }
}
