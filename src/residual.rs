use alloc::vec;
use alloc::vec::Vec;

use num_traits::float::FloatCore;

use crate::amount::{LinearAmount, TOLERANCE};
use crate::error::InvariantViolation;
use crate::id::ArcId;
use crate::network::Network;

/// Outcome of pushing flow through one arc.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Push {
    /// The arc is no longer open.
    pub saturated: bool,
}

/// Arcs whose state changed when the sweep moved to a new λ.
#[derive(Clone, Debug, Default)]
pub(crate) struct Shift {
    /// Settled at zero with a shrinking residual; their flow rate has to come down.
    pub closed: Vec<ArcId>,
    /// Unbounded from now on, after being closed.
    pub opened: Vec<ArcId>,
}

/// Residual capacities of a network at the current sweep position.
///
/// Every residual is a [`LinearAmount`] anchored at the λ where it was last written and read
/// out at the current λ, so moving the sweep costs nothing for arcs that are not involved.
/// The λ-rate of the flow through each arc is kept alongside.
#[derive(Clone, Debug)]
pub struct ResidualNetwork<'a> {
    network: &'a Network,
    lambda: f64,
    residual: Vec<LinearAmount>,
    anchor: Vec<f64>,
    flow_slope: Vec<f64>,
}

impl<'a> ResidualNetwork<'a> {
    /// Residuals of the zero flow at `lambda`.
    pub fn new(network: &'a Network, lambda: f64) -> Self {
        let infinity = network.infinity();
        let residual: Vec<_> = (0..network.arc_count())
            .map(|arc| {
                let capacity = network.capacity(arc);
                let value = capacity.evaluate(lambda);
                if value >= infinity {
                    LinearAmount::unbounded()
                } else {
                    LinearAmount::new(value, capacity.slope())
                }
            })
            .collect();

        Self {
            network,
            lambda,
            anchor: vec![lambda; residual.len()],
            flow_slope: vec![0.0; residual.len()],
            residual,
        }
    }

    pub fn network(&self) -> &'a Network {
        self.network
    }

    pub fn lambda(&self) -> f64 {
        self.lambda
    }

    pub fn residual(&self, arc: ArcId) -> LinearAmount {
        self.residual[arc].advanced(self.lambda - self.anchor[arc])
    }

    /// Residual value at `lambda`, valid up to the next breakpoint of the arc.
    pub fn residual_at(&self, arc: ArcId, lambda: f64) -> f64 {
        self.residual[arc].at(lambda - self.anchor[arc])
    }

    pub fn is_open(&self, arc: ArcId) -> bool {
        self.residual(arc).is_positive()
    }

    /// Rate at which the flow through `arc` grows with λ.
    pub fn flow_slope(&self, arc: ArcId) -> f64 {
        self.flow_slope[arc]
    }

    fn set(&mut self, arc: ArcId, mut residual: LinearAmount) {
        if residual.value.is_infinite() {
            residual.slope = 0.0;
        }
        self.residual[arc] = residual;
        self.anchor[arc] = self.lambda;
    }

    /// Moves `amount` of flow through `arc`, shifting the same amount onto its reverse arc.
    pub fn push_flow(
        &mut self,
        arc: ArcId,
        amount: LinearAmount,
    ) -> Result<Push, InvariantViolation> {
        let residual = self.residual(arc);
        if amount > residual {
            return Err(InvariantViolation::Overpush {
                arc,
                amount: amount.value,
                residual: residual.value,
                lambda: self.lambda,
            });
        }

        let remaining = (residual - amount).snapped(residual);
        if remaining.value < 0.0 {
            return Err(InvariantViolation::NegativeResidual {
                arc,
                residual: remaining.value,
                lambda: self.lambda,
            });
        }
        self.set(arc, remaining);

        let reverse = self.network.reverse(arc);
        let grown = self.residual(reverse) + amount;
        self.set(reverse, grown);

        self.flow_slope[arc] += amount.slope;
        self.flow_slope[reverse] -= amount.slope;

        Ok(Push {
            saturated: !remaining.is_positive(),
        })
    }

    /// The λ at which the arc's residual runs out if nothing else changes.
    pub fn exhausted_at(&self, arc: ArcId) -> Option<f64> {
        self.residual(arc).exhausted_at(self.lambda)
    }

    /// Moves the sweep to `lambda`.
    ///
    /// Residuals of `exhausted` arcs are settled at exactly zero, keeping their negative rate
    /// until flow is taken off them. `unbounded` arcs lose their capacity limit.
    pub(crate) fn shift(&mut self, lambda: f64, exhausted: &[ArcId], unbounded: &[ArcId]) -> Shift {
        self.lambda = lambda;

        let mut shift = Shift::default();
        for &arc in exhausted {
            let residual = self.residual(arc);
            if residual.slope < 0.0 && residual.value.is_finite() {
                self.set(arc, LinearAmount::new(0.0, residual.slope));
                shift.closed.push(arc);
            }
        }
        for &arc in unbounded {
            let was_open = self.is_open(arc);
            self.set(arc, LinearAmount::unbounded());
            if !was_open {
                shift.opened.push(arc);
            }
        }
        shift
    }

    /// Checks that the arc pair through `arc` still carries its combined capacity.
    pub fn is_conserved(&self, arc: ArcId) -> bool {
        let reverse = self.network.reverse(arc);
        let capacity = self.network.capacity(arc).evaluate(self.lambda)
            + self.network.capacity(reverse).evaluate(self.lambda);
        let (forward, backward) = (self.residual(arc), self.residual(reverse));
        if !capacity.is_finite() || forward.value.is_infinite() || backward.value.is_infinite() {
            return true;
        }
        let residual = forward.value + backward.value;
        FloatCore::abs(residual - capacity) <= TOLERANCE * (1.0 + FloatCore::abs(capacity))
    }
}
