//! Taking λ-rate off arcs whose residual ran out.
//!
//! When an arc is exhausted its flow is still growing faster than its capacity. The excess rate
//! is pushed back along a route of arcs that carry rate: either a source-sink path through the
//! arc, which lowers the rate of the flow value, or a cycle, which leaves it alone. Flow values
//! at the current λ never change, so the flow stays maximum at λ and only the growth phase that
//! follows decides where the rate can go instead.

use alloc::vec::Vec;

use crate::amount::LinearAmount;
use crate::error::{Error, InvariantViolation};
use crate::id::{ArcId, VertexId};

use super::Sweep;

/// Position of a vertex on the walks of a single route search.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(super) enum Mark {
    Unseen,
    /// Reached after this many arcs walking from the throttled arc towards the sink.
    Ahead(usize),
    /// Reached after this many arcs walking from the throttled arc back towards the source.
    Behind(usize),
}

/// Rate-carrying arcs whose rate is taken back together.
#[derive(Debug)]
struct Route {
    arcs: Vec<ArcId>,
    /// Runs from the source to the sink instead of around a cycle.
    open_ended: bool,
    /// Contains the throttled arc.
    through: bool,
}

impl<'a> Sweep<'a> {
    /// Brings the rate of the exhausted `arc` down to the rate of its capacity.
    pub(super) fn throttle(&mut self, arc: ArcId) -> Result<(), Error> {
        loop {
            let excess = -self.residual.residual(arc).slope;
            if !(excess > 0.0) {
                return Ok(());
            }

            let route = self.route(arc)?;
            let room = route
                .arcs
                .iter()
                .map(|&a| self.rate_room(a))
                .fold(f64::INFINITY, f64::min);
            let delta = if route.through { room.min(excess) } else { room };
            if !(delta > 0.0) {
                return Err(InvariantViolation::RateStranded {
                    vertex: self.network.tail(arc),
                    lambda: self.lambda(),
                }
                .into());
            }

            let amount = LinearAmount::new(0.0, delta);
            for &a in &route.arcs {
                self.push(self.network.reverse(a), amount)?;
            }
            if route.open_ended {
                self.flow.slope -= delta;
            }
            self.stats.reroutes += 1;
        }
    }

    /// How much rate can be taken off `arc` without closing its reverse arc for good.
    fn rate_room(&self, arc: ArcId) -> f64 {
        let carried = self.residual.flow_slope(arc);
        let back = self.residual.residual(self.network.reverse(arc));
        if back.value > 0.0 {
            carried
        } else {
            carried.min(back.slope)
        }
    }

    fn carrying_out(&self, v: VertexId) -> Option<ArcId> {
        self.network
            .out_arcs(v)
            .find(|&arc| self.rate_room(arc) > 0.0)
    }

    fn carrying_in(&self, v: VertexId) -> Option<ArcId> {
        self.network
            .out_arcs(v)
            .map(|arc| self.network.reverse(arc))
            .find(|&arc| self.rate_room(arc) > 0.0)
    }

    fn route(&mut self, arc: ArcId) -> Result<Route, InvariantViolation> {
        let mut seen = Vec::new();
        let route = self.trace(arc, &mut seen);
        for v in seen {
            self.marks[v] = Mark::Unseen;
        }
        route
    }

    /// Follows rate forward from the head of `arc` and backward from its tail until both walks
    /// end at a terminal or one of them closes a cycle.
    fn trace(&mut self, arc: ArcId, seen: &mut Vec<VertexId>) -> Result<Route, InvariantViolation> {
        let (tail, head) = (self.network.tail(arc), self.network.head(arc));
        let lambda = self.lambda();
        let stranded = |vertex| InvariantViolation::RateStranded { vertex, lambda };

        let mut ahead = Vec::new();
        let mut v = head;
        self.marks[v] = Mark::Ahead(0);
        seen.push(v);
        loop {
            if v == tail {
                ahead.push(arc);
                return Ok(Route {
                    arcs: ahead,
                    open_ended: false,
                    through: true,
                });
            }
            if v == self.network.sink() {
                break;
            }
            let next = self.carrying_out(v).ok_or_else(|| stranded(v))?;
            ahead.push(next);
            let w = self.network.head(next);
            if let Mark::Ahead(i) = self.marks[w] {
                return Ok(Route {
                    arcs: ahead.split_off(i),
                    open_ended: false,
                    through: false,
                });
            }
            self.marks[w] = Mark::Ahead(ahead.len());
            seen.push(w);
            v = w;
        }

        let mut behind = Vec::new();
        let mut u = tail;
        self.marks[u] = Mark::Behind(0);
        seen.push(u);
        while u != self.network.source() {
            let next = self.carrying_in(u).ok_or_else(|| stranded(u))?;
            behind.push(next);
            let x = self.network.tail(next);
            match self.marks[x] {
                Mark::Ahead(i) => {
                    ahead.truncate(i);
                    ahead.push(arc);
                    ahead.append(&mut behind);
                    return Ok(Route {
                        arcs: ahead,
                        open_ended: false,
                        through: true,
                    });
                }
                Mark::Behind(j) => {
                    return Ok(Route {
                        arcs: behind.split_off(j),
                        open_ended: false,
                        through: false,
                    });
                }
                Mark::Unseen => {
                    self.marks[x] = Mark::Behind(behind.len());
                    seen.push(x);
                }
            }
            u = x;
        }

        ahead.push(arc);
        ahead.append(&mut behind);
        Ok(Route {
            arcs: ahead,
            open_ended: true,
            through: true,
        })
    }
}
