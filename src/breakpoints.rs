use alloc::vec::Vec;

use itertools::Itertools;
use serde::Serialize;

use crate::algo::ibfs::SweepStats;
use crate::id::VertexId;

/// The min-cut value on `[lambda, next level)`: `value + slope * (λ - lambda)`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct CutSegment {
    pub lambda: f64,
    pub value: f64,
    pub slope: f64,
}

impl CutSegment {
    pub fn value_at(&self, lambda: f64) -> f64 {
        if self.slope == 0.0 {
            self.value
        } else {
            self.value + self.slope * (lambda - self.lambda)
        }
    }
}

/// One line of the breakpoint output.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct BreakpointRow {
    pub vertex: VertexId,
    pub breakpoint: f64,
}

/// The parametric min-cut of a network.
///
/// A vertex is on the source side at λ exactly when its breakpoint is at most λ. Vertices
/// that are on the source side from the start of the sweep carry its lower bound, vertices
/// that never join carry `f64::INFINITY`.
#[derive(Clone, Debug, PartialEq)]
pub struct Breakpoints {
    values: Vec<f64>,
    lower: f64,
    cut: Vec<CutSegment>,
    stats: SweepStats,
}

impl Breakpoints {
    pub(crate) fn new(values: Vec<f64>, lower: f64, cut: Vec<CutSegment>, stats: SweepStats) -> Self {
        Self {
            values,
            lower,
            cut,
            stats,
        }
    }

    pub fn get(&self, vertex: VertexId) -> Option<f64> {
        self.values.get(vertex).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (VertexId, f64)> + '_ {
        self.values.iter().copied().enumerate()
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Lower bound of the sweep.
    pub fn lower(&self) -> f64 {
        self.lower
    }

    pub fn is_source_side(&self, vertex: VertexId, lambda: f64) -> bool {
        self.get(vertex).map_or(false, |b| b <= lambda)
    }

    pub fn source_side(&self, lambda: f64) -> Vec<VertexId> {
        self.iter()
            .filter(|&(_, b)| b <= lambda)
            .map(|(v, _)| v)
            .collect()
    }

    /// Value of the minimum cut at `lambda`, `None` before the start of the sweep.
    pub fn min_cut_value(&self, lambda: f64) -> Option<f64> {
        let after = self.cut.partition_point(|segment| segment.lambda <= lambda);
        after
            .checked_sub(1)
            .map(|segment| self.cut[segment].value_at(lambda))
    }

    pub fn cut_segments(&self) -> &[CutSegment] {
        &self.cut
    }

    /// Distinct finite breakpoints in increasing order.
    pub fn levels(&self) -> Vec<f64> {
        self.values
            .iter()
            .copied()
            .filter(|b| b.is_finite())
            .sorted_by(f64::total_cmp)
            .dedup()
            .collect()
    }

    pub fn rows(&self) -> impl Iterator<Item = BreakpointRow> + '_ {
        self.iter()
            .map(|(vertex, breakpoint)| BreakpointRow { vertex, breakpoint })
    }

    pub fn stats(&self) -> &SweepStats {
        &self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    fn breakpoints() -> Breakpoints {
        Breakpoints::new(
            vec![0.0, 5.0, 0.0, f64::INFINITY],
            0.0,
            vec![
                CutSegment {
                    lambda: 0.0,
                    value: 3.0,
                    slope: 1.0,
                },
                CutSegment {
                    lambda: 5.0,
                    value: 8.0,
                    slope: 0.0,
                },
            ],
            SweepStats::default(),
        )
    }

    #[test]
    fn membership_is_inclusive_at_the_breakpoint() {
        let breakpoints = breakpoints();
        assert!(!breakpoints.is_source_side(1, 4.999));
        assert!(breakpoints.is_source_side(1, 5.0));
        assert!(!breakpoints.is_source_side(3, f64::MAX));
        assert!(!breakpoints.is_source_side(7, 1.0));
        assert_eq!(breakpoints.source_side(2.0), vec![0, 2]);
        assert_eq!(breakpoints.source_side(5.0), vec![0, 1, 2]);
    }

    #[test]
    fn cut_value_is_piecewise_linear() {
        let breakpoints = breakpoints();
        assert_eq!(breakpoints.min_cut_value(-1.0), None);
        assert_eq!(breakpoints.min_cut_value(0.0), Some(3.0));
        assert_eq!(breakpoints.min_cut_value(2.5), Some(5.5));
        assert_eq!(breakpoints.min_cut_value(5.0), Some(8.0));
        assert_eq!(breakpoints.min_cut_value(100.0), Some(8.0));
    }

    #[test]
    fn levels_and_rows() {
        let breakpoints = breakpoints();
        assert_eq!(breakpoints.levels(), vec![0.0, 5.0]);
        let rows: Vec<_> = breakpoints.rows().collect();
        assert_eq!(rows.len(), 4);
        assert_eq!(
            rows[1],
            BreakpointRow {
                vertex: 1,
                breakpoint: 5.0
            }
        );
    }
}
