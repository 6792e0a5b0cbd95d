use core::cmp::Ordering;
use core::fmt::{self, Debug, Display};
use core::iter::Sum;
use core::ops::{Add, AddAssign, Neg, Sub, SubAssign};

use num_traits::float::FloatCore;
use num_traits::Zero;
use serde::{Deserialize, Serialize};

/// Relative magnitude below which a residual left over by floating-point cancellation is zero.
pub const TOLERANCE: f64 = 1e-9;

/// A trait representing a capacity or flow amount.
pub trait Amount:
    Copy
    + Sum<Self>
    + Add<Output = Self>
    + Sub<Output = Self>
    + Neg<Output = Self>
    + PartialOrd
    + AddAssign
    + SubAssign
    + Zero
    + Debug
    + Display
    + Default
{
    /// Whether the amount is a finite quantity that can be pushed as flow.
    fn is_bounded(&self) -> bool;

    /// Whether the amount is rounding noise rather than flow.
    fn is_negligible(&self) -> bool {
        false
    }
}

impl Amount for i64 {
    fn is_bounded(&self) -> bool {
        true
    }
}

impl Amount for f64 {
    fn is_bounded(&self) -> bool {
        self.is_finite()
    }

    fn is_negligible(&self) -> bool {
        FloatCore::abs(*self) <= TOLERANCE
    }
}

/// An amount that depends linearly on λ around the current sweep position.
///
/// `value` is the amount at the current λ and `slope` its rate of change. Amounts are ordered
/// lexicographically, which is the order of the underlying functions for every λ just to the
/// right of the current position.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LinearAmount {
    pub value: f64,
    pub slope: f64,
}

impl LinearAmount {
    pub const ZERO: Self = Self::new(0.0, 0.0);

    pub const fn new(value: f64, slope: f64) -> Self {
        Self { value, slope }
    }

    pub const fn constant(value: f64) -> Self {
        Self::new(value, 0.0)
    }

    pub const fn unbounded() -> Self {
        Self::new(f64::INFINITY, 0.0)
    }

    /// Positive for every λ in some right neighbourhood of the current position.
    pub fn is_positive(&self) -> bool {
        self.value > 0.0 || (self.value == 0.0 && self.slope > 0.0)
    }

    pub fn is_finite(&self) -> bool {
        self.value.is_finite() && self.slope.is_finite()
    }

    /// Value `delta` units of λ past the current position.
    pub fn at(&self, delta: f64) -> f64 {
        if self.slope == 0.0 {
            self.value
        } else {
            self.value + self.slope * delta
        }
    }

    pub fn min(self, other: Self) -> Self {
        if other < self {
            other
        } else {
            self
        }
    }

    /// The λ at which a shrinking amount reaches zero, given the current position `lambda`.
    pub fn exhausted_at(&self, lambda: f64) -> Option<f64> {
        (self.slope < 0.0 && self.value.is_finite()).then(|| lambda + self.value / -self.slope)
    }

    /// The amount `delta` units of λ further on, with cancellation noise dropped.
    pub(crate) fn advanced(self, delta: f64) -> Self {
        if self.slope == 0.0 || delta == 0.0 || !self.value.is_finite() {
            return self;
        }
        let moved = self.slope * delta;
        let scale = FloatCore::abs(self.value) + FloatCore::abs(moved);
        Self::new(snap(self.value + moved, scale), self.slope)
    }

    /// Drops cancellation noise relative to `scale`, the operand the amount was derived from.
    pub(crate) fn snapped(self, scale: Self) -> Self {
        Self::new(snap(self.value, scale.value), snap(self.slope, scale.slope))
    }
}

fn snap(x: f64, scale: f64) -> f64 {
    if x.is_finite()
        && scale.is_finite()
        && FloatCore::abs(x) <= TOLERANCE * FloatCore::abs(scale)
    {
        0.0
    } else {
        x
    }
}

impl PartialOrd for LinearAmount {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match self.value.partial_cmp(&other.value)? {
            Ordering::Equal => self.slope.partial_cmp(&other.slope),
            ordering => Some(ordering),
        }
    }
}

impl Add for LinearAmount {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.value + rhs.value, self.slope + rhs.slope)
    }
}

impl Sub for LinearAmount {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::new(self.value - rhs.value, self.slope - rhs.slope)
    }
}

impl Neg for LinearAmount {
    type Output = Self;

    fn neg(self) -> Self {
        Self::new(-self.value, -self.slope)
    }
}

impl AddAssign for LinearAmount {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl SubAssign for LinearAmount {
    fn sub_assign(&mut self, rhs: Self) {
        *self = *self - rhs;
    }
}

impl Sum for LinearAmount {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

impl Zero for LinearAmount {
    fn zero() -> Self {
        Self::ZERO
    }

    fn is_zero(&self) -> bool {
        self.value == 0.0 && self.slope == 0.0
    }
}

impl Display for LinearAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {:+}·Δλ", self.value, self.slope)
    }
}

impl Amount for LinearAmount {
    fn is_bounded(&self) -> bool {
        self.is_finite()
    }
}
