//! Quantity + weight pair moved through the ledger.

use core::ops::{Add, AddAssign, Neg, Sub, SubAssign};

use serde::{Deserialize, Serialize};

use crate::value_object::ValueObject;

/// Round `value` to `decimals` fractional digits (half away from zero).
pub fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}

/// A quantity (units) and weight (kg) moved or held together.
///
/// Capacities, received figures, released amounts and utilization are all
/// measures; comparisons take an absolute tolerance because amounts are
/// accumulated from rounded per-unit allocations.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Measure {
    pub qty: f64,
    pub weight_kg: f64,
}

impl ValueObject for Measure {}

impl Measure {
    pub const ZERO: Measure = Measure {
        qty: 0.0,
        weight_kg: 0.0,
    };

    pub fn new(qty: f64, weight_kg: f64) -> Self {
        Self { qty, weight_kg }
    }

    pub fn is_finite(&self) -> bool {
        self.qty.is_finite() && self.weight_kg.is_finite()
    }

    /// True iff both components are `<= limit + tolerance`.
    pub fn fits_within(&self, limit: &Measure, tolerance: f64) -> bool {
        self.qty <= limit.qty + tolerance && self.weight_kg <= limit.weight_kg + tolerance
    }

    /// True iff the quantity component is within `tolerance` of zero or below.
    pub fn is_depleted(&self, tolerance: f64) -> bool {
        self.qty <= tolerance
    }

    pub fn rounded(&self, decimals: u32) -> Measure {
        Measure::new(round_to(self.qty, decimals), round_to(self.weight_kg, decimals))
    }

    /// Component-wise comparison within `tolerance`.
    pub fn approx_eq(&self, other: &Measure, tolerance: f64) -> bool {
        (self.qty - other.qty).abs() <= tolerance
            && (self.weight_kg - other.weight_kg).abs() <= tolerance
    }
}

impl Add for Measure {
    type Output = Measure;

    fn add(self, rhs: Measure) -> Measure {
        Measure::new(self.qty + rhs.qty, self.weight_kg + rhs.weight_kg)
    }
}

impl AddAssign for Measure {
    fn add_assign(&mut self, rhs: Measure) {
        self.qty += rhs.qty;
        self.weight_kg += rhs.weight_kg;
    }
}

impl Sub for Measure {
    type Output = Measure;

    fn sub(self, rhs: Measure) -> Measure {
        Measure::new(self.qty - rhs.qty, self.weight_kg - rhs.weight_kg)
    }
}

impl SubAssign for Measure {
    fn sub_assign(&mut self, rhs: Measure) {
        self.qty -= rhs.qty;
        self.weight_kg -= rhs.weight_kg;
    }
}

impl Neg for Measure {
    type Output = Measure;

    fn neg(self) -> Measure {
        Measure::new(-self.qty, -self.weight_kg)
    }
}

impl core::iter::Sum for Measure {
    fn sum<I: Iterator<Item = Measure>>(iter: I) -> Measure {
        iter.fold(Measure::ZERO, |acc, m| acc + m)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn round_to_two_decimals() {
        assert_eq!(round_to(4000.0 / 900.0 * 300.0, 2), 1333.33);
        assert_eq!(round_to(2.675_000_1, 2), 2.68);
        assert_eq!(round_to(-1.005_1, 2), -1.01);
    }

    #[test]
    fn fits_within_uses_absolute_tolerance() {
        let cap = Measure::new(1000.0, 5000.0);
        assert!(Measure::new(1000.00005, 5000.0).fits_within(&cap, 1e-4));
        assert!(!Measure::new(1000.001, 5000.0).fits_within(&cap, 1e-4));
        assert!(!Measure::new(10.0, 5000.01).fits_within(&cap, 1e-4));
    }

    #[test]
    fn depleted_checks_quantity_only() {
        assert!(Measure::new(0.00001, 3.0).is_depleted(1e-4));
        assert!(!Measure::new(0.5, 0.0).is_depleted(1e-4));
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Property: adding then subtracting the same measure is the identity (within rounding).
        #[test]
        fn add_then_sub_is_identity(
            a in (0.0f64..1e6, 0.0f64..1e6),
            b in (0.0f64..1e6, 0.0f64..1e6),
        ) {
            let a = Measure::new(a.0, a.1);
            let b = Measure::new(b.0, b.1);
            prop_assert!(((a + b) - b).approx_eq(&a, 1e-6));
        }
    }
}
