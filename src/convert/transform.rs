//! Affine transforms over fixed-precision decimals
//!
//! Every conversion rule is the map `y = factor * x + offset`.
//! Composition and inversion are pure; all arithmetic stays in
//! `Decimal` so chained temperature/volume conversions don't drift.
//! Rounding happens only at the presentation boundary, never here.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A transform `y = factor * x + offset`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Affine {
    #[serde(with = "rust_decimal::serde::str")]
    pub factor: Decimal,

    #[serde(with = "rust_decimal::serde::str")]
    pub offset: Decimal,
}

impl Affine {
    /// The identity transform `y = x`
    pub const IDENTITY: Affine = Affine {
        factor: Decimal::ONE,
        offset: Decimal::ZERO,
    };

    pub fn new(factor: Decimal, offset: Decimal) -> Self {
        Self { factor, offset }
    }

    /// A factor-only transform `y = factor * x`
    pub fn scale(factor: Decimal) -> Self {
        Self {
            factor,
            offset: Decimal::ZERO,
        }
    }

    /// Apply the transform to a quantity
    pub fn apply(&self, quantity: Decimal) -> Decimal {
        self.factor * quantity + self.offset
    }

    /// The algebraic inverse: if `y = a*x + b` then `x = (1/a)*y - b/a`
    ///
    /// Callers must guarantee a non-zero factor; the store rejects
    /// non-positive factors at the boundary.
    pub fn invert(&self) -> Affine {
        let inv_factor = Decimal::ONE / self.factor;
        Affine {
            factor: inv_factor,
            offset: -self.offset / self.factor,
        }
    }

    /// Compose: apply `self` first, then `next`
    ///
    /// `(next ∘ self)(x) = a2*(a1*x + b1) + b2 = (a2*a1)*x + (a2*b1 + b2)`
    pub fn then(&self, next: &Affine) -> Affine {
        Affine {
            factor: next.factor * self.factor,
            offset: next.factor * self.offset + next.offset,
        }
    }

    /// Whether two transforms agree within `epsilon` on both terms
    pub fn approx_eq(&self, other: &Affine, epsilon: Decimal) -> bool {
        (self.factor - other.factor).abs() <= epsilon
            && (self.offset - other.offset).abs() <= epsilon
    }
}

impl Default for Affine {
    fn default() -> Self {
        Self::IDENTITY
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    const EPS: Decimal = dec!(0.000000001);

    #[test]
    fn test_identity() {
        assert_eq!(Affine::IDENTITY.apply(dec!(42.5)), dec!(42.5));
    }

    #[test]
    fn test_scale_apply() {
        // cm -> m
        let t = Affine::scale(dec!(0.01));
        assert_eq!(t.apply(dec!(250)), dec!(2.50));
    }

    #[test]
    fn test_affine_apply_celsius_to_fahrenheit() {
        let c_to_f = Affine::new(dec!(1.8), dec!(32));
        assert_eq!(c_to_f.apply(dec!(100)), dec!(212.0));
        assert_eq!(c_to_f.apply(dec!(0)), dec!(32));
        assert_eq!(c_to_f.apply(dec!(-40)), dec!(-40.0));
    }

    #[test]
    fn test_invert_scale() {
        let cm_to_m = Affine::scale(dec!(0.01));
        let m_to_cm = cm_to_m.invert();
        assert_eq!(m_to_cm.apply(dec!(2.5)), dec!(250));
    }

    #[test]
    fn test_invert_affine() {
        let c_to_f = Affine::new(dec!(1.8), dec!(32));
        let f_to_c = c_to_f.invert();
        assert!((f_to_c.apply(dec!(212)) - dec!(100)).abs() <= EPS);
        assert!((f_to_c.apply(dec!(32))).abs() <= EPS);
    }

    #[test]
    fn test_round_trip_within_epsilon() {
        let c_to_f = Affine::new(dec!(1.8), dec!(32));
        let round = c_to_f.then(&c_to_f.invert());
        assert!(round.approx_eq(&Affine::IDENTITY, EPS));
        assert!((round.apply(dec!(37.4)) - dec!(37.4)).abs() <= EPS);
    }

    #[test]
    fn test_composition_order() {
        // c -> k (offset 273.15), then k -> "dk" (scale 10): dk = 10k
        let c_to_k = Affine::new(Decimal::ONE, dec!(273.15));
        let k_to_dk = Affine::scale(dec!(10));
        let c_to_dk = c_to_k.then(&k_to_dk);
        assert_eq!(c_to_dk.apply(dec!(0)), dec!(2731.50));
        // The other order is a different map
        let dk_of_c = k_to_dk.then(&c_to_k);
        assert_ne!(c_to_dk.apply(dec!(0)), dk_of_c.apply(dec!(0)));
    }

    #[test]
    fn test_composition_matches_direct_edge() {
        // A->B: *2, B->C: *3+1  ==  A->C: *6+1
        let a_to_b = Affine::scale(dec!(2));
        let b_to_c = Affine::new(dec!(3), dec!(1));
        let composed = a_to_b.then(&b_to_c);
        let direct = Affine::new(dec!(6), dec!(1));
        assert!(composed.approx_eq(&direct, EPS));
        assert_eq!(composed.apply(dec!(5)), direct.apply(dec!(5)));
    }
}
