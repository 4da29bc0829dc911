//! Combination of modifications into a final attribute value
//!
//! Operators are applied tier by tier:
//!
//! 1. `PreAssign`, last one wins
//! 2. `PreMul` / `PreDiv`, multiplied together
//! 3. `ModAdd` / `ModSub`, summed
//! 4. `PostMul` / `PostDiv` / `PostPercent`, multiplied, optionally with
//!    stacking penalties
//! 5. `PostAssign`, last one wins
//!
//! Division by zero leaves the running value unchanged.

use crate::{Operator, Tier};

/// Penalty denominator: the i-th strongest multiplier is scaled by
/// `exp(-(i / 2.67)^2)`
pub const PENALTY_DENOMINATOR: f64 = 2.67;

/// One modification of an attribute
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contribution {
    pub operator: Operator,
    /// Value of the source attribute
    pub value: f64,
    /// Whether the contribution takes part in stacking penalties
    pub penalized: bool,
}

impl Contribution {
    pub fn new(operator: Operator, value: f64) -> Self {
        Self {
            operator,
            value,
            penalized: false,
        }
    }

    pub fn penalized(operator: Operator, value: f64) -> Self {
        Self {
            operator,
            value,
            penalized: true,
        }
    }

    /// Express a post-multiplicative contribution as a percentage change
    fn as_percent(&self) -> Option<f64> {
        match self.operator {
            Operator::PostMul => Some((self.value - 1.0) * 100.0),
            Operator::PostDiv if self.value != 0.0 => Some((1.0 / self.value - 1.0) * 100.0),
            Operator::PostPercent => Some(self.value),
            _ => None,
        }
    }
}

/// Strength multiplier for the `rank`-th strongest penalized modification
pub fn penalty_factor(rank: usize) -> f64 {
    let x = rank as f64 / PENALTY_DENOMINATOR;
    (-(x * x)).exp()
}

/// Multiplier from a group of same-sign percentages
fn penalized_chain(mut percents: Vec<f64>) -> f64 {
    percents.sort_by(|a, b| b.abs().total_cmp(&a.abs()));
    percents
        .iter()
        .enumerate()
        .map(|(rank, p)| 1.0 + p / 100.0 * penalty_factor(rank))
        .product()
}

/// Combine contributions, in registration order, with a base value
pub fn combine(base: f64, contributions: &[Contribution], high_is_good: bool) -> f64 {
    let in_tier = |tier: Tier| {
        contributions
            .iter()
            .filter(move |c| c.operator.tier() == tier)
    };

    let mut value = in_tier(Tier::PreAssign).last().map_or(base, |c| c.value);

    for c in in_tier(Tier::PreMultiplicative) {
        match c.operator {
            Operator::PreDiv if c.value == 0.0 => {}
            Operator::PreDiv => value /= c.value,
            _ => value *= c.value,
        }
    }

    for c in in_tier(Tier::Additive) {
        match c.operator {
            Operator::ModSub => value -= c.value,
            _ => value += c.value,
        }
    }

    let mut positive = Vec::new();
    let mut negative = Vec::new();
    for c in in_tier(Tier::PostMultiplicative) {
        if c.penalized {
            let Some(p) = c.as_percent() else { continue };
            if p > 0.0 || (p == 0.0 && high_is_good) {
                positive.push(p);
            } else {
                negative.push(p);
            }
            continue;
        }
        match c.operator {
            Operator::PostPercent => value *= 1.0 + c.value / 100.0,
            Operator::PostDiv if c.value == 0.0 => {}
            Operator::PostDiv => value /= c.value,
            _ => value *= c.value,
        }
    }
    value *= penalized_chain(positive) * penalized_chain(negative);

    in_tier(Tier::PostAssign).last().map_or(value, |c| c.value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn percents(values: &[f64], penalized: bool) -> Vec<Contribution> {
        values
            .iter()
            .map(|v| Contribution {
                operator: Operator::PostPercent,
                value: *v,
                penalized,
            })
            .collect()
    }

    #[test]
    fn test_stacking_penalty() {
        let contributions = percents(&[20.0, 50.0, -90.0, -25.0, 400.0], true);
        let value = combine(100.0, &contributions, true);
        assert!((value - 62.55).abs() < 0.0005, "got {}", value);
    }

    #[test]
    fn test_stackable_multipliers() {
        let contributions = percents(&[20.0, 50.0, -90.0, -25.0, 400.0], false);
        let value = combine(100.0, &contributions, true);
        assert!((value - 67.5).abs() < 1e-9, "got {}", value);
    }

    #[test]
    fn test_penalty_factor() {
        assert_eq!(penalty_factor(0), 1.0);
        assert!((penalty_factor(1) - 0.869_119).abs() < 1e-6);
        assert!((penalty_factor(2) - 0.570_583).abs() < 1e-6);
    }

    #[test]
    fn test_tier_order() {
        // (10 * 2 / 4 + 7 - 2) * 1.5 = 15
        let contributions = [
            Contribution::new(Operator::PostMul, 1.5),
            Contribution::new(Operator::ModSub, 2.0),
            Contribution::new(Operator::ModAdd, 7.0),
            Contribution::new(Operator::PreDiv, 4.0),
            Contribution::new(Operator::PreMul, 2.0),
            Contribution::new(Operator::PreAssign, 10.0),
        ];
        assert_eq!(combine(999.0, &contributions, true), 15.0);
    }

    #[test]
    fn test_assign_last_wins() {
        let contributions = [
            Contribution::new(Operator::PreAssign, 1.0),
            Contribution::new(Operator::PreAssign, 2.0),
            Contribution::new(Operator::ModAdd, 1.0),
            Contribution::new(Operator::PostAssign, 8.0),
            Contribution::new(Operator::PostAssign, 9.0),
        ];
        assert_eq!(combine(0.0, &contributions, true), 9.0);
        assert_eq!(combine(0.0, &contributions[..3], true), 3.0);
    }

    #[test]
    fn test_division_by_zero_is_skipped() {
        let contributions = [
            Contribution::new(Operator::PreDiv, 0.0),
            Contribution::new(Operator::PostDiv, 0.0),
            Contribution::penalized(Operator::PostDiv, 0.0),
        ];
        assert_eq!(combine(5.0, &contributions, true), 5.0);
    }

    #[test]
    fn test_penalized_mul_and_div_convert_to_percent() {
        // PostMul 1.5 is +50%, PostDiv 0.5 is +100%: ranks 100% then 50%
        let contributions = [
            Contribution::penalized(Operator::PostMul, 1.5),
            Contribution::penalized(Operator::PostDiv, 0.5),
        ];
        let expected = 10.0 * 2.0 * (1.0 + 0.5 * penalty_factor(1));
        let value = combine(10.0, &contributions, true);
        assert!((value - expected).abs() < 1e-9);
    }

    #[test]
    fn test_no_contributions_keeps_base() {
        assert_eq!(combine(42.0, &[], false), 42.0);
    }
}
