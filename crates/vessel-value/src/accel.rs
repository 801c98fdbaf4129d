//! §6.5 SIMD accelerator interface.
//!
//! Defines the contract a hardware-accelerated aggregation backend would
//! implement; only the portable scalar fallback is shipped here. No SIMD
//! intrinsics are implemented by this crate — per the source spec's
//! Non-goals, vectorized backends are future work behind this trait.

/// A pluggable aggregation backend over contiguous `f32`/`f64` slices.
pub trait AggregationPolicy {
    /// Human-readable backend name, surfaced in diagnostics.
    const NAME: &'static str;
    /// Nominal SIMD lane width this backend targets (1 for the scalar policy).
    const WIDTH: usize;

    /// Sums a slice of `f32`s.
    fn sum_floats(xs: &[f32]) -> f32;
    /// Sums a slice of `f64`s.
    fn sum_doubles(xs: &[f64]) -> f64;
    /// Smallest value in `xs`, or `None` if empty.
    fn min_float(xs: &[f32]) -> Option<f32>;
    /// Largest value in `xs`, or `None` if empty.
    fn max_float(xs: &[f32]) -> Option<f32>;
}

/// The default (and, for now, only) aggregation backend: plain scalar loops.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScalarPolicy;

impl AggregationPolicy for ScalarPolicy {
    const NAME: &'static str = "scalar";
    const WIDTH: usize = 1;

    fn sum_floats(xs: &[f32]) -> f32 {
        xs.iter().sum()
    }

    fn sum_doubles(xs: &[f64]) -> f64 {
        xs.iter().sum()
    }

    fn min_float(xs: &[f32]) -> Option<f32> {
        xs.iter().copied().fold(None, |acc, x| match acc {
            None => Some(x),
            Some(m) => Some(m.min(x)),
        })
    }

    fn max_float(xs: &[f32]) -> Option<f32> {
        xs.iter().copied().fold(None, |acc, x| match acc {
            None => Some(x),
            Some(m) => Some(m.max(x)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalar_policy_aggregates() {
        let xs = [1.0f32, 2.0, 3.0];
        assert_eq!(ScalarPolicy::sum_floats(&xs), 6.0);
        assert_eq!(ScalarPolicy::min_float(&xs), Some(1.0));
        assert_eq!(ScalarPolicy::max_float(&xs), Some(3.0));
        assert_eq!(ScalarPolicy::min_float(&[]), None);
    }

    #[test]
    fn scalar_policy_sums_doubles() {
        let xs = [1.5f64, 2.5, 3.0];
        assert_eq!(ScalarPolicy::sum_doubles(&xs), 7.0);
    }
}
