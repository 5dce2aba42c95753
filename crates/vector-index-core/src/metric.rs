//! L2 distance between dense float vectors.
//!
//! This is the only metric the core supports (see Non-goals); pluggable
//! metrics are out of scope.

/// Computes the Euclidean (L2) distance between two equal-length vectors.
///
/// Accumulates in `f64` regardless of the `f32` input precision, matching
/// the accumulation width used by every priority structure in this crate
/// (`Record::distance` is `f64`).
///
/// # Panics
///
/// Panics in debug builds if `a.len() != b.len()`; callers are expected to
/// have already validated dimensions via [`crate::error::Error::DimensionMismatch`].
#[must_use]
pub fn l2_distance(a: &[f32], b: &[f32]) -> f64 {
    debug_assert_eq!(a.len(), b.len(), "l2_distance: vector dimensions must match");

    a.iter()
        .zip(b.iter())
        .map(|(&x, &y)| {
            let d = f64::from(x) - f64::from(y);
            d * d
        })
        .sum::<f64>()
        .sqrt()
}
