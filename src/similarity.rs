//! Embedding similarity utilities.
//!
//! Used by the behavioral checks to score *how wrong* a missed prediction
//! was: a miss whose embedding sits close to the true item's embedding is a
//! better failure than a miss in a different region of the space entirely.

/// Cosine similarity between two vectors.
///
/// Returns a value in `[-1.0, 1.0]`. A zero-norm vector has no direction,
/// so similarity against it is defined as 0.0 rather than NaN.
///
/// # Examples
///
/// ```
/// use receval::similarity::cosine_similarity;
///
/// let sim = cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]);
/// assert!((sim - 1.0).abs() < 1e-9);
///
/// let sim = cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]);
/// assert!(sim.abs() < 1e-9);
/// ```
#[must_use]
pub fn cosine_similarity(u: &[f32], v: &[f32]) -> f64 {
    debug_assert_eq!(u.len(), v.len(), "vector dimensions must match");

    let mut dot = 0.0f64;
    let mut norm_u = 0.0f64;
    let mut norm_v = 0.0f64;
    for (a, b) in u.iter().zip(v.iter()) {
        let a = f64::from(*a);
        let b = f64::from(*b);
        dot += a * b;
        norm_u += a * a;
        norm_v += b * b;
    }

    let denom = norm_u.sqrt() * norm_v.sqrt();
    if denom == 0.0 {
        return 0.0;
    }
    dot / denom
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_vectors_are_maximally_similar() {
        let v = [0.3f32, -0.2, 0.9];
        assert!((cosine_similarity(&v, &v) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn opposite_vectors_are_minimally_similar() {
        let u = [1.0f32, 2.0];
        let v = [-1.0f32, -2.0];
        assert!((cosine_similarity(&u, &v) + 1.0).abs() < 1e-9);
    }

    #[test]
    fn zero_vector_yields_zero_not_nan() {
        let sim = cosine_similarity(&[0.0, 0.0], &[1.0, 1.0]);
        assert_eq!(sim, 0.0);
        assert!(!sim.is_nan());
    }

    #[test]
    fn scale_invariant() {
        let u = [1.0f32, 2.0, 3.0];
        let v = [2.0f32, 4.0, 6.0];
        assert!((cosine_similarity(&u, &v) - 1.0).abs() < 1e-9);
    }
}
