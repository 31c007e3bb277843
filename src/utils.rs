//! Shared numeric helpers for distributions over candidates.

/// Probabilities at or below this value are treated as zero when computing
/// entropy, so eliminated candidates cannot contribute NaN or noise.
pub const ENTROPY_FLOOR: f64 = 1e-10;

/// Calculate Shannon entropy from a probability distribution, in bits.
///
/// The Shannon entropy is calculated as: H = -sum(p * log2(p)) for p above
/// [`ENTROPY_FLOOR`].
///
/// # Arguments
///
/// * `probabilities` - Iterator of probability values that should sum to 1.0
///
/// # Returns
///
/// The Shannon entropy value in bits (always non-negative).
///
/// # Examples
///
/// ```
/// use inquest::utils::shannon_entropy;
///
/// // Uniform distribution over 2 outcomes is exactly one bit
/// let entropy = shannon_entropy(vec![0.5, 0.5]);
/// assert!((entropy - 1.0).abs() < 0.001);
///
/// // Deterministic distribution (zero entropy)
/// let entropy = shannon_entropy(vec![1.0, 0.0, 0.0]);
/// assert!(entropy.abs() < 0.001);
/// ```
pub fn shannon_entropy<I>(probabilities: I) -> f64
where
    I: IntoIterator<Item = f64>,
{
    probabilities
        .into_iter()
        .filter(|&p| p > ENTROPY_FLOOR)
        .map(|p| -p * p.log2())
        .sum()
}

/// Calculate entropy from weights (normalizes first).
///
/// This is a convenience function that normalizes weights to probabilities
/// and then calculates Shannon entropy. It is what the selector uses on the
/// hypothetical post-answer distributions when scoring a question.
///
/// # Arguments
///
/// * `weights` - Iterator of non-negative weight values
///
/// # Returns
///
/// The Shannon entropy value in bits, or 0.0 if total weight is zero or
/// negative.
///
/// # Examples
///
/// ```
/// use inquest::utils::entropy_from_weights;
///
/// // Entropy from equal weights
/// let entropy = entropy_from_weights(vec![1.0, 1.0]);
/// assert!((entropy - 1.0).abs() < 0.001);
///
/// // Zero total weight returns zero entropy
/// let entropy = entropy_from_weights(vec![0.0, 0.0]);
/// assert_eq!(entropy, 0.0);
/// ```
pub fn entropy_from_weights<I>(weights: I) -> f64
where
    I: IntoIterator<Item = f64>,
{
    normalize_weights(weights)
        .map(shannon_entropy)
        .unwrap_or(0.0)
}

/// Fallback behavior when weight normalization fails (zero or negative total).
#[derive(Debug, Clone, Copy)]
pub enum NormalizationFallback {
    /// Return None if normalization fails
    None,
    /// Fall back to uniform distribution
    Uniform,
}

/// Normalize weights to probabilities that sum to 1.0 with configurable fallback.
///
/// This utility converts arbitrary non-negative weights into normalized
/// probabilities. When the total weight is zero or non-finite, different
/// fallback strategies can be used. Belief updates rely on the uniform
/// fallback: a run of contradictory answers that zeroes every candidate
/// resets to a uniform distribution instead of dividing by zero.
///
/// # Arguments
///
/// * `weights` - Iterator of weight values
/// * `fallback` - Strategy to use when normalization fails
/// * `epsilon` - Minimum value to clamp probabilities to (prevents exact zeros)
///
/// # Returns
///
/// - `Some(Vec<f64>)` containing normalized probabilities
/// - `None` if normalization fails and `NormalizationFallback::None` is used
///
/// # Examples
///
/// ```
/// use inquest::utils::{normalize_weights_with_options, NormalizationFallback};
///
/// // Basic normalization
/// let normalized = normalize_weights_with_options(
///     vec![1.0, 2.0, 1.0],
///     NormalizationFallback::None,
///     None,
/// ).unwrap();
/// assert_eq!(normalized, vec![0.25, 0.5, 0.25]);
///
/// // Fallback to uniform when total is zero
/// let normalized = normalize_weights_with_options(
///     vec![0.0, 0.0, 0.0],
///     NormalizationFallback::Uniform,
///     None,
/// ).unwrap();
/// assert_eq!(normalized, vec![1.0/3.0, 1.0/3.0, 1.0/3.0]);
///
/// // With epsilon clamping (values are clamped, then renormalized)
/// let normalized = normalize_weights_with_options(
///     vec![1.0, 0.0],
///     NormalizationFallback::None,
///     Some(1e-12),
/// ).unwrap();
/// assert!(normalized.iter().all(|&x| x > 0.0));
/// assert!((normalized.iter().sum::<f64>() - 1.0).abs() < 1e-10);
/// ```
pub fn normalize_weights_with_options<I>(
    weights: I,
    fallback: NormalizationFallback,
    epsilon: Option<f64>,
) -> Option<Vec<f64>>
where
    I: IntoIterator<Item = f64>,
{
    let weights_vec: Vec<f64> = weights.into_iter().collect();

    if weights_vec.is_empty() {
        return match fallback {
            NormalizationFallback::None => None,
            NormalizationFallback::Uniform => Some(vec![]),
        };
    }

    let eps = epsilon.unwrap_or(0.0);
    let sum: f64 = weights_vec.iter().sum();

    if !sum.is_finite() || sum <= eps {
        return apply_fallback(fallback, weights_vec.len());
    }

    let mut normalized: Vec<f64> = if eps > 0.0 {
        weights_vec.iter().map(|&w| (w / sum).max(eps)).collect()
    } else {
        weights_vec.iter().map(|&w| w / sum).collect()
    };

    // If epsilon was applied, renormalize to ensure sum = 1.0
    if eps > 0.0 {
        let total: f64 = normalized.iter().sum();
        if !total.is_finite() || total <= 0.0 {
            return apply_fallback(fallback, normalized.len());
        }
        for value in normalized.iter_mut() {
            *value /= total;
        }
    }

    Some(normalized)
}

fn apply_fallback(fallback: NormalizationFallback, len: usize) -> Option<Vec<f64>> {
    match fallback {
        NormalizationFallback::None => None,
        NormalizationFallback::Uniform => {
            let uniform = 1.0 / len as f64;
            Some(vec![uniform; len])
        }
    }
}

/// Normalize weights to probabilities that sum to 1.0.
///
/// # Arguments
///
/// * `weights` - Iterator of non-negative weight values
///
/// # Returns
///
/// - `Some(Vec<f64>)` containing normalized probabilities if total weight is positive
/// - `None` if total weight is zero or negative
///
/// # Examples
///
/// ```
/// use inquest::utils::normalize_weights;
///
/// let normalized = normalize_weights(vec![1.0, 2.0, 1.0]).unwrap();
/// assert_eq!(normalized, vec![0.25, 0.5, 0.25]);
///
/// let normalized = normalize_weights(vec![0.0, 0.0]);
/// assert_eq!(normalized, None);
/// ```
pub fn normalize_weights<I>(weights: I) -> Option<Vec<f64>>
where
    I: IntoIterator<Item = f64>,
{
    normalize_weights_with_options(weights, NormalizationFallback::None, None)
}

/// Normalize weighted key-value pairs while preserving keys.
///
/// This is a convenience function that takes a vector of (K, f64) pairs,
/// normalizes the weights to sum to 1.0, and returns the keys paired with
/// normalized weights. Adaptive priors use it to turn blended play counts
/// back into a prior distribution over entities.
///
/// # Type Parameters
///
/// * `K` - Type of the keys (e.g., entity ids)
///
/// # Arguments
///
/// * `weighted_items` - Vector of (key, weight) pairs where weights are non-negative
///
/// # Returns
///
/// - `Some(Vec<(K, f64)>)` with normalized probabilities if total weight is positive
/// - `None` if total weight is zero or negative
///
/// # Examples
///
/// ```
/// use inquest::utils::normalize_weighted_pairs;
///
/// let picks = vec![("mario", 1.0), ("luigi", 2.0), ("peach", 1.0)];
/// let normalized = normalize_weighted_pairs(picks).unwrap();
/// assert_eq!(normalized, vec![("mario", 0.25), ("luigi", 0.5), ("peach", 0.25)]);
///
/// let picks = vec![("mario", 0.0), ("luigi", 0.0)];
/// assert_eq!(normalize_weighted_pairs(picks), None);
/// ```
pub fn normalize_weighted_pairs<K>(weighted_items: Vec<(K, f64)>) -> Option<Vec<(K, f64)>> {
    let (keys, weights): (Vec<_>, Vec<_>) = weighted_items.into_iter().unzip();

    let normalized = normalize_weights(weights)?;

    Some(keys.into_iter().zip(normalized).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entropy_is_in_bits() {
        assert!((shannon_entropy(vec![0.5, 0.5]) - 1.0).abs() < 1e-12);
        assert!((shannon_entropy(vec![0.25; 4]) - 2.0).abs() < 1e-12);
    }

    #[test]
    fn entropy_ignores_floored_probabilities() {
        // A candidate squeezed below the floor contributes nothing.
        let entropy = shannon_entropy(vec![1.0 - 1e-12, 1e-12]);
        assert!(entropy.abs() < 1e-9);
    }

    #[test]
    fn entropy_from_weights_renormalizes() {
        // Weights [3, 1] normalize to [0.75, 0.25].
        let expected = -(0.75f64 * 0.75f64.log2() + 0.25 * 0.25f64.log2());
        assert!((entropy_from_weights(vec![3.0, 1.0]) - expected).abs() < 1e-12);
    }

    #[test]
    fn normalize_weights_returns_none_for_zero_total() {
        let normalized = normalize_weights(vec![0.0, 0.0]);
        assert!(normalized.is_none(), "zero weights should return None");
    }

    #[test]
    fn normalize_weights_uniform_fallback() {
        let normalized = normalize_weights_with_options(
            vec![0.0, 0.0, 0.0],
            NormalizationFallback::Uniform,
            None,
        )
        .expect("uniform fallback should produce probabilities");
        assert_eq!(normalized, vec![1.0 / 3.0; 3]);
    }

    #[test]
    fn normalize_weights_with_epsilon_rebalances() {
        let normalized =
            normalize_weights_with_options(vec![1.0, 0.0], NormalizationFallback::None, Some(1e-6))
                .expect("epsilon-normalized weights should produce probabilities");
        assert!(
            normalized.iter().all(|p| *p > 0.0),
            "epsilon normalization should avoid zeros: {normalized:?}"
        );
        let sum: f64 = normalized.iter().sum();
        assert!(
            (sum - 1.0).abs() < 1e-9,
            "normalized weights must sum to 1, got {sum}"
        );
    }

    #[test]
    fn normalize_weighted_pairs_none_when_zero_total() {
        let normalized = normalize_weighted_pairs(vec![(0, 0.0), (1, 0.0)]);
        assert!(
            normalized.is_none(),
            "normalize_weighted_pairs should return None when total weight is zero"
        );
    }
}
