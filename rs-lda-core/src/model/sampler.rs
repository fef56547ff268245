use rand::Rng;

use crate::error::{LdaError, Result};

/// Draws an index from a discrete, non-negative weight vector.
///
/// The Gibbs sampler only ever talks to randomness through this trait when it
/// resamples a topic, so tests can swap in a fixed-sequence implementation and
/// pin the exact chain a run follows.
///
/// Implementations are seeded once per run, never per call.
pub trait CategoricalSampler {
	/// Returns an index in `0..weights.len()`.
	///
	/// The weights need not be normalized.
	///
	/// # Errors
	/// Returns `LdaError::DegenerateDistribution` if `weights` is empty or
	/// its total is not strictly positive.
	fn sample(&mut self, weights: &[f64]) -> Result<usize>;
}

/// Inverse-CDF categorical sampler backed by any `rand` generator.
///
/// Draws `u` uniformly in `[0, total)` and returns the smallest index whose
/// cumulative weight exceeds `u`.
#[derive(Debug, Clone)]
pub struct RngSampler<R> {
	rng: R,
}

impl<R: Rng> RngSampler<R> {
	/// Wraps an already seeded generator.
	pub fn new(rng: R) -> Self {
		Self { rng }
	}

	/// Gives access to the underlying generator.
	pub fn rng_mut(&mut self) -> &mut R {
		&mut self.rng
	}

	/// Unwraps the generator, for example to continue the same stream elsewhere.
	pub fn into_inner(self) -> R {
		self.rng
	}
}

impl<R: Rng> CategoricalSampler for RngSampler<R> {
	fn sample(&mut self, weights: &[f64]) -> Result<usize> {
		let scale = checked_scale(weights)?;
		let total: f64 = weights.iter().map(|w| w / scale).sum();

		let mut r = self.rng.random_range(0.0..total);
		let mut fallback = 0;
		for (index, &weight) in weights.iter().enumerate() {
			let scaled = weight / scale;
			if r < scaled {
				return Ok(index);
			}
			r -= scaled;
			if weight > 0.0 {
				fallback = index;
			}
		}

		// Rounding can leave `r` marginally above the last cumulative bound.
		Ok(fallback)
	}
}

/// Validates a weight vector and returns its largest weight.
///
/// Dividing by that weight keeps every term in `[0, 1]`, so the total stays
/// finite (at most `weights.len()`) however large the raw weights are.
pub(crate) fn checked_scale(weights: &[f64]) -> Result<f64> {
	if weights.is_empty() {
		return Err(LdaError::DegenerateDistribution("empty weight vector".to_owned()));
	}

	let mut largest = 0.0f64;
	for (index, &weight) in weights.iter().enumerate() {
		if !weight.is_finite() || weight < 0.0 {
			return Err(LdaError::DegenerateDistribution(format!(
				"weight {} is {}, expected a finite non-negative value",
				index, weight
			)));
		}
		largest = largest.max(weight);
	}

	if largest <= 0.0 {
		return Err(LdaError::DegenerateDistribution(
			"all weights are zero, expected a positive total".to_owned(),
		));
	}
	Ok(largest)
}
