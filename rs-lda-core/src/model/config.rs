use serde::{Deserialize, Serialize};

use crate::error::{LdaError, Result};

/// Hyperparameters and run settings for one Gibbs sampling run.
///
/// # Fields
/// - `num_topics`: K, the number of latent topics.
/// - `vocabulary_size`: V, only used in the `V * beta` normalisation terms. It
///   need not equal the number of distinct terms in the corpus.
/// - `alpha`: symmetric document-topic Dirichlet prior.
/// - `beta`: symmetric topic-term Dirichlet prior.
/// - `iterations`: number of full sweeps.
/// - `seed`: fixes the random stream. `None` draws one from OS entropy.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct LdaConfig {
	pub num_topics: usize,
	pub vocabulary_size: usize,
	#[serde(default = "default_alpha")]
	pub alpha: f64,
	#[serde(default = "default_beta")]
	pub beta: f64,
	#[serde(default = "default_iterations")]
	pub iterations: usize,
	#[serde(default)]
	pub seed: Option<u64>,
}

fn default_alpha() -> f64 {
	0.1
}

fn default_beta() -> f64 {
	0.01
}

fn default_iterations() -> usize {
	1000
}

impl LdaConfig {
	/// Creates a configuration with default priors (alpha 0.1, beta 0.01),
	/// 1000 sweeps and no fixed seed.
	pub fn new(num_topics: usize, vocabulary_size: usize) -> Self {
		Self {
			num_topics,
			vocabulary_size,
			alpha: default_alpha(),
			beta: default_beta(),
			iterations: default_iterations(),
			seed: None,
		}
	}

	/// Sets the document-topic prior.
	pub fn alpha(mut self, alpha: f64) -> Self {
		self.alpha = alpha;
		self
	}

	/// Sets the topic-term prior.
	pub fn beta(mut self, beta: f64) -> Self {
		self.beta = beta;
		self
	}

	pub fn iterations(mut self, iterations: usize) -> Self {
		self.iterations = iterations;
		self
	}

	/// Fixes the seed so the run can be replayed exactly.
	pub fn seed(mut self, seed: u64) -> Self {
		self.seed = Some(seed);
		self
	}

	/// Checks the hyperparameters needed to build a sampler.
	///
	/// Accepts `iterations == 0`; use [`validate`](Self::validate) for a full run.
	///
	/// # Errors
	/// Returns `LdaError::Configuration` if K or V is zero, or if alpha or beta
	/// is not a finite positive number.
	pub fn validate_priors(&self) -> Result<()> {
		if self.num_topics == 0 {
			return Err(LdaError::Configuration("number of topics must be > 0".to_owned()));
		}
		if self.vocabulary_size == 0 {
			return Err(LdaError::Configuration("vocabulary size must be > 0".to_owned()));
		}
		check_positive("alpha", self.alpha)?;
		check_positive("beta", self.beta)?;
		Ok(())
	}

	/// Full validation for a complete run.
	///
	/// # Errors
	/// Everything [`validate_priors`](Self::validate_priors) rejects, plus
	/// `iterations == 0`.
	pub fn validate(&self) -> Result<()> {
		self.validate_priors()?;
		if self.iterations == 0 {
			return Err(LdaError::Configuration("iterations must be > 0".to_owned()));
		}
		Ok(())
	}
}

fn check_positive(name: &str, value: f64) -> Result<()> {
	if !value.is_finite() || value <= 0.0 {
		return Err(LdaError::Configuration(format!(
			"{} must be a finite positive number, got {}",
			name, value
		)));
	}
	Ok(())
}
