use log::{debug, info};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::config::LdaConfig;
use super::corpus::Corpus;
use super::counts::SufficientStatistics;
use super::estimate::Estimates;
use super::sampler::{CategoricalSampler, RngSampler, checked_scale};
use crate::error::{LdaError, Result};

/// Collapsed Gibbs sampler over one corpus.
///
/// Owns the sufficient statistics of a single run and the categorical sampler
/// that drives it. Sweeps are strictly sequential: each token's conditional
/// sees the counts left by the token visited just before it.
///
/// # Responsibilities
/// - Resample one token (`visit`): decrement, draw from the conditional, increment
/// - Sweep every token once in document then position order
/// - Hand the final statistics to the estimators
#[derive(Debug)]
pub struct GibbsSampler<'c, S> {
	corpus: &'c Corpus,
	stats: SufficientStatistics,
	sampler: S,
	alpha: f64,
	beta: f64,
	/// `V * beta`
	vocabulary_beta: f64,
	vocabulary_size: usize,
	/// Scratch buffer for the K conditional weights.
	weights: Vec<f64>,
	sweeps: usize,
}

impl<'c, R: Rng> GibbsSampler<'c, RngSampler<R>> {
	/// Initializes a run from a random generator.
	///
	/// The generator first draws every initial topic, then is handed to a
	/// [`RngSampler`] for the sweeps, so one seed fixes the whole chain.
	///
	/// # Errors
	/// Returns `LdaError::Configuration` if the priors are invalid or
	/// `declared_documents` does not match the corpus.
	pub fn new(corpus: &'c Corpus, declared_documents: usize, config: &LdaConfig, mut rng: R) -> Result<Self> {
		config.validate_priors()?;
		let stats = SufficientStatistics::initialize(corpus, declared_documents, config.num_topics, &mut rng)?;
		Self::from_statistics(corpus, stats, config, RngSampler::new(rng))
	}
}

impl<'c, S: CategoricalSampler> GibbsSampler<'c, S> {
	/// Builds a sampler over already initialized statistics.
	///
	/// Used with a custom [`CategoricalSampler`], e.g. a fixed-sequence double.
	///
	/// # Errors
	/// Returns `LdaError::Configuration` if the priors are invalid or the
	/// statistics were built for a different corpus or topic count.
	pub fn from_statistics(
		corpus: &'c Corpus,
		stats: SufficientStatistics,
		config: &LdaConfig,
		sampler: S,
	) -> Result<Self> {
		config.validate_priors()?;
		if stats.num_topics() != config.num_topics {
			return Err(LdaError::Configuration(format!(
				"statistics hold {} topics, configuration asks for {}",
				stats.num_topics(),
				config.num_topics
			)));
		}
		if stats.num_documents() != corpus.len() {
			return Err(LdaError::Configuration(format!(
				"statistics hold {} documents, corpus has {}",
				stats.num_documents(),
				corpus.len()
			)));
		}

		Ok(Self {
			corpus,
			stats,
			sampler,
			alpha: config.alpha,
			beta: config.beta,
			vocabulary_beta: config.vocabulary_size as f64 * config.beta,
			vocabulary_size: config.vocabulary_size,
			weights: vec![0.0; config.num_topics],
			sweeps: 0,
		})
	}

	/// Fills `self.weights` with the unnormalized conditional of `(doc, pos)`.
	///
	/// `weight(k) = (n_k^(t) + beta) / (n_k + V * beta) * (n_m^(k) + alpha)`.
	/// The document factor `1 / (n_m + K * alpha)` is the same for every topic
	/// and cancels on normalization, so it is left out.
	///
	/// Falls back to log space when extreme priors push every weight to zero
	/// or out of range. The token must already be removed from the counts.
	fn fill_weights(&mut self, doc: usize, pos: usize) {
		let term = self.corpus.document(doc)[pos];

		for (topic, weight) in self.weights.iter_mut().enumerate() {
			*weight = (self.stats.topic_term_count(topic, term) as f64 + self.beta)
				/ (self.stats.topic_term_sum(topic) as f64 + self.vocabulary_beta)
				* (self.stats.doc_topic_count(doc, topic) as f64 + self.alpha);
		}

		if self.weights.iter().any(|w| !w.is_finite()) || self.weights.iter().all(|&w| w == 0.0) {
			self.fill_log_weights(doc, pos);
		}
	}

	/// Same conditional as [`fill_weights`](Self::fill_weights), computed in
	/// log space and rescaled so the largest weight is exactly one.
	fn fill_log_weights(&mut self, doc: usize, pos: usize) {
		let term = self.corpus.document(doc)[pos];
		let ln_alpha = self.alpha.ln();
		let ln_beta = self.beta.ln();
		let ln_vocabulary_beta = (self.vocabulary_size as f64).ln() + ln_beta;

		for (topic, weight) in self.weights.iter_mut().enumerate() {
			*weight = ln_add(ln_count(self.stats.topic_term_count(topic, term)), ln_beta)
				- ln_add(ln_count(self.stats.topic_term_sum(topic)), ln_vocabulary_beta)
				+ ln_add(ln_count(self.stats.doc_topic_count(doc, topic)), ln_alpha);
		}

		let largest = self.weights.iter().copied().fold(f64::NEG_INFINITY, f64::max);
		for weight in self.weights.iter_mut() {
			*weight = (*weight - largest).exp();
		}
	}

	/// Normalizes the scratch weights in place.
	fn normalize_weights(&mut self) -> Result<()> {
		let scale = checked_scale(&self.weights)?;
		for weight in self.weights.iter_mut() {
			*weight /= scale;
		}
		let total: f64 = self.weights.iter().sum();
		for weight in self.weights.iter_mut() {
			*weight /= total;
		}
		Ok(())
	}

	/// Conditional topic distribution `P(z = k | rest)` for the token at `(doc, pos)`.
	///
	/// The token must already be removed from the counts, otherwise it votes
	/// for its own topic. Outside a visit, this is the distribution the token
	/// would see if it were also counted, and is only useful for inspection.
	///
	/// # Errors
	/// Returns `LdaError::DegenerateDistribution` if the weights do not sum to
	/// a positive total.
	pub fn conditional_distribution(&mut self, doc: usize, pos: usize) -> Result<Vec<f64>> {
		self.fill_weights(doc, pos);
		self.normalize_weights()?;
		Ok(self.weights.clone())
	}

	/// Draws a new topic for the token at `(doc, pos)`.
	///
	/// Does not touch the counts or the assignment; see [`visit`](Self::visit).
	fn update_topic(&mut self, doc: usize, pos: usize) -> Result<usize> {
		self.fill_weights(doc, pos);
		self.normalize_weights()?;
		let topic = self.sampler.sample(&self.weights)?;
		if topic >= self.weights.len() {
			return Err(LdaError::InvariantViolation(format!(
				"sampler returned topic {} out of {}",
				topic,
				self.weights.len()
			)));
		}
		Ok(topic)
	}

	/// Resamples the topic of a single token.
	///
	/// Removes its current contribution, draws from the conditional of
	/// everything else, then adds it back under the new topic. Returns the new
	/// topic.
	///
	/// # Errors
	/// Any error means the counts are no longer trustworthy and the run must stop.
	pub fn visit(&mut self, doc: usize, pos: usize) -> Result<usize> {
		let term = self.corpus.document(doc)[pos];

		self.stats.decrement(doc, pos, term)?;
		let topic = self.update_topic(doc, pos)?;
		self.stats.set_topic(doc, pos, topic);
		self.stats.increment(doc, pos, term);

		Ok(topic)
	}

	/// Visits every token once, documents in order, positions in order.
	pub fn sweep(&mut self) -> Result<()> {
		let corpus = self.corpus;
		for (doc, terms) in corpus.documents().enumerate() {
			for pos in 0..terms.len() {
				self.visit(doc, pos)?;
			}
		}
		self.sweeps += 1;

		if cfg!(debug_assertions) {
			self.stats.verify(corpus)?;
		}
		Ok(())
	}

	/// Runs `count` full sweeps. Zero is a no-op.
	pub fn run_sweeps(&mut self, count: usize) -> Result<()> {
		for i in 0..count {
			self.sweep()?;
			debug!("sweep {}/{} done ({} total)", i + 1, count, self.sweeps);
		}
		Ok(())
	}

	/// Number of sweeps completed so far.
	pub fn sweeps(&self) -> usize {
		self.sweeps
	}

	/// Read-only view of the current counts.
	pub fn statistics(&self) -> &SufficientStatistics {
		&self.stats
	}

	/// Corpus the sampler runs over.
	pub fn corpus(&self) -> &'c Corpus {
		self.corpus
	}

	/// Document-topic prior.
	pub fn alpha(&self) -> f64 {
		self.alpha
	}

	/// Topic-term prior.
	pub fn beta(&self) -> f64 {
		self.beta
	}

	/// V, as used in the `V * beta` terms.
	pub fn vocabulary_size(&self) -> usize {
		self.vocabulary_size
	}

	/// Releases the counts once sampling is over.
	pub fn into_statistics(self) -> SufficientStatistics {
		self.stats
	}
}

/// `ln(n)`, with `ln(0) = -inf`.
fn ln_count(n: usize) -> f64 {
	(n as f64).ln()
}

/// `ln(exp(a) + exp(b))` without leaving log space.
fn ln_add(a: f64, b: f64) -> f64 {
	let (high, low) = if a >= b { (a, b) } else { (b, a) };
	if low == f64::NEG_INFINITY {
		return high;
	}
	high + (low - high).exp().ln_1p()
}

/// Picks the seed for a run: the configured one, or a fresh one from OS entropy.
pub(crate) fn resolve_seed(config: &LdaConfig) -> u64 {
	config.seed.unwrap_or_else(|| rand::rng().random())
}

/// Runs a complete collapsed Gibbs sampling job and returns its estimates.
///
/// Initializes from `config.seed` (or OS entropy, logged so the run can be
/// replayed), performs `config.iterations` sweeps and estimates theta and phi
/// from the final counts.
///
/// # Errors
/// - `LdaError::Configuration` if `config` is invalid or `declared_documents`
///   differs from `corpus.len()`; nothing is sampled.
/// - `LdaError::DegenerateDistribution` / `LdaError::InvariantViolation` if
///   the counts break mid-run; no partial estimates are returned.
pub fn run_gibbs_sampling(corpus: &Corpus, declared_documents: usize, config: &LdaConfig) -> Result<Estimates> {
	config.validate()?;
	let seed = resolve_seed(config);

	info!(
		"gibbs sampling: {} documents, {} tokens, K={}, V={}, alpha={}, beta={}, {} sweeps, seed={}",
		corpus.len(),
		corpus.total_tokens(),
		config.num_topics,
		config.vocabulary_size,
		config.alpha,
		config.beta,
		config.iterations,
		seed
	);

	let mut sampler = GibbsSampler::new(corpus, declared_documents, config, StdRng::seed_from_u64(seed))?;
	sampler.run_sweeps(config.iterations)?;

	info!("gibbs sampling finished after {} sweeps", sampler.sweeps());

	Ok(Estimates::from_statistics(
		corpus,
		sampler.statistics(),
		config,
		seed,
		sampler.sweeps(),
	))
}
