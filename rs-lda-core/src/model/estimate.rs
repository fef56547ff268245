use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::config::LdaConfig;
use super::corpus::Corpus;
use super::counts::SufficientStatistics;
use crate::error::Result;
use crate::io;

/// Document-topic posterior mean.
///
/// `theta[m][k] = (n_m^(k) + alpha) / (n_m + K * alpha)`. Rows sum to one;
/// an empty document gets the uniform row `1 / K`.
pub fn estimate_theta(stats: &SufficientStatistics, alpha: f64) -> Vec<Vec<f64>> {
	let topics_alpha = stats.num_topics() as f64 * alpha;
	(0..stats.num_documents())
		.map(|doc| {
			let denominator = stats.doc_topic_sum(doc) as f64 + topics_alpha;
			stats
				.doc_topic_row(doc)
				.iter()
				.map(|&count| (count as f64 + alpha) / denominator)
				.collect()
		})
		.collect()
}

/// Topic-term posterior mean, materialized over each topic's observed support.
///
/// Only terms with a nonzero count under a topic appear in that topic's map,
/// so a topic's values sum to `(n_k + beta * |support|) / (n_k + V * beta)`
/// rather than one. [`probability`](Self::probability) fills in unseen terms.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Phi {
	/// `phi[k][term]`
	topics: Vec<HashMap<String, f64>>,
	/// Same pairs per topic, by descending probability then term.
	sorted: Vec<Vec<(String, f64)>>,
	/// `n_k`, kept for the unseen-term baseline.
	topic_term_sum: Vec<usize>,
	vocabulary_size: usize,
	beta: f64,
}

impl Phi {
	/// Number of topics.
	pub fn len(&self) -> usize {
		self.topics.len()
	}

	/// `true` when there are no topics.
	pub fn is_empty(&self) -> bool {
		self.topics.is_empty()
	}

	/// Term probabilities observed under `topic`.
	pub fn topic(&self, topic: usize) -> &HashMap<String, f64> {
		&self.topics[topic]
	}

	/// All topics' term maps.
	pub fn topics(&self) -> &[HashMap<String, f64>] {
		&self.topics
	}

	/// `(term, probability)` pairs of `topic`, most probable first.
	pub fn sorted(&self, topic: usize) -> &[(String, f64)] {
		&self.sorted[topic]
	}

	/// Probability an unseen term gets under `topic`: `beta / (n_k + V * beta)`.
	pub fn unseen_probability(&self, topic: usize) -> f64 {
		self.beta / (self.topic_term_sum[topic] as f64 + self.vocabulary_size as f64 * self.beta)
	}

	/// Posterior mean of `term` under `topic`, including terms outside the
	/// observed support.
	pub fn probability(&self, topic: usize, term: &str) -> f64 {
		match self.topics[topic].get(term) {
			Some(&p) => p,
			None => self.unseen_probability(topic),
		}
	}
}

/// Builds phi and its ranked view from the final counts.
pub fn estimate_phi(stats: &SufficientStatistics, corpus: &Corpus, vocabulary_size: usize, beta: f64) -> Phi {
	let vocabulary_beta = vocabulary_size as f64 * beta;
	let mut topics = Vec::with_capacity(stats.num_topics());
	let mut sorted = Vec::with_capacity(stats.num_topics());
	let mut topic_term_sum = Vec::with_capacity(stats.num_topics());

	for topic in 0..stats.num_topics() {
		let sum = stats.topic_term_sum(topic);
		let denominator = sum as f64 + vocabulary_beta;

		let mut ranked: Vec<(String, f64)> = stats
			.topic_terms(topic)
			.map(|(term, count)| (corpus.term(term).to_owned(), (count as f64 + beta) / denominator))
			.collect();
		ranked.sort_by(|(t_a, p_a), (t_b, p_b)| p_b.total_cmp(p_a).then_with(|| t_a.cmp(t_b)));

		topics.push(ranked.iter().cloned().collect());
		sorted.push(ranked);
		topic_term_sum.push(sum);
	}

	Phi { topics, sorted, topic_term_sum, vocabulary_size, beta }
}

/// Everything a finished run hands back to its caller.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Estimates {
	/// M x K document-topic matrix.
	pub theta: Vec<Vec<f64>>,
	pub phi: Phi,
	/// Seed the run actually used.
	pub seed: u64,
	/// Sweeps performed.
	pub iterations: usize,
}

impl Estimates {
	/// Estimates theta and phi from the final counts of a run.
	pub fn from_statistics(
		corpus: &Corpus,
		stats: &SufficientStatistics,
		config: &LdaConfig,
		seed: u64,
		iterations: usize,
	) -> Self {
		Self {
			theta: estimate_theta(stats, config.alpha),
			phi: estimate_phi(stats, corpus, config.vocabulary_size, config.beta),
			seed,
			iterations,
		}
	}

	/// The `n` most probable terms of `topic` (fewer if its support is smaller).
	pub fn top_terms(&self, topic: usize, n: usize) -> &[(String, f64)] {
		let ranked = self.phi.sorted(topic);
		&ranked[..n.min(ranked.len())]
	}

	/// Writes the estimates in postcard format.
	pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
		io::write_binary(path, self)
	}

	/// Reads estimates previously written by [`save`](Self::save).
	pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
		io::read_binary(path)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rand::SeedableRng;
	use rand::rngs::StdRng;

	fn stats(corpus: &Corpus, topics: usize) -> SufficientStatistics {
		SufficientStatistics::initialize(corpus, corpus.len(), topics, &mut StdRng::seed_from_u64(17)).unwrap()
	}

	#[test]
	fn theta_rows_sum_to_one() {
		let corpus = Corpus::from_tokens(&[vec!["a", "b", "c"], vec![], vec!["a"]]);
		let theta = estimate_theta(&stats(&corpus, 3), 0.5);
		assert_eq!(theta.len(), 3);
		for row in &theta {
			assert_eq!(row.len(), 3);
			assert!((row.iter().sum::<f64>() - 1.0).abs() < 1e-9);
		}
		for p in &theta[1] {
			assert!((p - 1.0 / 3.0).abs() < 1e-12);
		}
	}

	#[test]
	fn phi_sums_to_support_ratio() {
		let corpus = Corpus::from_tokens(&[vec!["a", "b", "a", "c"], vec!["b", "d"]]);
		let stats = stats(&corpus, 2);
		let (v, beta) = (10, 0.2);
		let phi = estimate_phi(&stats, &corpus, v, beta);

		for topic in 0..2 {
			let sum = stats.topic_term_sum(topic) as f64;
			let support = stats.topic_support(topic) as f64;
			let expected = (sum + beta * support) / (sum + beta * v as f64);
			let observed: f64 = phi.topic(topic).values().sum();
			assert!((observed - expected).abs() < 1e-12);
		}
	}

	#[test]
	fn sorted_view_is_descending_and_matches_map() {
		let corpus = Corpus::from_tokens(&[vec!["x", "y", "y", "z", "z", "z"]]);
		let stats = stats(&corpus, 1);
		let phi = estimate_phi(&stats, &corpus, 3, 0.1);

		let ranked = phi.sorted(0);
		assert_eq!(ranked.iter().map(|(t, _)| t.as_str()).collect::<Vec<_>>(), vec!["z", "y", "x"]);
		for (term, p) in ranked {
			assert_eq!(phi.topic(0)[term], *p);
		}
	}

	#[test]
	fn ties_break_by_term() {
		let corpus = Corpus::from_tokens(&[vec!["b", "a", "c"]]);
		let phi = estimate_phi(&stats(&corpus, 1), &corpus, 3, 0.1);
		let terms: Vec<&str> = phi.sorted(0).iter().map(|(t, _)| t.as_str()).collect();
		assert_eq!(terms, vec!["a", "b", "c"]);
	}

	#[test]
	fn unseen_terms_get_baseline() {
		let corpus = Corpus::from_tokens(&[vec!["a", "a"]]);
		let stats = stats(&corpus, 1);
		let phi = estimate_phi(&stats, &corpus, 5, 0.5);
		let expected = 0.5 / (2.0 + 5.0 * 0.5);
		assert!((phi.probability(0, "never") - expected).abs() < 1e-12);
		assert!((phi.probability(0, "a") - 2.5 / 4.5).abs() < 1e-12);
	}

	#[test]
	fn top_terms_truncates() {
		let corpus = Corpus::from_tokens(&[vec!["a", "b", "b"]]);
		let config = LdaConfig::new(1, 2).beta(0.1);
		let estimates = Estimates::from_statistics(&corpus, &stats(&corpus, 1), &config, 1, 0);
		assert_eq!(estimates.top_terms(0, 1).len(), 1);
		assert_eq!(estimates.top_terms(0, 1)[0].0, "b");
		assert_eq!(estimates.top_terms(0, 10).len(), 2);
	}
}
