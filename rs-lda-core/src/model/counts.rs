use std::collections::HashMap;

use rand::Rng;

use super::corpus::Corpus;
use crate::error::{LdaError, Result};

/// Sufficient statistics of a collapsed Gibbs run.
///
/// Owns the per-token topic assignments `Z` together with the four count
/// tables derived from them. All of them are created once per run and then
/// mutated only through [`increment`](Self::increment) and
/// [`decrement`](Self::decrement); the estimators only read them.
///
/// # Invariants
/// Outside an in-flight single-token update:
/// - `sum_k doc_topic_count[m][k] == doc_topic_sum[m] == len(document m)`
/// - `sum_t topic_term_count[k][t] == topic_term_sum[k]`
/// - every stored topic-term count is strictly positive (zeros are pruned), so
///   the keys of `topic_term_count[k]` are exactly the observed support of `k`
#[derive(Clone, Debug)]
pub struct SufficientStatistics {
	num_topics: usize,
	/// `Z[doc][pos]`, the topic currently assigned to each token.
	assignments: Vec<Vec<usize>>,
	/// `n_m^(k)`
	doc_topic_count: Vec<Vec<usize>>,
	/// `n_m`
	doc_topic_sum: Vec<usize>,
	/// `n_k^(t)`, sparse over term ids.
	topic_term_count: Vec<HashMap<usize, usize>>,
	/// `n_k`
	topic_term_sum: Vec<usize>,
}

impl SufficientStatistics {
	/// Allocates zeroed tables shaped after `corpus` with every token on topic 0.
	///
	/// The counts do not reflect the assignments until each token has been
	/// incremented once; [`initialize`](Self::initialize) does that.
	fn allocate(corpus: &Corpus, num_topics: usize) -> Self {
		let documents = corpus.len();
		Self {
			num_topics,
			assignments: corpus.documents().map(|doc| vec![0; doc.len()]).collect(),
			doc_topic_count: vec![vec![0; num_topics]; documents],
			doc_topic_sum: vec![0; documents],
			topic_term_count: vec![HashMap::new(); num_topics],
			topic_term_sum: vec![0; num_topics],
		}
	}

	/// Builds the statistics for a fresh run.
	///
	/// Every token draws a uniform initial topic in `0..num_topics` (row-major
	/// order), then is counted once in the same order.
	///
	/// # Errors
	/// Returns `LdaError::Configuration` if `declared_documents` differs from
	/// the corpus size or `num_topics == 0`.
	pub fn initialize<R: Rng + ?Sized>(
		corpus: &Corpus,
		declared_documents: usize,
		num_topics: usize,
		rng: &mut R,
	) -> Result<Self> {
		if declared_documents != corpus.len() {
			return Err(LdaError::Configuration(format!(
				"declared {} documents but the token matrix holds {}",
				declared_documents,
				corpus.len()
			)));
		}
		if num_topics == 0 {
			return Err(LdaError::Configuration("number of topics must be > 0".to_owned()));
		}

		let mut stats = Self::allocate(corpus, num_topics);

		for row in stats.assignments.iter_mut() {
			for topic in row.iter_mut() {
				*topic = rng.random_range(0..num_topics);
			}
		}

		for (doc, terms) in corpus.documents().enumerate() {
			for (pos, &term) in terms.iter().enumerate() {
				stats.increment(doc, pos, term);
			}
		}

		Ok(stats)
	}

	/// Adds the token at `(doc, pos)` to the counts of its current topic.
	pub(crate) fn increment(&mut self, doc: usize, pos: usize, term: usize) {
		let topic = self.assignments[doc][pos];
		self.doc_topic_count[doc][topic] += 1;
		self.doc_topic_sum[doc] += 1;
		*self.topic_term_count[topic].entry(term).or_insert(0) += 1;
		self.topic_term_sum[topic] += 1;
	}

	/// Removes the token at `(doc, pos)` from the counts of its current topic.
	///
	/// # Errors
	/// Returns `LdaError::InvariantViolation` if any of the four counters is
	/// already zero, which means the token was never counted.
	pub(crate) fn decrement(&mut self, doc: usize, pos: usize, term: usize) -> Result<()> {
		let topic = self.assignments[doc][pos];

		let term_count = self.topic_term_count[topic]
			.get_mut(&term)
			.ok_or_else(|| underflow("topic-term count", doc, pos, topic))?;
		*term_count -= 1;
		if *term_count == 0 {
			self.topic_term_count[topic].remove(&term);
		}

		decrement_counter(&mut self.topic_term_sum[topic], "topic-term sum", doc, pos, topic)?;
		decrement_counter(&mut self.doc_topic_count[doc][topic], "document-topic count", doc, pos, topic)?;
		decrement_counter(&mut self.doc_topic_sum[doc], "document-topic sum", doc, pos, topic)?;
		Ok(())
	}

	/// Reassigns a token. Only valid between a `decrement` and an `increment`.
	pub(crate) fn set_topic(&mut self, doc: usize, pos: usize, topic: usize) {
		self.assignments[doc][pos] = topic;
	}

	/// Number of topics (K).
	pub fn num_topics(&self) -> usize {
		self.num_topics
	}

	/// Number of documents (M).
	pub fn num_documents(&self) -> usize {
		self.doc_topic_sum.len()
	}

	/// Topic currently assigned to the token at `(doc, pos)`.
	pub fn topic(&self, doc: usize, pos: usize) -> usize {
		self.assignments[doc][pos]
	}

	/// The full assignment matrix `Z`.
	pub fn assignments(&self) -> &[Vec<usize>] {
		&self.assignments
	}

	/// Tokens of document `doc` assigned to `topic`.
	pub fn doc_topic_count(&self, doc: usize, topic: usize) -> usize {
		self.doc_topic_count[doc][topic]
	}

	/// One row of the document-topic table.
	pub fn doc_topic_row(&self, doc: usize) -> &[usize] {
		&self.doc_topic_count[doc]
	}

	/// Token count of document `doc`, over all topics.
	pub fn doc_topic_sum(&self, doc: usize) -> usize {
		self.doc_topic_sum[doc]
	}

	/// Occurrences of `term` under `topic`, zero when unobserved.
	pub fn topic_term_count(&self, topic: usize, term: usize) -> usize {
		self.topic_term_count[topic].get(&term).copied().unwrap_or(0)
	}

	/// Sparse `(term id, count)` pairs observed under `topic`.
	pub fn topic_terms(&self, topic: usize) -> impl Iterator<Item = (usize, usize)> + '_ {
		self.topic_term_count[topic].iter().map(|(&term, &count)| (term, count))
	}

	/// Number of distinct terms currently observed under `topic`.
	pub fn topic_support(&self, topic: usize) -> usize {
		self.topic_term_count[topic].len()
	}

	/// Tokens assigned to `topic` over the whole corpus.
	pub fn topic_term_sum(&self, topic: usize) -> usize {
		self.topic_term_sum[topic]
	}

	/// Checks every count invariant against `corpus` from scratch.
	///
	/// This is O(total tokens + K * support) and is meant for tests and
	/// debug builds, not for the per-token path.
	///
	/// # Errors
	/// Returns `LdaError::InvariantViolation` describing the first mismatch.
	pub fn verify(&self, corpus: &Corpus) -> Result<()> {
		if corpus.len() != self.num_documents() {
			return Err(LdaError::InvariantViolation(format!(
				"statistics cover {} documents, corpus has {}",
				self.num_documents(),
				corpus.len()
			)));
		}

		let mut expected_doc = vec![vec![0usize; self.num_topics]; corpus.len()];
		let mut expected_term: Vec<HashMap<usize, usize>> = vec![HashMap::new(); self.num_topics];

		for (doc, terms) in corpus.documents().enumerate() {
			if self.assignments[doc].len() != terms.len() {
				return Err(LdaError::InvariantViolation(format!(
					"document {} has {} tokens but {} assignments",
					doc,
					terms.len(),
					self.assignments[doc].len()
				)));
			}
			for (pos, &term) in terms.iter().enumerate() {
				let topic = self.assignments[doc][pos];
				if topic >= self.num_topics {
					return Err(LdaError::InvariantViolation(format!(
						"token ({}, {}) assigned to topic {} with only {} topics",
						doc, pos, topic, self.num_topics
					)));
				}
				expected_doc[doc][topic] += 1;
				*expected_term[topic].entry(term).or_insert(0) += 1;
			}
		}

		for (doc, expected) in expected_doc.iter().enumerate() {
			if &self.doc_topic_count[doc] != expected {
				return Err(LdaError::InvariantViolation(format!(
					"document {} topic counts {:?}, assignments imply {:?}",
					doc, self.doc_topic_count[doc], expected
				)));
			}
			let row_sum: usize = expected.iter().sum();
			if self.doc_topic_sum[doc] != row_sum || row_sum != corpus.document_len(doc) {
				return Err(LdaError::InvariantViolation(format!(
					"document {} sum is {}, row sums to {}, length is {}",
					doc,
					self.doc_topic_sum[doc],
					row_sum,
					corpus.document_len(doc)
				)));
			}
		}

		for (topic, expected) in expected_term.iter().enumerate() {
			if &self.topic_term_count[topic] != expected {
				return Err(LdaError::InvariantViolation(format!(
					"topic {} term counts disagree with assignments",
					topic
				)));
			}
			let total: usize = expected.values().sum();
			if self.topic_term_sum[topic] != total {
				return Err(LdaError::InvariantViolation(format!(
					"topic {} sum is {}, counts add up to {}",
					topic, self.topic_term_sum[topic], total
				)));
			}
		}

		Ok(())
	}
}

fn decrement_counter(counter: &mut usize, name: &str, doc: usize, pos: usize, topic: usize) -> Result<()> {
	*counter = counter
		.checked_sub(1)
		.ok_or_else(|| underflow(name, doc, pos, topic))?;
	Ok(())
}

fn underflow(name: &str, doc: usize, pos: usize, topic: usize) -> LdaError {
	LdaError::InvariantViolation(format!(
		"{} underflow removing token ({}, {}) from topic {}",
		name, doc, pos, topic
	))
}

#[cfg(test)]
mod tests {
	use super::*;
	use rand::SeedableRng;
	use rand::rngs::StdRng;

	fn corpus() -> Corpus {
		Corpus::from_tokens(&[vec!["a", "b", "a"], vec![], vec!["c", "a"]])
	}

	#[test]
	fn initialize_populates_consistent_counts() {
		let corpus = corpus();
		let stats = SufficientStatistics::initialize(&corpus, 3, 4, &mut StdRng::seed_from_u64(9)).unwrap();

		stats.verify(&corpus).unwrap();
		assert_eq!(stats.doc_topic_sum(0), 3);
		assert_eq!(stats.doc_topic_sum(1), 0);
		assert_eq!(stats.doc_topic_sum(2), 2);
		let total: usize = (0..4).map(|k| stats.topic_term_sum(k)).sum();
		assert_eq!(total, corpus.total_tokens());
		assert!(stats.assignments().iter().flatten().all(|&k| k < 4));
	}

	#[test]
	fn initialize_rejects_document_count_mismatch() {
		let corpus = corpus();
		let result = SufficientStatistics::initialize(&corpus, 2, 4, &mut StdRng::seed_from_u64(9));
		assert!(matches!(result, Err(LdaError::Configuration(_))));
	}

	#[test]
	fn initialize_rejects_zero_topics() {
		let corpus = corpus();
		let result = SufficientStatistics::initialize(&corpus, 3, 0, &mut StdRng::seed_from_u64(9));
		assert!(matches!(result, Err(LdaError::Configuration(_))));
	}

	#[test]
	fn decrement_then_increment_restores_counts() {
		let corpus = corpus();
		let mut stats = SufficientStatistics::initialize(&corpus, 3, 2, &mut StdRng::seed_from_u64(1)).unwrap();
		let before = stats.clone();
		let term = corpus.document(0)[1];

		stats.decrement(0, 1, term).unwrap();
		assert_eq!(stats.doc_topic_sum(0), 2);
		stats.increment(0, 1, term);

		assert_eq!(stats.doc_topic_row(0), before.doc_topic_row(0));
		assert_eq!(stats.topic_term_sum(0), before.topic_term_sum(0));
		assert_eq!(stats.topic_term_sum(1), before.topic_term_sum(1));
		stats.verify(&corpus).unwrap();
	}

	#[test]
	fn decrement_prunes_emptied_terms() {
		let corpus = Corpus::from_tokens(&[vec!["solo"]]);
		let mut stats = SufficientStatistics::initialize(&corpus, 1, 1, &mut StdRng::seed_from_u64(1)).unwrap();
		assert_eq!(stats.topic_support(0), 1);

		stats.decrement(0, 0, 0).unwrap();
		assert_eq!(stats.topic_support(0), 0);
		assert_eq!(stats.topic_term_count(0, 0), 0);
	}

	#[test]
	fn double_decrement_is_an_invariant_violation() {
		let corpus = Corpus::from_tokens(&[vec!["solo"]]);
		let mut stats = SufficientStatistics::initialize(&corpus, 1, 1, &mut StdRng::seed_from_u64(1)).unwrap();
		stats.decrement(0, 0, 0).unwrap();
		assert!(matches!(stats.decrement(0, 0, 0), Err(LdaError::InvariantViolation(_))));
	}

	#[test]
	fn verify_detects_stale_assignment() {
		let corpus = corpus();
		let mut stats = SufficientStatistics::initialize(&corpus, 3, 2, &mut StdRng::seed_from_u64(5)).unwrap();
		let current = stats.topic(2, 0);
		stats.set_topic(2, 0, 1 - current);
		assert!(matches!(stats.verify(&corpus), Err(LdaError::InvariantViolation(_))));
	}
}
