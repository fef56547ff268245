use proptest::prelude::*;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rs_lda_core::model::sampler::{CategoricalSampler, RngSampler};
use rs_lda_core::{Corpus, GibbsSampler, LdaConfig, estimate_phi, estimate_theta};

fn corpus_strategy() -> impl Strategy<Value = Vec<Vec<String>>> {
	let term = prop::sample::select(vec!["alpha", "beta", "gamma", "delta", "eps", "zeta"]).prop_map(str::to_owned);
	prop::collection::vec(prop::collection::vec(term, 0..12), 1..6)
}

proptest! {
	#[test]
	fn prop_counts_stay_consistent(
		documents in corpus_strategy(),
		topics in 1usize..6,
		sweeps in 0usize..6,
		seed in any::<u64>(),
	) {
		let corpus = Corpus::new(documents);
		let config = LdaConfig::new(topics, corpus.distinct_terms().max(1)).alpha(0.3).beta(0.05);
		let mut sampler = GibbsSampler::new(&corpus, corpus.len(), &config, ChaCha8Rng::seed_from_u64(seed)).unwrap();
		sampler.run_sweeps(sweeps).unwrap();

		let stats = sampler.statistics();
		prop_assert!(stats.verify(&corpus).is_ok());
		for doc in 0..corpus.len() {
			let row_sum: usize = stats.doc_topic_row(doc).iter().sum();
			prop_assert_eq!(row_sum, stats.doc_topic_sum(doc));
			prop_assert_eq!(row_sum, corpus.document_len(doc));
		}
		for topic in 0..topics {
			let total: usize = stats.topic_terms(topic).map(|(_, count)| count).sum();
			prop_assert_eq!(total, stats.topic_term_sum(topic));
		}
	}

	#[test]
	fn prop_estimates_are_well_formed(
		documents in corpus_strategy(),
		topics in 1usize..5,
		extra_vocabulary in 0usize..20,
		alpha in 0.01f64..2.0,
		beta in 0.001f64..1.0,
		seed in any::<u64>(),
	) {
		let corpus = Corpus::new(documents);
		let vocabulary_size = corpus.distinct_terms().max(1) + extra_vocabulary;
		let config = LdaConfig::new(topics, vocabulary_size).alpha(alpha).beta(beta);
		let mut sampler = GibbsSampler::new(&corpus, corpus.len(), &config, ChaCha8Rng::seed_from_u64(seed)).unwrap();
		sampler.run_sweeps(3).unwrap();
		let stats = sampler.statistics();

		let theta = estimate_theta(stats, alpha);
		prop_assert_eq!(theta.len(), corpus.len());
		for row in &theta {
			prop_assert_eq!(row.len(), topics);
			prop_assert!(row.iter().all(|&p| p > 0.0 && p <= 1.0));
			let sum: f64 = row.iter().sum();
			prop_assert!((sum - 1.0).abs() < 1e-9, "row sum was {}", sum);
		}

		let phi = estimate_phi(stats, &corpus, vocabulary_size, beta);
		for topic in 0..topics {
			let n = stats.topic_term_sum(topic) as f64;
			let support = stats.topic_support(topic) as f64;
			let expected = (n + beta * support) / (n + beta * vocabulary_size as f64);
			let observed: f64 = phi.topic(topic).values().sum();
			prop_assert!((observed - expected).abs() < 1e-9, "observed {} expected {}", observed, expected);

			let ranked = phi.sorted(topic);
			prop_assert_eq!(ranked.len(), phi.topic(topic).len());
			prop_assert!(ranked.windows(2).all(|w| w[0].1 >= w[1].1));
		}
	}

	#[test]
	fn prop_sampler_index_in_range(
		weights in prop::collection::vec(0.0f64..10.0, 1..20),
		seed in any::<u64>(),
	) {
		prop_assume!(weights.iter().sum::<f64>() > 0.0);
		let mut sampler = RngSampler::new(ChaCha8Rng::seed_from_u64(seed));
		for _ in 0..50 {
			let index = sampler.sample(&weights).unwrap();
			prop_assert!(index < weights.len());
			prop_assert!(weights[index] > 0.0);
		}
	}
}
