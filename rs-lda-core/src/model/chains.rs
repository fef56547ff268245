use std::sync::mpsc;
use std::thread;

use log::info;

use super::config::LdaConfig;
use super::corpus::Corpus;
use super::estimate::Estimates;
use super::gibbs::run_gibbs_sampling;
use crate::error::{LdaError, Result};

/// Runs one independent Gibbs chain per seed and returns their estimates in
/// seed order.
///
/// # Behavior
/// - Each chain is a complete, strictly sequential run of
///   [`run_gibbs_sampling`] with `config.seed` replaced by its own seed.
/// - Chains share only the read-only corpus.
/// - Chains run on scoped threads, at most `num_cpus::get()` at a time.
///
/// # Errors
/// Returns the first failing chain's error (in seed order); the other
/// results are discarded.
///
/// # Notes
/// - Sweeps are never split across threads, only whole chains are.
pub fn run_chains(
	corpus: &Corpus,
	declared_documents: usize,
	config: &LdaConfig,
	seeds: &[u64],
) -> Result<Vec<Estimates>> {
	config.validate()?;
	if seeds.is_empty() {
		return Ok(Vec::new());
	}

	let workers = num_cpus::get().max(1);
	info!("running {} chains on up to {} threads", seeds.len(), workers);

	let mut results: Vec<Option<Result<Estimates>>> = (0..seeds.len()).map(|_| None).collect();

	for (batch_index, batch) in seeds.chunks(workers).enumerate() {
		let offset = batch_index * workers;
		let (tx, rx) = mpsc::channel();

		thread::scope(|scope| {
			for (i, &seed) in batch.iter().enumerate() {
				let tx = tx.clone();
				let chain_config = config.clone().seed(seed);
				scope.spawn(move || {
					let result = run_gibbs_sampling(corpus, declared_documents, &chain_config);
					// The receiver outlives the scope, so this cannot fail.
					let _ = tx.send((offset + i, result));
				});
			}
		});
		drop(tx);

		for (index, result) in rx.iter() {
			results[index] = Some(result);
		}
	}

	results
		.into_iter()
		.enumerate()
		.map(|(index, result)| {
			result.unwrap_or_else(|| {
				Err(LdaError::InvariantViolation(format!("chain {} produced no result", index)))
			})
		})
		.collect()
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn chains_match_single_runs() {
		let corpus = Corpus::from_tokens(&[vec!["a", "b", "a"], vec!["c", "c", "b"]]);
		let config = LdaConfig::new(2, 3).iterations(5);
		let seeds = [3, 1, 4, 1, 5];

		let chains = run_chains(&corpus, 2, &config, &seeds).unwrap();

		assert_eq!(chains.len(), seeds.len());
		for (estimates, &seed) in chains.iter().zip(&seeds) {
			let single = run_gibbs_sampling(&corpus, 2, &config.clone().seed(seed)).unwrap();
			assert_eq!(estimates, &single);
		}
	}

	#[test]
	fn no_seeds_no_chains() {
		let corpus = Corpus::from_tokens(&[vec!["a"]]);
		let chains = run_chains(&corpus, 1, &LdaConfig::new(1, 1), &[]).unwrap();
		assert!(chains.is_empty());
	}

	#[test]
	fn configuration_errors_surface() {
		let corpus = Corpus::from_tokens(&[vec!["a"]]);
		let result = run_chains(&corpus, 2, &LdaConfig::new(1, 1).iterations(1), &[1, 2]);
		assert!(matches!(result, Err(LdaError::Configuration(_))));
	}
}
