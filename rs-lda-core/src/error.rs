use thiserror::Error;

/// Errors produced while configuring, running or persisting a sampling run.
///
/// Configuration problems are detected once, before any count table is
/// allocated. The remaining sampling variants mean the count invariants were
/// broken mid-run: they are fatal and the run yields no estimates.
#[derive(Error, Debug)]
pub enum LdaError {
	/// Malformed hyperparameters or a document count that disagrees with the corpus.
	#[error("configuration error: {0}")]
	Configuration(String),

	/// The categorical sampler was given an empty or zero-total weight vector.
	#[error("degenerate distribution: {0}")]
	DegenerateDistribution(String),

	/// A count table disagrees with the topic assignments it summarises.
	#[error("invariant violation: {0}")]
	InvariantViolation(String),

	#[error("i/o error: {0}")]
	Io(#[from] std::io::Error),

	#[error("serialization error: {0}")]
	Serialization(#[from] postcard::Error),
}

/// Shorthand used across the crate.
pub type Result<T> = std::result::Result<T, LdaError>;
