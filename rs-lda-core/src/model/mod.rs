//! Top-level module for the collapsed Gibbs LDA sampler.
//!
//! This module provides:
//! - The token matrix representation (`Corpus`)
//! - Run configuration and hyperparameters (`LdaConfig`)
//! - The count tables of a run (`SufficientStatistics`)
//! - The injectable categorical sampler (`CategoricalSampler`)
//! - The sampler itself (`GibbsSampler`, `run_gibbs_sampling`)
//! - Theta and phi estimation (`Estimates`)
//! - Independent multi-chain runs (`run_chains`)

/// Token matrix with interned terms.
pub mod corpus;

/// Hyperparameters, iteration count and seed.
pub mod config;

/// Categorical sampling contract and its `rand`-backed implementation.
///
/// Tests replace the default implementation to replay fixed topic sequences.
pub mod sampler;

/// Sufficient statistics: topic assignments and the four count tables.
///
/// Mutation is crate-private; outside code can only read the counts.
pub mod counts;

/// Update step, sweeps and the end-to-end sampling entry point.
pub mod gibbs;

/// Posterior mean estimators for theta and phi, plus persistence of results.
pub mod estimate;

/// Several independent chains over the same corpus.
pub mod chains;
