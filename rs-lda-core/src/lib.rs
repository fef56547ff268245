//! Latent Dirichlet Allocation by collapsed Gibbs sampling.
//!
//! This crate infers a topic for every token of a pre-tokenized corpus and
//! turns the resulting counts into:
//! - per-document topic distributions (theta)
//! - per-topic term distributions (phi), with a ranked view per topic
//!
//! Tokenization, vocabulary building and presentation are left to callers:
//! the input is a token matrix, the output is plain data.

/// Sampler, count tables, estimators and configuration.
pub mod model;

/// Error type shared by every fallible operation.
pub mod error;

/// Binary persistence helpers.
///
/// Not exposed
pub(crate) mod io;

pub use error::{LdaError, Result};
pub use model::chains::run_chains;
pub use model::config::LdaConfig;
pub use model::corpus::Corpus;
pub use model::counts::SufficientStatistics;
pub use model::estimate::{Estimates, Phi, estimate_phi, estimate_theta};
pub use model::gibbs::{GibbsSampler, run_gibbs_sampling};
pub use model::sampler::{CategoricalSampler, RngSampler};
