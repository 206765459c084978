use crate::{
    fitting::errors::{ModelError, ModelResult},
    optimization::loglik_optimizer::MLEOptions,
};

/// Events per reduction chunk when summing the log-likelihood.
pub const DEFAULT_CHUNK_SIZE: usize = 4096;

/// Minimum dataset size for which chunks are evaluated on the rayon pool.
pub const DEFAULT_PARALLEL_THRESHOLD: usize = 16_384;

/// Fit-level configuration.
///
/// - `mle_opts`: optimizer tolerances, line search, verbosity, L-BFGS memory.
/// - `compute_covariance`: estimate the covariance from a finite-difference
///   Hessian after convergence.
/// - `parallel` / `parallel_threshold`: evaluate chunks on rayon when the
///   dataset has at least `parallel_threshold` events.
/// - `chunk_size`: events per partial sum. Partial sums are always combined
///   in chunk order, so results do not depend on `parallel`. [`FitOptions::new`]
///   rejects 0; a 0 set directly on the field is evaluated as 1.
#[derive(Debug, Clone, PartialEq)]
pub struct FitOptions {
    pub mle_opts: MLEOptions,
    pub compute_covariance: bool,
    pub parallel: bool,
    pub parallel_threshold: usize,
    pub chunk_size: usize,
}

impl FitOptions {
    /// # Errors
    /// [`ModelError::InvalidOption`] if `chunk_size == 0`.
    pub fn new(
        mle_opts: MLEOptions, compute_covariance: bool, parallel: bool, parallel_threshold: usize,
        chunk_size: usize,
    ) -> ModelResult<Self> {
        if chunk_size == 0 {
            return Err(ModelError::InvalidOption {
                name: "chunk_size",
                reason: "Chunk size must be greater than zero.",
            });
        }
        Ok(Self { mle_opts, compute_covariance, parallel, parallel_threshold, chunk_size })
    }

    /// Same options with parallel evaluation switched on or off.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub(crate) fn use_parallel(&self, n_events: usize) -> bool {
        self.parallel && n_events >= self.parallel_threshold
    }
}

impl Default for FitOptions {
    fn default() -> Self {
        Self {
            mle_opts: MLEOptions::default(),
            compute_covariance: true,
            parallel: true,
            parallel_threshold: DEFAULT_PARALLEL_THRESHOLD,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}
