//! Dispatch of independent per-gene fits
//!
//! Gene fits share no state, so any mechanism that maps `fit_gene` over the
//! inputs works. Executors return results in input order.

use rayon::prelude::*;

use crate::data::GeneFitInput;
use crate::error::Result;
use crate::fit::{fit_gene, FitParams, GeneFitResult};

/// Maps the per-gene fit over a batch of gene inputs
pub trait GeneExecutor {
    fn execute(&self, inputs: &[GeneFitInput], params: &FitParams) -> Vec<Result<GeneFitResult>>;
}

/// Any `Fn(&[GeneFitInput], &FitParams) -> Vec<Result<GeneFitResult>>` is an executor,
/// which lets callers plug in their own distributed map.
impl<F> GeneExecutor for F
where
    F: Fn(&[GeneFitInput], &FitParams) -> Vec<Result<GeneFitResult>>,
{
    fn execute(&self, inputs: &[GeneFitInput], params: &FitParams) -> Vec<Result<GeneFitResult>> {
        self(inputs, params)
    }
}

/// Fits genes one after another on the calling thread
#[derive(Debug, Clone, Copy, Default)]
pub struct SequentialExecutor;

impl GeneExecutor for SequentialExecutor {
    fn execute(&self, inputs: &[GeneFitInput], params: &FitParams) -> Vec<Result<GeneFitResult>> {
        inputs.iter().map(|input| fit_gene(input, params)).collect()
    }
}

/// Fits genes in parallel with rayon.
///
/// The default executor runs on the global rayon pool; `with_threads` builds a
/// dedicated pool of the requested size.
#[derive(Debug, Default)]
pub struct RayonExecutor {
    pool: Option<rayon::ThreadPool>,
}

impl RayonExecutor {
    /// Executor on the global rayon pool
    pub fn global() -> Self {
        Self { pool: None }
    }

    /// Executor on a dedicated pool. `threads == 0` lets rayon pick the size.
    pub fn with_threads(threads: usize) -> Result<Self> {
        let pool = rayon::ThreadPoolBuilder::new().num_threads(threads).build()?;
        Ok(Self { pool: Some(pool) })
    }

    /// Number of worker threads fits will run on
    pub fn threads(&self) -> usize {
        match &self.pool {
            Some(pool) => pool.current_num_threads(),
            None => rayon::current_num_threads(),
        }
    }

    fn run(inputs: &[GeneFitInput], params: &FitParams) -> Vec<Result<GeneFitResult>> {
        inputs.par_iter().map(|input| fit_gene(input, params)).collect()
    }
}

impl GeneExecutor for RayonExecutor {
    fn execute(&self, inputs: &[GeneFitInput], params: &FitParams) -> Vec<Result<GeneFitResult>> {
        match &self.pool {
            Some(pool) => pool.install(|| Self::run(inputs, params)),
            None => Self::run(inputs, params),
        }
    }
}
