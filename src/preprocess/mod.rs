//! Data preparation ahead of the solver: per-task standardization and the
//! covariance statistics coordinate descent runs on

mod covariance;
mod standardize;

pub use covariance::{covariance_terms, CovarianceTerms};
pub use standardize::{standardize_column, standardize_task, standardize_tasks};
