//! The user-supplied program and the dataset it is evaluated against.

use std::sync::Arc;

use cw_types::Configuration;

/// A parameterized computation under search.
///
/// Called once per dataset sample for every candidate configuration, possibly
/// from several blocking-pool threads at once.
pub trait Program<I, O>: Send + Sync {
    fn run(&self, config: &Configuration, input: &I) -> anyhow::Result<O>;
}

impl<I, O, F> Program<I, O> for F
where
    F: Fn(&Configuration, &I) -> anyhow::Result<O> + Send + Sync,
{
    fn run(&self, config: &Configuration, input: &I) -> anyhow::Result<O> {
        self(config, input)
    }
}

/// Ordered `(input, expected output)` pairs, shared read-only across tasks.
pub type Dataset<I, O> = Arc<[(I, O)]>;
