//! Posterior draws and their summaries.

use serde::Serialize;

use crate::uncertainty::statistics::{self, SummaryStats};

/// Draws for every model parameter, kept per chain.
///
/// Every declared parameter has the same non-empty number of draws in each
/// chain; a failed run produces no `PosteriorSample` at all.
#[derive(Debug, Clone, Serialize)]
pub struct PosteriorSample {
    names: Vec<String>,
    /// `chains[c][p]` is the draw sequence of parameter `p` in chain `c`.
    chains: Vec<Vec<Vec<f64>>>,
    /// Acceptance rate per chain and parameter after tuning.
    acceptance: Vec<Vec<f64>>,
}

impl PosteriorSample {
    pub(crate) fn new(names: Vec<String>, chains: Vec<Vec<Vec<f64>>>, acceptance: Vec<Vec<f64>>) -> Self {
        Self {
            names,
            chains,
            acceptance,
        }
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn chain_count(&self) -> usize {
        self.chains.len()
    }

    /// Total draws per parameter across chains.
    pub fn len(&self) -> usize {
        self.chains
            .iter()
            .map(|c| c.first().map_or(0, Vec::len))
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn index_of(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }

    /// All draws of `name`, chains concatenated.
    pub fn values(&self, name: &str) -> Option<Vec<f64>> {
        let p = self.index_of(name)?;
        Some(self.chains.iter().flat_map(|c| c[p].iter().copied()).collect())
    }

    /// Draw vectors in parameter order, chains concatenated.
    pub fn draws(&self) -> impl Iterator<Item = Vec<f64>> + '_ {
        self.chains.iter().flat_map(move |chain| {
            let n = chain.first().map_or(0, Vec::len);
            (0..n).map(move |k| chain.iter().map(|p| p[k]).collect())
        })
    }

    pub fn mean(&self, name: &str) -> Option<f64> {
        self.values(name).map(|v| statistics::mean(&v))
    }

    /// Posterior mean of every parameter, in parameter order.
    pub fn mean_vector(&self) -> Vec<f64> {
        self.names
            .iter()
            .filter_map(|n| self.mean(n))
            .collect()
    }

    pub fn summary(&self, name: &str) -> Option<SummaryStats> {
        self.values(name).map(|v| SummaryStats::from_samples(&v))
    }

    /// Gelman-Rubin R-hat of `name` across chains.
    pub fn r_hat(&self, name: &str) -> Option<f64> {
        let p = self.index_of(name)?;
        let per_chain: Vec<Vec<f64>> = self.chains.iter().map(|c| c[p].clone()).collect();
        Some(statistics::gelman_rubin(&per_chain))
    }

    /// Mean acceptance rate of `name` across chains.
    pub fn acceptance_rate(&self, name: &str) -> Option<f64> {
        let p = self.index_of(name)?;
        let rates: Vec<f64> = self.acceptance.iter().map(|a| a[p]).collect();
        Some(statistics::mean(&rates))
    }
}
