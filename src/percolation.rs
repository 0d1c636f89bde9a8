//! Bond-percolation experiment on the prototype network.

use crate::network::Network;
use anyhow::Result;
use rand::prelude::*;
use rand_chacha::ChaCha12Rng;
use rand_distr::Bernoulli;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub struct PercolationResult {
    /// Fraction of the configured network order covered by the giant
    /// component after edge removal.
    pub occupied_fraction: f64,
    pub kept_edges: usize,
    pub removed_edges: usize,
}

/// Keep each edge with probability `t`, then measure the largest
/// connected component against the configured order `n`.
pub fn occupied_fraction(
    g: &Network,
    n: usize,
    t: f64,
    rng: &mut ChaCha12Rng,
) -> Result<PercolationResult> {
    let keep_dist = Bernoulli::new(t)?;

    let edges = g.edges();
    let kept: Vec<(usize, usize)> = edges
        .iter()
        .copied()
        .filter(|_| keep_dist.sample(rng))
        .collect();

    let damaged = Network::from_edges(g.order(), &kept)?;
    let giant = damaged.largest_component();

    Ok(PercolationResult {
        occupied_fraction: giant as f64 / n as f64,
        kept_edges: kept.len(),
        removed_edges: edges.len() - kept.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prototype() -> Network {
        let mut rng = ChaCha12Rng::seed_from_u64(21);
        Network::erdos_renyi(400, 6.0, &mut rng).unwrap()
    }

    #[test]
    fn full_occupation_keeps_every_edge() {
        let g = prototype();
        let mut rng = ChaCha12Rng::seed_from_u64(1);
        let result = occupied_fraction(&g, 400, 1.0, &mut rng).unwrap();
        assert_eq!(result.removed_edges, 0);
        assert_eq!(result.kept_edges, g.size());
        // Well above the percolation threshold the giant component
        // spans most of the graph.
        assert!(result.occupied_fraction > 0.9);
    }

    #[test]
    fn zero_occupation_leaves_singletons() {
        let g = prototype();
        let mut rng = ChaCha12Rng::seed_from_u64(1);
        let result = occupied_fraction(&g, 400, 0.0, &mut rng).unwrap();
        assert_eq!(result.kept_edges, 0);
        assert!((result.occupied_fraction - 1.0 / 400.0).abs() < 1e-12);
    }

    #[test]
    fn occupied_fraction_is_monotone_on_average() {
        let g = prototype();
        let mut rng = ChaCha12Rng::seed_from_u64(2);
        let sparse = occupied_fraction(&g, 400, 0.05, &mut rng).unwrap();
        let dense = occupied_fraction(&g, 400, 0.95, &mut rng).unwrap();
        assert!(dense.occupied_fraction > sparse.occupied_fraction);
    }
}
