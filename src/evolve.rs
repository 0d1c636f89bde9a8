//! Addition-deletion network evolution (Moore-Ghoshal-Newman rate
//! equations), integrated with the shared RK4 routine.

use crate::config::{EvolveConfig, Kernel};
use crate::network::Network;
use crate::ode::rk4;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub struct EvolveResult {
    /// Degree distribution `p_k` for `k` in `[0, k_max)` at the end of
    /// integration.
    pub pk: Vec<f64>,
}

/// Integrate the degree-distribution rate equations from the
/// prototype network's empirical distribution.
pub fn integrate(g: &Network, kmean: f64, cfg: &EvolveConfig) -> Result<EvolveResult> {
    let p0 = initial_distribution(g, cfg.k_max);
    let phi = degree_kernel(kmean, cfg.k_max, cfg.kernel);

    let pk = rk4(
        |_, p| derivatives(p, kmean, &phi),
        p0,
        0.0,
        cfg.t_max,
        cfg.dt,
    )
    .context("failed to integrate addition-deletion equations")?;

    Ok(EvolveResult { pk })
}

/// Empirical degree distribution truncated at `k_max`.
fn initial_distribution(g: &Network, k_max: usize) -> Vec<f64> {
    let mut p0 = vec![0.0; k_max];
    let inv_order = 1.0 / g.order() as f64;
    for node in 0..g.order() {
        let k = g.degree(node);
        if k < k_max {
            p0[k] += inv_order;
        }
    }
    p0
}

/// Degree distribution of arriving nodes, `phi_k` for `k < k_max`.
fn degree_kernel(c: f64, k_max: usize, kernel: Kernel) -> Vec<f64> {
    match kernel {
        Kernel::Poisson => {
            let mut phi = Vec::with_capacity(k_max);
            let mut term = (-c).exp();
            for k in 0..k_max {
                if k > 0 {
                    term *= c / k as f64;
                }
                phi.push(term);
            }
            phi
        }
        Kernel::Delta => {
            let target = c.round() as usize;
            (0..k_max).map(|k| if k == target { 1.0 } else { 0.0 }).collect()
        }
    }
}

fn derivatives(p: &[f64], c: f64, phi: &[f64]) -> Vec<f64> {
    let k_max = p.len();
    let mut dp = vec![0.0; k_max];

    for k in 0..k_max {
        let kf = k as f64;
        // Node deletion, neighbour-loss cascade, and uniform attachment
        // of the c new edges; boundary rows drop the missing terms.
        let mut val = -p[k] - kf * p[k] - c * p[k] + phi[k];
        if k + 1 < k_max {
            val += (kf + 1.0) * p[k + 1];
        }
        if k > 0 {
            val += c * p[k - 1];
        }
        dp[k] = val;
    }

    dp
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::prelude::*;
    use rand_chacha::ChaCha12Rng;

    fn ev_cfg(kernel: Kernel) -> EvolveConfig {
        EvolveConfig {
            k_max: 30,
            kernel,
            t_max: 10.0,
            dt: 0.01,
        }
    }

    fn prototype() -> Network {
        let mut rng = ChaCha12Rng::seed_from_u64(13);
        Network::erdos_renyi(2000, 10.0, &mut rng).unwrap()
    }

    #[test]
    fn poisson_kernel_is_normalized_within_cutoff() {
        let phi = degree_kernel(10.0, 60, Kernel::Poisson);
        let total: f64 = phi.iter().sum();
        assert!((total - 1.0).abs() < 1e-9);
    }

    #[test]
    fn delta_kernel_concentrates_on_kmean() {
        let phi = degree_kernel(10.0, 30, Kernel::Delta);
        assert_eq!(phi[10], 1.0);
        assert!((phi.iter().sum::<f64>() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn steady_distribution_stays_populated() {
        let g = prototype();
        let result = integrate(&g, 10.0, &ev_cfg(Kernel::Delta)).unwrap();
        assert_eq!(result.pk.len(), 30);
        assert!(result.pk.iter().sum::<f64>() > 0.0);
    }

    #[test]
    fn both_kernels_produce_finite_distributions() {
        let g = prototype();
        for kernel in [Kernel::Poisson, Kernel::Delta] {
            let result = integrate(&g, 10.0, &ev_cfg(kernel)).unwrap();
            assert!(result.pk.iter().all(|p| p.is_finite()));
        }
    }
}
