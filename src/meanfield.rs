//! Degree-based mean-field (HMF) integration of the SIR system.
//!
//! One three-compartment ODE per degree class, coupled only through
//! the force of infection; class results are weighted by P(k) and
//! summed into the macroscopic state.

use crate::config::{MeanFieldConfig, SirConfig};
use crate::ode::rk4;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Serialize, Deserialize)]
pub struct MeanFieldResult {
    /// Macroscopic `[S, I, R]` fractions at the end of integration.
    pub final_state: Vec<f64>,
    /// Per-class `[S, I, R]` fractions, weighted by P(k).
    pub class_states: BTreeMap<usize, Vec<f64>>,
}

/// Integrate the mean-field SIR equations over every degree class.
pub fn integrate(
    sir: &SirConfig,
    mf: &MeanFieldConfig,
    pk: &BTreeMap<usize, f64>,
    ave_k: f64,
) -> Result<MeanFieldResult> {
    let mut class_states = BTreeMap::new();

    for &k in pk.keys() {
        let y0 = vec![1.0 - sir.p_infected, sir.p_infected, 0.0];
        let y = rk4(
            |_, y| derivatives(y, k, sir.p_infect, sir.p_recover, pk, ave_k),
            y0,
            0.0,
            mf.t_max,
            mf.dt,
        )
        .with_context(|| format!("failed to integrate class k={k}"))?;

        class_states.insert(k, y.iter().map(|&ele| ele * pk[&k]).collect());
    }

    let final_state = crate::engine::aggregate(class_states.values().map(Vec::as_slice));

    Ok(MeanFieldResult {
        final_state,
        class_states,
    })
}

fn derivatives(
    y: &[f64],
    k: usize,
    p_infect: f64,
    p_recover: f64,
    pk: &BTreeMap<usize, f64>,
    ave_k: f64,
) -> Vec<f64> {
    let (s, i) = (y[0], y[1]);
    let theta: f64 = pk
        .iter()
        .map(|(&k, &p)| (k as f64 - 1.0) * p * i)
        .sum::<f64>()
        / ave_k;

    let flux = k as f64 * p_infect * s * theta;
    vec![-flux, flux - p_recover * i, p_recover * i]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::mean_degree;

    fn sir_cfg() -> SirConfig {
        SirConfig {
            p_infect: 0.3,
            p_recover: 0.1,
            p_infected: 0.01,
            force_seed: false,
            max_time: 100.0,
        }
    }

    fn mf_cfg() -> MeanFieldConfig {
        MeanFieldConfig {
            t_max: 150.0,
            dt: 0.5,
        }
    }

    fn poisson_like_pk() -> BTreeMap<usize, f64> {
        BTreeMap::from([(2, 0.2), (4, 0.3), (5, 0.3), (8, 0.2)])
    }

    #[test]
    fn macroscopic_state_sums_to_one() {
        let pk = poisson_like_pk();
        let ave_k = mean_degree(&pk);
        let result = integrate(&sir_cfg(), &mf_cfg(), &pk, ave_k).unwrap();

        let total: f64 = result.final_state.iter().sum();
        assert!((total - 1.0).abs() < 1e-6);
        assert!(result.final_state.iter().all(|&ele| ele >= -1e-9));
    }

    #[test]
    fn epidemic_burns_out_by_the_horizon() {
        let pk = poisson_like_pk();
        let ave_k = mean_degree(&pk);
        let result = integrate(&sir_cfg(), &mf_cfg(), &pk, ave_k).unwrap();

        // Recovered fraction grew; infected fraction decayed to near zero.
        assert!(result.final_state[2] > 0.0);
        assert!(result.final_state[1] < 1e-3);
    }

    #[test]
    fn class_conservation_holds_per_degree() {
        let pk = poisson_like_pk();
        let ave_k = mean_degree(&pk);
        let result = integrate(&sir_cfg(), &mf_cfg(), &pk, ave_k).unwrap();

        for (k, state) in &result.class_states {
            let total: f64 = state.iter().sum();
            assert!(
                (total - pk[k]).abs() < 1e-6,
                "class k={k} does not conserve its weight"
            );
        }
    }
}
