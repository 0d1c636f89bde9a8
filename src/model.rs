//! Rate-model and transition-table contract for the stochastic engine.

use crate::config::SirConfig;
use anyhow::Result;
use rand_chacha::ChaCha12Rng;
use rand_distr::{Bernoulli, Distribution};
use std::collections::BTreeMap;

/// Capability set a concrete process must provide to the engine.
///
/// Event order is a fixed contract: the propensity at index `i` in
/// [`Process::rates`] corresponds to row `i` of [`Process::transitions`].
pub trait Process {
    /// Initial state vector for a degree class with `members` nodes.
    ///
    /// Components must sum to `members`; an empty class gets a
    /// well-typed all-zero vector.
    fn initial_state(&self, members: usize, rng: &mut ChaCha12Rng) -> Result<Vec<f64>>;

    /// Ordered event propensities for the current state, recomputed
    /// from scratch at every draw.
    fn rates(&self, state: &[f64], k: usize, ave_k: f64, pk: &BTreeMap<usize, f64>) -> Vec<f64>;

    /// Fixed table mapping event index to state delta.
    fn transitions(&self) -> &[Vec<f64>];
}

/// SIR process over degree classes.
///
/// Two events in fixed order: infection (S -> I) and recovery (I -> R).
pub struct SirProcess {
    p_infect: f64,
    p_recover: f64,
    p_infected: f64,
    force_seed: bool,
    transitions: Vec<Vec<f64>>,
}

impl SirProcess {
    pub fn new(cfg: &SirConfig) -> Self {
        Self {
            p_infect: cfg.p_infect,
            p_recover: cfg.p_recover,
            p_infected: cfg.p_infected,
            force_seed: cfg.force_seed,
            transitions: vec![vec![-1.0, 1.0, 0.0], vec![0.0, -1.0, 1.0]],
        }
    }

    /// Force of infection felt by a degree-k node.
    ///
    /// Recomputed fresh at every draw; a known hot spot, kept as-is so
    /// the event-by-event dynamics stay reproducible.
    fn theta(&self, infected: f64, ave_k: f64, pk: &BTreeMap<usize, f64>) -> f64 {
        let summation: f64 = pk
            .iter()
            .map(|(&k, &p)| (k as f64 - 1.0) * p * infected)
            .sum();
        summation / ave_k
    }
}

impl Process for SirProcess {
    fn initial_state(&self, members: usize, rng: &mut ChaCha12Rng) -> Result<Vec<f64>> {
        if members == 0 {
            return Ok(vec![0.0; 3]);
        }

        let seed_dist = Bernoulli::new(self.p_infected)?;
        let mut infected = (0..members).filter(|_| seed_dist.sample(rng)).count();

        // Optionally guarantee the class starts with a nonzero rate.
        if infected == 0 && self.force_seed {
            infected = 1;
        }

        Ok(vec![(members - infected) as f64, infected as f64, 0.0])
    }

    fn rates(&self, state: &[f64], k: usize, ave_k: f64, pk: &BTreeMap<usize, f64>) -> Vec<f64> {
        let susceptible = state[0];
        let infected = state[1];
        let theta = self.theta(infected, ave_k, pk);
        vec![
            k as f64 * self.p_infect * susceptible * theta,
            self.p_recover * infected,
        ]
    }

    fn transitions(&self) -> &[Vec<f64>] {
        &self.transitions
    }
}
