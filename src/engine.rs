//! Degree-stratified Gillespie simulation engine.
//!
//! One independent continuous-time Markov process runs per degree class;
//! the per-class final states are summed into the macroscopic result.

use crate::model::Process;
use crate::network::{Network, mean_degree};
use anyhow::{Result, bail};
use rand::prelude::*;
use rand_chacha::ChaCha12Rng;
use rand_distr::Open01;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Why a degree-class simulation stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    /// The clock passed the configured time horizon.
    Equilibrium,
    /// All propensities reached zero; no events are left.
    Absorbed,
}

/// Terminal record of one degree-class simulation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassRun {
    pub final_state: Vec<f64>,
    pub outcome: Outcome,
    pub end_time: f64,
}

/// Result of a full stochastic run over all degree classes.
#[derive(Debug, Serialize, Deserialize)]
pub struct RunResult {
    /// Element-wise sum of all per-class final states.
    pub final_state: Vec<f64>,
    /// Initial state handed to each degree class.
    pub initial_states: BTreeMap<usize, Vec<f64>>,
    /// Terminal outcome of each degree class.
    pub outcomes: BTreeMap<usize, Outcome>,
    /// Node counts per degree at run start.
    pub composition: BTreeMap<usize, usize>,
}

/// Stochastic simulation engine (direct-method SSA).
///
/// Generic over the [`Process`] supplying the rate model and
/// transition table. The single ChaCha12 generator is consumed
/// sequentially across degree classes, so a fixed seed reproduces a
/// run exactly.
pub struct Gillespie<P: Process> {
    process: P,
    max_time: f64,
    rng: ChaCha12Rng,
}

impl<P: Process> Gillespie<P> {
    /// Create an engine, validating the process transition table.
    ///
    /// An empty or ragged table is rejected here, before any
    /// simulation work starts.
    pub fn new(process: P, max_time: f64, rng: ChaCha12Rng) -> Result<Self> {
        if max_time <= 0.0 {
            bail!("maximum simulated time must be positive");
        }
        let table = process.transitions();
        let Some(first) = table.first() else {
            bail!("transition table has no events");
        };
        let width = first.len();
        if width == 0 {
            bail!("transition table rows must be non-empty");
        }
        if table.iter().any(|row| row.len() != width) {
            bail!("transition table rows must all have length {width}");
        }
        Ok(Self {
            process,
            max_time,
            rng,
        })
    }

    /// Draw the next event and its waiting time.
    ///
    /// Returns `Ok(None)` when every propensity is zero (absorption);
    /// a negative propensity is a rate-model contract violation and
    /// fails the draw outright.
    pub fn draw(
        &mut self,
        state: &[f64],
        k: usize,
        ave_k: f64,
        pk: &BTreeMap<usize, f64>,
    ) -> Result<Option<(usize, f64)>> {
        let rates = self.process.rates(state, k, ave_k, pk);

        for (event, &rate) in rates.iter().enumerate() {
            if rate < 0.0 {
                bail!("rate model returned negative propensity {rate} for event {event}");
            }
        }
        let total: f64 = rates.iter().sum();
        if total == 0.0 {
            return Ok(None);
        }

        // Select the first event whose cumulative rate exceeds u1 * total.
        let threshold = self.rng.random::<f64>() * total;
        let mut event = rates.len() - 1;
        let mut cumulative = 0.0;
        for (i, &rate) in rates.iter().enumerate() {
            cumulative += rate;
            if cumulative > threshold {
                event = i;
                break;
            }
        }

        // Exponential holding time with rate `total`; Open01 excludes
        // zero so the logarithm is finite and dt strictly positive.
        let u2: f64 = self.rng.sample(Open01);
        let dt = (1.0 / total) * (1.0 / u2).ln();

        Ok(Some((event, dt)))
    }

    /// Run one degree class to its terminal state.
    ///
    /// The state vector is mutated in place by event deltas; the clock
    /// advances strictly until the horizon is passed (equilibrium) or
    /// no events are left (absorption).
    pub fn simulate_class(
        &mut self,
        initial: Vec<f64>,
        k: usize,
        ave_k: f64,
        pk: &BTreeMap<usize, f64>,
    ) -> Result<ClassRun> {
        let mut state = initial;
        let mut clock = 0.0;

        let outcome = loop {
            if clock > self.max_time {
                break Outcome::Equilibrium;
            }
            match self.draw(&state, k, ave_k, pk)? {
                None => break Outcome::Absorbed,
                Some((event, dt)) => {
                    let delta = &self.process.transitions()[event];
                    for (ele, change) in state.iter_mut().zip(delta) {
                        *ele += change;
                    }
                    clock += dt;
                }
            }
        };

        Ok(ClassRun {
            final_state: state,
            outcome,
            end_time: clock,
        })
    }

    /// Run every degree class of the network and aggregate the results.
    ///
    /// Classes are independent; they are simulated sequentially over
    /// the shared generator and joined by an order-independent sum.
    pub fn run(&mut self, g: &Network) -> Result<RunResult> {
        let composition = g.degree_composition();
        let pk = g.degree_distribution();
        let ave_k = mean_degree(&pk);

        let mut initial_states = BTreeMap::new();
        let mut outcomes = BTreeMap::new();
        let mut class_finals = Vec::with_capacity(composition.len());

        for (&k, &members) in &composition {
            let initial = self.process.initial_state(members, &mut self.rng)?;
            initial_states.insert(k, initial.clone());

            let class = self.simulate_class(initial, k, ave_k, &pk)?;
            log::debug!(
                "class k={k}: {:?} at t={:.3}, state {:?}",
                class.outcome,
                class.end_time,
                class.final_state
            );
            outcomes.insert(k, class.outcome);
            class_finals.push(class.final_state);
        }

        Ok(RunResult {
            final_state: aggregate(class_finals.iter().map(Vec::as_slice)),
            initial_states,
            outcomes,
            composition,
        })
    }
}

/// Element-wise sum of per-class state vectors.
///
/// Commutative reduction: any summation order yields the same result.
pub fn aggregate<'a, I>(states: I) -> Vec<f64>
where
    I: IntoIterator<Item = &'a [f64]>,
{
    let mut total = Vec::new();
    for state in states {
        if total.len() < state.len() {
            total.resize(state.len(), 0.0);
        }
        for (ele, &val) in total.iter_mut().zip(state) {
            *ele += val;
        }
    }
    total
}
