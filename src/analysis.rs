//! Aggregation of stochastic run results into a summary report.

use crate::engine::{Outcome, RunResult};
use crate::stats::Accumulator;
use anyhow::{Context, Result};
use rmp_serde::decode;
use std::{
    fs::File,
    io::{BufReader, BufWriter},
    path::Path,
};

pub trait Obs {
    fn update(&mut self, result: &RunResult) -> Result<()>;
    fn report(&self) -> serde_json::Value;
}

/// Macroscopic compartment fractions at run end.
pub struct FinalFractions {
    acc_vec: Vec<Accumulator>,
}

impl FinalFractions {
    pub fn new() -> Self {
        let mut acc_vec = Vec::new();
        acc_vec.resize_with(3, Accumulator::new);
        Self { acc_vec }
    }
}

impl Obs for FinalFractions {
    fn update(&mut self, result: &RunResult) -> Result<()> {
        let total: f64 = result.final_state.iter().sum();
        if total == 0.0 {
            return Ok(());
        }
        for (acc, &val) in self.acc_vec.iter_mut().zip(&result.final_state) {
            acc.add(val / total);
        }
        Ok(())
    }

    fn report(&self) -> serde_json::Value {
        let reports: Vec<_> = self.acc_vec.iter().map(|acc| acc.report()).collect();
        serde_json::json!({ "final_fractions": reports })
    }
}

/// Final epidemic size, the recovered fraction at run end.
pub struct EpidemicSize {
    acc: Accumulator,
}

impl EpidemicSize {
    pub fn new() -> Self {
        Self {
            acc: Accumulator::new(),
        }
    }
}

impl Obs for EpidemicSize {
    fn update(&mut self, result: &RunResult) -> Result<()> {
        let total: f64 = result.final_state.iter().sum();
        if total > 0.0 {
            self.acc.add(result.final_state[2] / total);
        }
        Ok(())
    }

    fn report(&self) -> serde_json::Value {
        serde_json::json!({ "epidemic_size": self.acc.report() })
    }
}

/// Tally of per-class terminal outcomes over all runs.
pub struct OutcomeTally {
    absorbed: usize,
    equilibrium: usize,
}

impl OutcomeTally {
    pub fn new() -> Self {
        Self {
            absorbed: 0,
            equilibrium: 0,
        }
    }
}

impl Obs for OutcomeTally {
    fn update(&mut self, result: &RunResult) -> Result<()> {
        for outcome in result.outcomes.values() {
            match outcome {
                Outcome::Absorbed => self.absorbed += 1,
                Outcome::Equilibrium => self.equilibrium += 1,
            }
        }
        Ok(())
    }

    fn report(&self) -> serde_json::Value {
        serde_json::json!({
            "class_outcomes": {
                "absorbed": self.absorbed,
                "equilibrium": self.equilibrium,
            }
        })
    }
}

pub struct Analyzer {
    obs_ptr_vec: Vec<Box<dyn Obs>>,
}

impl Analyzer {
    pub fn new() -> Self {
        let obs_ptr_vec: Vec<Box<dyn Obs>> = vec![
            Box::new(FinalFractions::new()),
            Box::new(EpidemicSize::new()),
            Box::new(OutcomeTally::new()),
        ];
        Self { obs_ptr_vec }
    }

    pub fn add_file<P: AsRef<Path>>(&mut self, file: P) -> Result<()> {
        let file = file.as_ref();
        let file = File::open(file).with_context(|| format!("failed to open {file:?}"))?;
        let mut reader = BufReader::new(file);

        let result: RunResult =
            decode::from_read(&mut reader).context("failed to read run result")?;
        for obs in &mut self.obs_ptr_vec {
            obs.update(&result).context("failed to update observable")?;
        }
        Ok(())
    }

    pub fn save_results<P: AsRef<Path>>(&self, file: P) -> Result<()> {
        let file = file.as_ref();
        let file = File::create(file).with_context(|| format!("failed to create {file:?}"))?;
        let writer = BufWriter::new(file);

        let reports: Vec<_> = self.obs_ptr_vec.iter().map(|obs| obs.report()).collect();
        serde_json::to_writer_pretty(writer, &reports)?;
        Ok(())
    }
}
