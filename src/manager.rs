use crate::analysis::Analyzer;
use crate::config::Config;
use crate::engine::Gillespie;
use crate::model::SirProcess;
use crate::network::{Network, mean_degree};
use crate::{evolve, gfs, meanfield, percolation};
use anyhow::{Context, Result};
use glob::glob;
use rand::prelude::*;
use rand_chacha::ChaCha12Rng;
use rmp_serde::encode;
use serde::Serialize;
use std::{
    fs,
    fs::File,
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};

/// Experiment harness.
///
/// Owns the simulation directory and configuration, builds prototype
/// networks, dispatches the experiments, and persists their results.
pub struct Manager {
    sim_dir: PathBuf,
    cfg: Config,
}

impl Manager {
    pub fn new<P: AsRef<Path>>(sim_dir: P) -> Result<Self> {
        let sim_dir = sim_dir.as_ref().to_path_buf();

        let cfg =
            Config::from_file(sim_dir.join("config.toml")).context("failed to construct cfg")?;
        log::info!("{cfg:#?}");

        Ok(Self { sim_dir, cfg })
    }

    /// One stochastic Gillespie run on a freshly built network.
    pub fn run_stochastic(&self) -> Result<()> {
        let mut rng = self.make_rng().context("failed to construct rng")?;
        // Each invocation builds its own network, so the run works on
        // a fresh graph without an extra copy.
        let network = self.build_prototype(&mut rng)?;

        let process = SirProcess::new(&self.cfg.sir);
        let mut engine = Gillespie::new(process, self.cfg.sir.max_time, rng)
            .context("failed to construct engine")?;

        let result = engine.run(&network).context("failed to run simulation")?;
        log::info!("final state: {:?}", result.final_state);

        let run_idx = self.count_run_dirs().context("failed to count run dirs")?;
        let run_dir = self.run_dir(run_idx);
        fs::create_dir_all(&run_dir).with_context(|| format!("failed to create {run_dir:?}"))?;
        log::info!("created {run_dir:?}");

        let file = run_dir.join("results.msgpack");
        let file = File::create(&file).with_context(|| format!("failed to create {file:?}"))?;
        let mut writer = BufWriter::new(file);
        encode::write(&mut writer, &result).context("failed to serialize run result")?;
        writer.flush().context("failed to flush writer stream")?;

        Ok(())
    }

    /// Degree-based mean-field integration of the SIR system.
    pub fn run_mean_field(&self) -> Result<()> {
        let mf_cfg = self.cfg.mean_field()?;
        let mut rng = self.make_rng().context("failed to construct rng")?;
        let network = self.build_prototype(&mut rng)?;

        let pk = network.degree_distribution();
        let ave_k = mean_degree(&pk);

        let result = meanfield::integrate(&self.cfg.sir, mf_cfg, &pk, ave_k)
            .context("failed to integrate mean-field system")?;
        log::info!("final state: {:?}", result.final_state);

        self.write_json("mean_field.json", &result)
    }

    /// Generating-function final-size calculation.
    pub fn run_outbreak(&self) -> Result<()> {
        let ob_cfg = self.cfg.outbreak()?;
        let mut rng = self.make_rng().context("failed to construct rng")?;
        let network = self.build_prototype(&mut rng)?;

        let pk = network.degree_distribution();
        let ave_k = mean_degree(&pk);

        let result = gfs::outbreak(ob_cfg.t, &pk, ave_k);
        log::info!("u = {:.6}, S1 = {:.6}", result.u, result.s1);

        self.write_json("outbreak.json", &result)
    }

    /// Bond-percolation experiment.
    pub fn run_percolation(&self) -> Result<()> {
        let pc_cfg = self.cfg.percolation()?;
        let mut rng = self.make_rng().context("failed to construct rng")?;
        let network = self.build_prototype(&mut rng)?;

        let result =
            percolation::occupied_fraction(&network, self.cfg.network.n, pc_cfg.t, &mut rng)
                .context("failed to percolate network")?;
        log::info!("occupied fraction: {:.6}", result.occupied_fraction);

        self.write_json("percolation.json", &result)
    }

    /// Addition-deletion degree-distribution evolution.
    pub fn run_evolve(&self) -> Result<()> {
        let ev_cfg = self.cfg.evolve()?;
        let mut rng = self.make_rng().context("failed to construct rng")?;
        let network = self.build_prototype(&mut rng)?;

        let result = evolve::integrate(&network, self.cfg.network.kmean, ev_cfg)
            .context("failed to evolve degree distribution")?;

        self.write_json("evolve.json", &result)
    }

    /// Aggregate all stochastic runs into a summary report.
    pub fn run_analysis(&self) -> Result<()> {
        let n_runs = self.count_run_dirs().context("failed to count run dirs")?;
        let mut analyzer = Analyzer::new();

        for run_idx in 0..n_runs {
            let file = self.run_dir(run_idx).join("results.msgpack");
            analyzer
                .add_file(&file)
                .with_context(|| format!("failed to add {file:?}"))?;
        }

        let summary_file = self.sim_dir.join("summary.json");
        analyzer
            .save_results(&summary_file)
            .context("failed to save summary")?;
        log::info!("summarized {n_runs} runs into {summary_file:?}");

        Ok(())
    }

    /// Remove run directories and derived outputs.
    pub fn clean_sim(&self) -> Result<()> {
        let n_runs = self.count_run_dirs().context("failed to count run dirs")?;
        for run_idx in 0..n_runs {
            let run_dir = self.run_dir(run_idx);
            fs::remove_dir_all(&run_dir)
                .with_context(|| format!("failed to remove {run_dir:?}"))?;
        }

        for name in [
            "mean_field.json",
            "outbreak.json",
            "percolation.json",
            "evolve.json",
            "summary.json",
        ] {
            let file = self.sim_dir.join(name);
            if file.exists() {
                fs::remove_file(&file).with_context(|| format!("failed to remove {file:?}"))?;
            }
        }

        Ok(())
    }

    fn make_rng(&self) -> Result<ChaCha12Rng> {
        let rng = match self.cfg.seed {
            Some(seed) => ChaCha12Rng::seed_from_u64(seed),
            None => ChaCha12Rng::try_from_os_rng()?,
        };
        Ok(rng)
    }

    fn build_prototype(&self, rng: &mut ChaCha12Rng) -> Result<Network> {
        let prototype = Network::erdos_renyi(self.cfg.network.n, self.cfg.network.kmean, rng)
            .context("failed to build prototype network")?;
        log::info!(
            "prototype network: {} nodes, {} edges",
            prototype.order(),
            prototype.size()
        );
        Ok(prototype)
    }

    fn write_json<T: Serialize>(&self, name: &str, value: &T) -> Result<()> {
        let file = self.sim_dir.join(name);
        let file = File::create(&file).with_context(|| format!("failed to create {file:?}"))?;
        let writer = BufWriter::new(file);
        serde_json::to_writer_pretty(writer, value).context("failed to serialize results")?;
        Ok(())
    }

    fn count_run_dirs(&self) -> Result<usize> {
        let pattern = self.sim_dir.join("run-*");
        let pattern = pattern.to_str().context("pattern is not valid UTF-8")?;
        let count = glob(pattern)
            .context("failed to glob run dirs")?
            .filter_map(Result::ok)
            .filter(|p| p.is_dir())
            .count();
        Ok(count)
    }

    fn run_dir(&self, run_idx: usize) -> PathBuf {
        self.sim_dir.join(format!("run-{run_idx:04}"))
    }
}
