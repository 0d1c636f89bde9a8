use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::{fmt::Debug, fs, ops::RangeBounds, path::Path};

/// Simulation configuration parameters.
///
/// Loaded from a TOML file and validated before use.
/// See [`Config::from_file`] for loading.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Optional fixed seed for the random number generator.
    ///
    /// When absent the generator is seeded from the operating system.
    pub seed: Option<u64>,

    pub network: NetworkConfig,
    pub sir: SirConfig,

    pub mean_field: Option<MeanFieldConfig>,
    pub outbreak: Option<OutbreakConfig>,
    pub percolation: Option<PercolationConfig>,
    pub evolve: Option<EvolveConfig>,
}

/// Prototype network parameters.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// Order of the network before isolate removal.
    pub n: usize,
    /// Target mean degree.
    pub kmean: f64,
}

/// Parameters of the SIR process driven by the stochastic engine.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct SirConfig {
    /// Per-contact infection rate.
    pub p_infect: f64,
    /// Recovery rate.
    pub p_recover: f64,
    /// Probability that a node starts infected.
    pub p_infected: f64,
    /// Force one infected node into a non-empty degree class whose
    /// random seeding drew zero infected.
    ///
    /// Biases small classes; off unless requested.
    #[serde(default)]
    pub force_seed: bool,
    /// Maximum simulated time per degree class.
    pub max_time: f64,
}

/// Degree-based mean-field integration parameters.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct MeanFieldConfig {
    /// Integration horizon.
    pub t_max: f64,
    /// Integration step.
    pub dt: f64,
}

/// Generating-function final-size parameters.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct OutbreakConfig {
    /// Transmissibility.
    pub t: f64,
}

/// Bond-percolation experiment parameters.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct PercolationConfig {
    /// Edge occupation probability.
    pub t: f64,
}

/// Addition-deletion network evolution parameters.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct EvolveConfig {
    /// Maximum degree cut-off.
    pub k_max: usize,
    /// Degree kernel of arriving nodes.
    pub kernel: Kernel,
    /// Integration horizon.
    pub t_max: f64,
    /// Integration step.
    pub dt: f64,
}

/// Degree distribution of nodes arriving in the addition-deletion process.
#[derive(Debug, PartialEq, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Kernel {
    /// Poisson distribution with mean `kmean`.
    Poisson,
    /// All arriving nodes have degree `kmean` (rounded).
    Delta,
}

impl Config {
    /// Load a [`Config`] from a TOML file.
    ///
    /// Performs validation on all parameters before returning.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read, deserialized,
    /// or if the configuration values are invalid.
    pub fn from_file<P: AsRef<Path>>(file: P) -> Result<Self> {
        let file = file.as_ref();
        let contents =
            fs::read_to_string(file).with_context(|| format!("failed to read {file:?}"))?;

        let config: Config = toml::from_str(&contents).context("failed to deserialize config")?;

        config.validate().context("failed to validate config")?;

        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        check_num(self.network.n, 1..10_000_000).context("invalid network order")?;
        if self.network.kmean <= 0.0 || self.network.kmean > self.network.n as f64 {
            bail!("mean degree must be in (0, n]");
        }

        check_num(self.sir.p_infect, 0.0..=1.0).context("invalid infection rate")?;
        check_num(self.sir.p_recover, 0.0..=1.0).context("invalid recovery rate")?;
        check_num(self.sir.p_infected, 0.0..=1.0).context("invalid seeding probability")?;
        if self.sir.max_time <= 0.0 {
            bail!("maximum simulated time must be positive");
        }

        if let Some(mf) = &self.mean_field {
            check_num(mf.t_max, 0.0..1e6).context("invalid mean-field horizon")?;
            if mf.dt <= 0.0 || mf.dt > mf.t_max {
                bail!("mean-field step must be in (0, t_max]");
            }
        }

        if let Some(ob) = &self.outbreak {
            check_num(ob.t, 0.0..=1.0).context("invalid outbreak transmissibility")?;
        }

        if let Some(pc) = &self.percolation {
            check_num(pc.t, 0.0..=1.0).context("invalid occupation probability")?;
        }

        if let Some(ev) = &self.evolve {
            check_num(ev.k_max, 1..10_000).context("invalid degree cut-off")?;
            check_num(ev.t_max, 0.0..1e6).context("invalid evolution horizon")?;
            if ev.dt <= 0.0 || ev.dt > ev.t_max {
                bail!("evolution step must be in (0, t_max]");
            }
        }

        Ok(())
    }

    /// Mean-field section, required for the `mean-field` command.
    pub fn mean_field(&self) -> Result<&MeanFieldConfig> {
        self.mean_field
            .as_ref()
            .context("missing [mean_field] section in config")
    }

    /// Outbreak section, required for the `outbreak` command.
    pub fn outbreak(&self) -> Result<&OutbreakConfig> {
        self.outbreak
            .as_ref()
            .context("missing [outbreak] section in config")
    }

    /// Percolation section, required for the `percolation` command.
    pub fn percolation(&self) -> Result<&PercolationConfig> {
        self.percolation
            .as_ref()
            .context("missing [percolation] section in config")
    }

    /// Evolve section, required for the `evolve` command.
    pub fn evolve(&self) -> Result<&EvolveConfig> {
        self.evolve
            .as_ref()
            .context("missing [evolve] section in config")
    }
}

fn check_num<T, R>(num: T, range: R) -> Result<()>
where
    T: PartialOrd + Debug,
    R: RangeBounds<T> + Debug,
{
    if !range.contains(&num) {
        bail!("number must be in the range {range:?}, but is {num:?}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_toml() -> &'static str {
        r#"
seed = 42

[network]
n = 1000
kmean = 5.0

[sir]
p_infect = 0.3
p_recover = 0.1
p_infected = 0.01
max_time = 500.0

[mean_field]
t_max = 150.0
dt = 1.0

[outbreak]
t = 0.6

[percolation]
t = 0.6

[evolve]
k_max = 30
kernel = "delta"
t_max = 10.0
dt = 0.1
"#
    }

    #[test]
    fn full_config_parses_and_validates() {
        let cfg: Config = toml::from_str(full_toml()).unwrap();
        cfg.validate().unwrap();
        assert_eq!(cfg.seed, Some(42));
        assert!(!cfg.sir.force_seed);
        assert_eq!(cfg.evolve.unwrap().kernel, Kernel::Delta);
    }

    #[test]
    fn missing_required_key_fails() {
        let toml_str = r#"
[network]
n = 1000
kmean = 5.0

[sir]
p_infect = 0.3
p_recover = 0.1
max_time = 500.0
"#;
        assert!(toml::from_str::<Config>(toml_str).is_err());
    }

    #[test]
    fn missing_optional_sections_are_allowed() {
        let toml_str = r#"
[network]
n = 1000
kmean = 5.0

[sir]
p_infect = 0.3
p_recover = 0.1
p_infected = 0.01
max_time = 500.0
"#;
        let cfg: Config = toml::from_str(toml_str).unwrap();
        cfg.validate().unwrap();
        assert!(cfg.mean_field().is_err());
        assert!(cfg.outbreak().is_err());
    }

    #[test]
    fn out_of_range_probability_fails_validation() {
        let mut cfg: Config = toml::from_str(full_toml()).unwrap();
        cfg.sir.p_infect = 1.5;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn non_positive_max_time_fails_validation() {
        let mut cfg: Config = toml::from_str(full_toml()).unwrap();
        cfg.sir.max_time = 0.0;
        assert!(cfg.validate().is_err());
    }
}
