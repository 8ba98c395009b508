use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::{OptimizerError, Result};

fn default_mu() -> usize {
    100
}
fn default_lambda() -> usize {
    150
}
fn default_initial_population() -> usize {
    300
}
fn default_ngen() -> usize {
    400
}
fn default_cxpb() -> f64 {
    0.5
}
fn default_mutpb() -> f64 {
    0.5
}
fn default_gene_mutation_rate() -> f64 {
    0.10
}
fn default_tournament_size() -> usize {
    3
}
fn default_penalty_weight() -> f64 {
    10.0
}
fn default_infeasible_cost() -> f64 {
    1e5
}
fn default_idle_shaping() -> f64 {
    0.01
}
fn default_battery_action_bound() -> i32 {
    5
}

/// Tunables for the evolutionary search. Every field carries a default
/// reproducing the reference run out of the box; `OptimizerConfig::load()`
/// layers an optional `config/optimizer.toml` and `DISPATCH__`-prefixed
/// environment variables on top via `figment::providers::{Toml, Env}`.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct OptimizerConfig {
    #[serde(default = "default_mu")]
    #[validate(range(min = 1))]
    pub mu: usize,

    #[serde(default = "default_lambda")]
    #[validate(range(min = 1))]
    pub lambda: usize,

    #[serde(default = "default_initial_population")]
    #[validate(range(min = 1))]
    pub initial_population: usize,

    #[serde(default = "default_ngen")]
    pub ngen: usize,

    #[serde(default = "default_cxpb")]
    #[validate(range(min = 0.0, max = 1.0))]
    pub cxpb: f64,

    #[serde(default = "default_mutpb")]
    #[validate(range(min = 0.0, max = 1.0))]
    pub mutpb: f64,

    /// Per-gene resample probability used by every typed mutation operator.
    #[serde(default = "default_gene_mutation_rate")]
    #[validate(range(min = 0.0, max = 1.0))]
    pub gene_mutation_rate: f64,

    #[serde(default = "default_tournament_size")]
    #[validate(range(min = 2))]
    pub tournament_size: usize,

    /// Per-hour-per-violation weight applied to every soft penalty term.
    #[serde(default = "default_penalty_weight")]
    pub penalty_weight: f64,

    /// Sentinel cost assigned when a simulation is infeasible.
    #[serde(default = "default_infeasible_cost")]
    pub infeasible_cost: f64,

    /// Idle-discharge shaping constant added per hour the battery sits idle.
    #[serde(default = "default_idle_shaping")]
    pub idle_shaping: f64,

    /// Width of the asymmetric battery-action alphabet `[-bound, +1]`. Left
    /// at its default of 5 reproduces the original `[-5, +1]` domain.
    #[serde(default = "default_battery_action_bound")]
    #[validate(range(min = 1))]
    pub battery_action_bound: i32,

    /// Deterministic seed; `None` draws entropy from the OS once at
    /// construction, which is not reproducible across runs.
    #[serde(default)]
    pub seed: Option<u64>,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            mu: default_mu(),
            lambda: default_lambda(),
            initial_population: default_initial_population(),
            ngen: default_ngen(),
            cxpb: default_cxpb(),
            mutpb: default_mutpb(),
            gene_mutation_rate: default_gene_mutation_rate(),
            tournament_size: default_tournament_size(),
            penalty_weight: default_penalty_weight(),
            infeasible_cost: default_infeasible_cost(),
            idle_shaping: default_idle_shaping(),
            battery_action_bound: default_battery_action_bound(),
            seed: None,
        }
    }
}

impl OptimizerConfig {
    pub fn load() -> Result<Self> {
        let figment = Figment::from(figment::providers::Serialized::defaults(
            OptimizerConfig::default(),
        ))
        .merge(Toml::file("config/optimizer.toml"))
        .merge(Env::prefixed("DISPATCH__").split("__"));

        let cfg: OptimizerConfig = figment
            .extract()
            .map_err(|e| OptimizerError::InvalidParameters(e.to_string()))?;

        cfg.validate()
            .map_err(|e| OptimizerError::InvalidParameters(e.to_string()))?;

        Ok(cfg)
    }
}
