use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::info_span;
use validator::Validate;

use crate::config::OptimizerConfig;
use crate::domain::{
    default_charge_currents, Appliance, BatteryCapabilities, BatteryModel, ChargerGeometry,
    Inverter,
};
use crate::error::{OptimizerError, Result};
use crate::simulator::{EvBatterySnapshot, ForecastBundle, OutcomeRecord, SimulatorContext};

use super::adapter::SimulatorAdapter;
use super::evolution::EvolutionLoop;
use super::fitness::{Diagnostics, FitnessContext};
use super::genome::Codec;

/// The full input contract for one optimization run.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RunParameters {
    pub pv_forecast: Vec<f64>,
    pub load: Vec<f64>,
    pub price_eur_per_wh: Vec<f64>,
    pub feed_in_tariff_eur_per_wh: f64,
    pub temperature_forecast: Vec<f64>,

    #[validate(range(min = 1e-9))]
    pub pv_akku_cap_wh: f64,
    #[validate(range(min = 0.0, max = 100.0))]
    pub pv_soc_percent: f64,
    #[validate(range(min = 0.0, max = 100.0))]
    pub min_soc_percent: f64,

    #[validate(range(min = 1e-9))]
    pub ev_cap_wh: f64,
    #[validate(range(min = 0.0, max = 100.0))]
    pub ev_soc_percent: f64,
    #[validate(range(min = 0.0, max = 100.0))]
    pub ev_min_soc_percent: f64,
    #[validate(range(exclusive_min = 0.0, max = 1.0))]
    pub ev_charge_efficiency: f64,
    #[validate(range(min = 1e-9))]
    pub ev_charge_power_w: f64,

    pub appliance_wh: f64,
    pub appliance_duration_h: u32,

    pub battery_price_eur_per_wh: f64,

    pub start_solution: Option<Vec<i32>>,

    #[validate(range(max = 23))]
    pub start_hour: usize,
    pub worst_case: bool,
    pub ngen: Option<usize>,

    /// Effectively no clamp unless the caller sets a tighter value; the
    /// inverter is not part of the run-parameter contract proper but a
    /// concrete domain model needs some bound.
    #[serde(default = "default_inverter_max_power_w")]
    pub inverter_max_power_w: f64,
}

fn default_inverter_max_power_w() -> f64 {
    1_000_000.0
}

/// The stationary PV battery's charge/discharge power ceiling. Fixed rather
/// than derived from `pv_akku_cap_wh`, matching `original_source/`'s
/// `PVAkku(..., max_ladeleistung_w=5000)` for the `akku` instance — capacity
/// and max power are independent physical properties there, not a 1C rate
/// that scales with pack size.
const PV_BATTERY_MAX_POWER_W: f64 = 5_000.0;

impl RunParameters {
    fn horizon(&self) -> usize {
        self.pv_forecast.len()
    }

    pub fn check(&self) -> Result<()> {
        self.validate()
            .map_err(|e| OptimizerError::InvalidParameters(e.to_string()))?;

        let h = self.horizon();
        if h == 0 {
            return Err(OptimizerError::InvalidParameters(
                "horizon must be nonzero".into(),
            ));
        }
        for (name, len) in [
            ("load", self.load.len()),
            ("price_eur_per_wh", self.price_eur_per_wh.len()),
            ("temperature_forecast", self.temperature_forecast.len()),
        ] {
            if len != h {
                return Err(OptimizerError::InvalidParameters(format!(
                    "`{name}` has length {len}, expected horizon {h} (from pv_forecast)"
                )));
            }
        }

        let has_appliance = self.appliance_duration_h > 0;
        let expected_len = 2 * h + usize::from(has_appliance);
        if let Some(start) = &self.start_solution {
            if start.len() != expected_len {
                return Err(OptimizerError::InvalidParameters(format!(
                    "start_solution has length {}, expected {expected_len}",
                    start.len()
                )));
            }
        }

        Ok(())
    }
}

/// The repackaged best plan returned from [`optimize_site`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizationResult {
    pub battery_charge: Vec<f64>,
    pub battery_discharge: Vec<f64>,
    pub ev_currents: Vec<f64>,
    pub appliance_start_hour: Option<usize>,
    pub outcome: OutcomeRecord,
    pub ev_snapshot: EvBatterySnapshot,
    pub genome: Vec<i32>,
    pub diagnostics: Vec<Diagnostics>,
}

/// Single entry point: builds the simulator context from `params`, seeds
/// and runs the evolutionary search, then repackages the best plan found.
pub fn optimize_site(params: &RunParameters, config: &OptimizerConfig) -> Result<OptimizationResult> {
    params.check()?;
    let _span = info_span!(
        "optimize_site",
        horizon = params.horizon(),
        ngen = params.ngen.unwrap_or(config.ngen)
    )
    .entered();

    let horizon = params.horizon();
    let has_appliance = params.appliance_duration_h > 0;
    let currents = default_charge_currents();

    let ev_optimization_disabled = params.ev_min_soc_percent <= params.ev_soc_percent;
    let ev_locked_tail = if ev_optimization_disabled { horizon } else { 0 };

    let codec = Codec::new(
        horizon,
        ev_locked_tail,
        params.start_hour,
        has_appliance,
        config.battery_action_bound,
        currents.len(),
    )?;

    let pv_battery = BatteryModel::new(
        BatteryCapabilities {
            capacity_wh: params.pv_akku_cap_wh,
            max_power_w: PV_BATTERY_MAX_POWER_W,
            charge_efficiency: 0.95,
            discharge_efficiency: 0.95,
            min_soc_percent: params.min_soc_percent,
        },
        params.pv_soc_percent,
    )?;
    let ev_battery = BatteryModel::new(
        BatteryCapabilities {
            capacity_wh: params.ev_cap_wh,
            max_power_w: params.ev_charge_power_w,
            charge_efficiency: params.ev_charge_efficiency,
            discharge_efficiency: 1.0,
            min_soc_percent: 0.0,
        },
        params.ev_soc_percent,
    )?;
    let appliance = has_appliance.then(|| Appliance::new(params.appliance_wh, params.appliance_duration_h));

    let forecast = ForecastBundle {
        pv_wh: params.pv_forecast.clone(),
        load_wh: params.load.clone(),
        price_eur_per_wh: params.price_eur_per_wh.clone(),
        feed_in_tariff_eur_per_wh: vec![params.feed_in_tariff_eur_per_wh; horizon],
        temperature_c: params.temperature_forecast.clone(),
    };
    let context = SimulatorContext::new(
        pv_battery,
        ev_battery,
        appliance,
        Inverter::new(params.inverter_max_power_w),
        ChargerGeometry::default(),
        forecast,
    )?;

    let fitness_ctx = FitnessContext {
        ev_min_soc_percent: params.ev_min_soc_percent,
        battery_price_eur_per_wh: params.battery_price_eur_per_wh,
        penalty_weight: config.penalty_weight,
        infeasible_cost: config.infeasible_cost,
        idle_shaping: config.idle_shaping,
        worst_case: params.worst_case,
    };

    let mut adapter = SimulatorAdapter {
        codec: codec.clone(),
        context,
        ev_currents: currents.clone(),
        start_hour: params.start_hour,
        fitness: fitness_ctx,
    };

    let mut run_config = config.clone();
    if let Some(ngen) = params.ngen {
        run_config.ngen = ngen;
    }

    let mut rng = match config.seed {
        Some(seed) => ChaCha8Rng::seed_from_u64(seed),
        None => ChaCha8Rng::from_rng(rand::thread_rng()).expect("OS entropy source is available"),
    };

    let (best, _stats, final_population) =
        EvolutionLoop::new(codec.clone(), &mut adapter, &run_config, &mut rng)
            .run(params.start_solution.as_deref())?;

    let (mut outcome, _, _) = adapter.evaluate(&best.genome)?;
    outcome.nullify_leading_and_nan();

    let (battery_actions, ev_indices, appliance_hour) = codec.split(&best.genome);
    let (battery_charge, battery_discharge) = codec.decode_battery(battery_actions);
    let ev_currents = codec.decode_ev(ev_indices, &currents);
    let ev_snapshot = adapter.context.ev_state_snapshot();

    let diagnostics: Vec<Diagnostics> = final_population
        .iter()
        .filter_map(|ind| ind.diagnostics)
        .collect();

    Ok(OptimizationResult {
        battery_charge,
        battery_discharge,
        ev_currents,
        appliance_start_hour: appliance_hour.map(|h| h as usize),
        outcome,
        ev_snapshot,
        genome: best.genome,
        diagnostics,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_params(horizon: usize) -> RunParameters {
        RunParameters {
            pv_forecast: vec![0.0; horizon],
            load: vec![0.0; horizon],
            price_eur_per_wh: vec![0.0003; horizon],
            feed_in_tariff_eur_per_wh: 0.00008,
            temperature_forecast: vec![15.0; horizon],
            pv_akku_cap_wh: 10_000.0,
            pv_soc_percent: 50.0,
            min_soc_percent: 10.0,
            ev_cap_wh: 50_000.0,
            ev_soc_percent: 20.0,
            ev_min_soc_percent: 80.0,
            ev_charge_efficiency: 0.9,
            ev_charge_power_w: 11_000.0,
            appliance_wh: 0.0,
            appliance_duration_h: 0,
            battery_price_eur_per_wh: 0.0002,
            start_solution: None,
            start_hour: 0,
            worst_case: false,
            ngen: Some(3),
            inverter_max_power_w: default_inverter_max_power_w(),
        }
    }

    fn tiny_config() -> OptimizerConfig {
        OptimizerConfig {
            mu: 6,
            lambda: 8,
            initial_population: 10,
            ngen: 3,
            ..OptimizerConfig::default()
        }
    }

    #[test]
    fn rejects_mismatched_forecast_length() {
        let mut params = base_params(6);
        params.load.push(0.0);
        assert!(params.check().is_err());
    }

    #[test]
    fn rejects_wrong_length_start_solution() {
        let mut params = base_params(6);
        params.start_solution = Some(vec![0; 5]);
        assert!(params.check().is_err());
    }

    #[test]
    fn ev_optimization_auto_disables_when_target_already_met() {
        let mut params = base_params(6);
        params.ev_min_soc_percent = 20.0;
        params.ev_soc_percent = 50.0;
        let mut config = tiny_config();
        config.seed = Some(1);
        let result = optimize_site(&params, &config).unwrap();
        assert!(result.ev_currents.iter().all(|&c| c == 0.0));
        assert_eq!(result.genome.len(), 2 * 6);
    }

    #[test]
    fn flat_scenario_drives_ev_soc_toward_target() {
        let params = base_params(6);
        let mut config = tiny_config();
        config.seed = Some(7);
        let result = optimize_site(&params, &config).unwrap();
        assert_eq!(result.ev_currents.len(), 6);
        assert_eq!(result.battery_charge.len(), 6);
    }

    #[test]
    fn appliance_start_hour_is_within_bounds_when_present() {
        let mut params = base_params(6);
        params.appliance_wh = 1500.0;
        params.appliance_duration_h = 2;
        params.start_hour = 2;
        let mut config = tiny_config();
        config.seed = Some(3);
        let result = optimize_site(&params, &config).unwrap();
        let start = result.appliance_start_hour.unwrap();
        assert!(start >= 2 && start <= 23);
        assert_eq!(result.genome.len(), 2 * 6 + 1);
    }

    // ev_locked_tail at 0/H, an absent appliance gene, and the
    // ev_min_soc <= ev_start_soc auto-disable all fall out of the same two
    // RunParameters fields, parametrized here.
    #[rstest::rstest]
    #[case::ev_target_already_met(20.0, 50.0, true)]
    #[case::ev_target_needs_closing(80.0, 20.0, false)]
    fn ev_locked_tail_boundary(
        #[case] ev_min_soc_percent: f64,
        #[case] ev_soc_percent: f64,
        #[case] expect_disabled: bool,
    ) {
        let mut params = base_params(6);
        params.ev_min_soc_percent = ev_min_soc_percent;
        params.ev_soc_percent = ev_soc_percent;
        let mut config = tiny_config();
        config.seed = Some(42);
        let result = optimize_site(&params, &config).unwrap();

        if expect_disabled {
            assert!(result.ev_currents.iter().all(|&c| c == 0.0));
        }
        // Genome length is independent of the locked-tail boundary either way.
        assert_eq!(result.genome.len(), 2 * 6);
    }

    #[rstest::rstest]
    #[case::no_appliance(0, 0.0, 0)]
    #[case::with_appliance(2, 1500.0, 1)]
    fn appliance_gene_presence_boundary(
        #[case] duration_h: u32,
        #[case] wh: f64,
        #[case] extra_gene: usize,
    ) {
        let mut params = base_params(6);
        params.appliance_duration_h = duration_h;
        params.appliance_wh = wh;
        let mut config = tiny_config();
        config.seed = Some(5);
        let result = optimize_site(&params, &config).unwrap();
        assert_eq!(result.genome.len(), 2 * 6 + extra_gene);
        assert_eq!(result.appliance_start_hour.is_some(), duration_h > 0);
    }
}
