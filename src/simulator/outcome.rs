use serde::{Deserialize, Serialize};

/// Everything one full horizon simulation produces: per-hour arrays plus a
/// handful of aggregates the fitness function and the orchestrator read
/// directly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutcomeRecord {
    pub load_wh: Vec<f64>,
    pub grid_import_wh: Vec<f64>,
    pub grid_export_wh: Vec<f64>,
    pub battery_soc_percent: Vec<f64>,
    pub ev_soc_percent: Vec<f64>,
    pub cost_eur: Vec<f64>,
    pub revenue_eur: Vec<f64>,
    pub losses_wh: Vec<f64>,
    pub appliance_consumption_wh: Vec<f64>,

    /// Net cost over the horizon (`sum(cost_eur) - sum(revenue_eur)`); lower
    /// is better, negative means the horizon was net profitable.
    pub total_balance_eur: f64,
    pub total_losses_wh: f64,
}

impl OutcomeRecord {
    pub fn with_horizon(horizon: usize) -> Self {
        Self {
            load_wh: vec![0.0; horizon],
            grid_import_wh: vec![0.0; horizon],
            grid_export_wh: vec![0.0; horizon],
            battery_soc_percent: vec![0.0; horizon],
            ev_soc_percent: vec![0.0; horizon],
            cost_eur: vec![0.0; horizon],
            revenue_eur: vec![0.0; horizon],
            losses_wh: vec![0.0; horizon],
            appliance_consumption_wh: vec![0.0; horizon],
            total_balance_eur: 0.0,
            total_losses_wh: 0.0,
        }
    }

    /// Replace the first element of every per-hour array with a null marker
    /// (it describes the hour before `start_hour`, not the plan itself),
    /// and replace any NaN with the same marker so the record serializes
    /// cleanly.
    pub fn nullify_leading_and_nan(&mut self) {
        for series in [
            &mut self.load_wh,
            &mut self.grid_import_wh,
            &mut self.grid_export_wh,
            &mut self.battery_soc_percent,
            &mut self.ev_soc_percent,
            &mut self.cost_eur,
            &mut self.revenue_eur,
            &mut self.losses_wh,
            &mut self.appliance_consumption_wh,
        ] {
            if let Some(first) = series.first_mut() {
                *first = f64::NAN;
            }
        }
    }
}

/// A point-in-time snapshot of the EV battery, returned alongside the plan
/// so a caller can inspect where the vehicle ended up without re-deriving
/// it from the outcome arrays.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct EvBatterySnapshot {
    pub start_soc_percent: f64,
    pub final_soc_percent: f64,
    pub capacity_wh: f64,
}
