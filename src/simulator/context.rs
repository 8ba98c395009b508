use crate::domain::{Appliance, BatteryModel, ChargerGeometry, Inverter};
use crate::error::{OptimizerError, Result};

use super::outcome::{EvBatterySnapshot, OutcomeRecord};

/// The per-hour forecast bundle a simulation run is driven by. Every field
/// has length `horizon`.
#[derive(Debug, Clone)]
pub struct ForecastBundle {
    pub pv_wh: Vec<f64>,
    pub load_wh: Vec<f64>,
    pub price_eur_per_wh: Vec<f64>,
    pub feed_in_tariff_eur_per_wh: Vec<f64>,
    pub temperature_c: Vec<f64>,
}

impl ForecastBundle {
    pub fn validate(&self, horizon: usize) -> Result<()> {
        let lengths = [
            ("pv_wh", self.pv_wh.len()),
            ("load_wh", self.load_wh.len()),
            ("price_eur_per_wh", self.price_eur_per_wh.len()),
            (
                "feed_in_tariff_eur_per_wh",
                self.feed_in_tariff_eur_per_wh.len(),
            ),
            ("temperature_c", self.temperature_c.len()),
        ];
        for (name, len) in lengths {
            if len != horizon {
                return Err(OptimizerError::InvalidParameters(format!(
                    "forecast series `{name}` has length {len}, expected horizon {horizon}"
                )));
            }
        }
        Ok(())
    }
}

/// The one-step-per-hour energy simulator: owns both batteries, the
/// optional appliance, the inverter, and the forecasts, and turns a decoded
/// dispatch plan into an [`OutcomeRecord`].
///
/// Plain value type, `Clone`, cheap to reset between evaluations — a
/// fitness evaluation resets and re-simulates the same context rather than
/// constructing a fresh one each time.
#[derive(Debug, Clone)]
pub struct SimulatorContext {
    pub pv_battery: BatteryModel,
    pub ev_battery: BatteryModel,
    pub appliance: Option<Appliance>,
    pub inverter: Inverter,
    pub charger: ChargerGeometry,
    pub forecast: ForecastBundle,
    horizon: usize,

    appliance_start_hour: Option<usize>,
    battery_charge: Vec<f64>,
    battery_discharge: Vec<f64>,
    ev_charge_currents: Vec<f64>,
}

impl SimulatorContext {
    pub fn new(
        pv_battery: BatteryModel,
        ev_battery: BatteryModel,
        appliance: Option<Appliance>,
        inverter: Inverter,
        charger: ChargerGeometry,
        forecast: ForecastBundle,
    ) -> Result<Self> {
        let horizon = forecast.load_wh.len();
        forecast.validate(horizon)?;
        Ok(Self {
            pv_battery,
            ev_battery,
            appliance,
            inverter,
            charger,
            forecast,
            horizon,
            appliance_start_hour: None,
            battery_charge: vec![0.0; horizon],
            battery_discharge: vec![0.0; horizon],
            ev_charge_currents: vec![0.0; horizon],
        })
    }

    pub fn horizon(&self) -> usize {
        self.horizon
    }

    /// Restore both batteries to their configured starting SoC and clear
    /// the per-hour command vectors set by a previous evaluation.
    pub fn reset(&mut self) {
        self.pv_battery.reset();
        self.ev_battery.reset();
        self.appliance_start_hour = None;
        self.battery_charge.iter_mut().for_each(|v| *v = 0.0);
        self.battery_discharge.iter_mut().for_each(|v| *v = 0.0);
        self.ev_charge_currents.iter_mut().for_each(|v| *v = 0.0);
    }

    /// Position the deferrable appliance. `hour` is a wall-clock hour in
    /// `[anchor, 23]` (the domain of the appliance gene); `anchor` is the
    /// wall-clock hour that horizon index 0 represents. The stored value is
    /// the 0-based horizon index `hour - anchor`, which is what
    /// [`Appliance::consumption_at`](crate::domain::Appliance::consumption_at)
    /// expects.
    pub fn set_appliance_start(&mut self, hour: usize, anchor: usize) {
        self.appliance_start_hour = Some(hour.saturating_sub(anchor));
    }

    pub fn set_battery_charge(&mut self, intensities: Vec<f64>) -> Result<()> {
        self.check_length("battery_charge", intensities.len())?;
        self.battery_charge = intensities;
        Ok(())
    }

    pub fn set_battery_discharge(&mut self, enable: Vec<f64>) -> Result<()> {
        self.check_length("battery_discharge", enable.len())?;
        self.battery_discharge = enable;
        Ok(())
    }

    pub fn set_ev_charge_currents(&mut self, currents: Vec<f64>) -> Result<()> {
        self.check_length("ev_charge_currents", currents.len())?;
        self.ev_charge_currents = currents;
        Ok(())
    }

    fn check_length(&self, name: &str, len: usize) -> Result<()> {
        if len != self.horizon {
            return Err(OptimizerError::InvalidParameters(format!(
                "`{name}` has length {len}, expected horizon {}",
                self.horizon
            )));
        }
        Ok(())
    }

    pub fn ev_final_soc_percent(&self) -> f64 {
        self.ev_battery.soc_percent().as_percent()
    }

    pub fn battery_energy_wh(&self) -> f64 {
        self.pv_battery.energy_wh()
    }

    pub fn ev_state_snapshot(&self) -> EvBatterySnapshot {
        EvBatterySnapshot {
            start_soc_percent: self.ev_battery.start_soc_percent().as_percent(),
            final_soc_percent: self.ev_battery.soc_percent().as_percent(),
            capacity_wh: self.ev_battery.caps.capacity_wh,
        }
    }

    /// Walk `horizon` hours. `start_hour` is accepted to match the external
    /// interface (it anchors temperature/appliance wall-clock bookkeeping in
    /// the source model) but the appliance anchor is already resolved to a
    /// horizon index by [`set_appliance_start`](Self::set_appliance_start);
    /// the command vectors set above are always indexed 0-based into the
    /// horizon regardless of `start_hour`.
    pub fn simulate(&mut self, _start_hour: usize) -> OutcomeRecord {
        let mut outcome = OutcomeRecord::with_horizon(self.horizon);
        let appliance_start = self.appliance_start_hour.unwrap_or(0);

        for h in 0..self.horizon {
            let appliance_wh = self
                .appliance
                .as_ref()
                .map(|a| a.consumption_at(h, appliance_start))
                .unwrap_or(0.0);
            let base_load_wh = self.forecast.load_wh[h] + appliance_wh;
            let pv_wh = self.forecast.pv_wh[h];

            let charge_flow = self.pv_battery.step_charge(self.battery_charge[h]);
            let discharge_flow = self.pv_battery.step_discharge(self.battery_discharge[h]);

            let ev_requested_wh = self.charger.watt_hours_for(self.ev_charge_currents[h]);
            let ev_flow = self.ev_battery.charge_fixed(ev_requested_wh);

            let net_wh = self.inverter.clamp(
                base_load_wh + charge_flow.ac_wh + ev_flow.ac_wh - pv_wh - discharge_flow.ac_wh,
            );

            let (import_wh, export_wh) = if net_wh >= 0.0 {
                (net_wh, 0.0)
            } else {
                (0.0, -net_wh)
            };

            outcome.load_wh[h] = base_load_wh;
            outcome.grid_import_wh[h] = import_wh;
            outcome.grid_export_wh[h] = export_wh;
            outcome.battery_soc_percent[h] = self.pv_battery.soc_percent().as_percent();
            outcome.ev_soc_percent[h] = self.ev_battery.soc_percent().as_percent();
            outcome.cost_eur[h] = import_wh * self.forecast.price_eur_per_wh[h];
            outcome.revenue_eur[h] = export_wh * self.forecast.feed_in_tariff_eur_per_wh[h];
            outcome.losses_wh[h] = charge_flow.loss_wh + discharge_flow.loss_wh + ev_flow.loss_wh;
            outcome.appliance_consumption_wh[h] = appliance_wh;

            outcome.total_balance_eur += outcome.cost_eur[h] - outcome.revenue_eur[h];
            outcome.total_losses_wh += outcome.losses_wh[h];
        }

        outcome
    }
}
