use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::types::Percentage;

/// Battery-specific errors.
#[derive(Debug, Error, PartialEq)]
pub enum BatteryError {
    #[error("invalid efficiency {0}: must be in (0.0, 1.0]")]
    InvalidEfficiency(f64),
    #[error("invalid capacity {0} Wh: must be positive and finite")]
    InvalidCapacity(f64),
}

/// Energy moved across the AC/DC boundary during one step, and the portion
/// of it lost to round-trip inefficiency.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnergyFlow {
    pub ac_wh: f64,
    pub loss_wh: f64,
}

/// Static electrical properties of a battery, independent of its current state.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct BatteryCapabilities {
    pub capacity_wh: f64,
    pub max_power_w: f64,
    /// Efficiency applied on charge; discharge uses its own separate factor,
    /// so round-trip loss is split across both legs.
    pub charge_efficiency: f64,
    pub discharge_efficiency: f64,
    pub min_soc_percent: f64,
}

impl BatteryCapabilities {
    pub fn validate(&self) -> Result<(), BatteryError> {
        if !self.capacity_wh.is_finite() || self.capacity_wh <= 0.0 {
            return Err(BatteryError::InvalidCapacity(self.capacity_wh));
        }
        for eff in [self.charge_efficiency, self.discharge_efficiency] {
            if !eff.is_finite() || eff <= 0.0 || eff > 1.0 {
                return Err(BatteryError::InvalidEfficiency(eff));
            }
        }
        Ok(())
    }
}

/// A stationary PV battery or an EV battery — the same arithmetic model
/// serves both; only the capabilities and starting SoC differ per caller.
///
/// Deliberately a plain value type rather than a trait object behind a
/// lock: the optimizer resets or clones this once per fitness evaluation,
/// so it has to stay cheap and synchronous.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatteryModel {
    pub caps: BatteryCapabilities,
    start_soc_percent: f64,
    soc_percent: f64,
}

impl BatteryModel {
    pub fn new(caps: BatteryCapabilities, start_soc_percent: f64) -> Result<Self, BatteryError> {
        caps.validate()?;
        let start_soc_percent = start_soc_percent.clamp(0.0, 100.0);
        Ok(Self {
            caps,
            start_soc_percent,
            soc_percent: start_soc_percent,
        })
    }

    pub fn reset(&mut self) {
        self.soc_percent = self.start_soc_percent;
    }

    pub fn soc_percent(&self) -> Percentage {
        Percentage::new(self.soc_percent)
    }

    pub fn start_soc_percent(&self) -> Percentage {
        Percentage::new(self.start_soc_percent)
    }

    pub fn energy_wh(&self) -> f64 {
        self.caps.capacity_wh * self.soc_percent / 100.0
    }

    fn apply_charge_wh(&mut self, requested_ac_wh: f64) -> EnergyFlow {
        if requested_ac_wh <= 0.0 {
            return EnergyFlow {
                ac_wh: 0.0,
                loss_wh: 0.0,
            };
        }
        let requested_dc_wh = requested_ac_wh * self.caps.charge_efficiency;
        let headroom_wh = (self.caps.capacity_wh - self.energy_wh()).max(0.0);
        let applied_dc_wh = requested_dc_wh.min(headroom_wh);
        let applied_ac_wh = if self.caps.charge_efficiency > 0.0 {
            applied_dc_wh / self.caps.charge_efficiency
        } else {
            0.0
        };
        self.soc_percent =
            (self.soc_percent + (applied_dc_wh / self.caps.capacity_wh) * 100.0).clamp(0.0, 100.0);
        EnergyFlow {
            ac_wh: applied_ac_wh,
            loss_wh: applied_ac_wh - applied_dc_wh,
        }
    }

    /// Apply one hour of charging at `intensity` (0..=1, a fraction of
    /// `max_power_w`). Returns the AC-side energy drawn and the loss
    /// incurred getting it into the cell.
    pub fn step_charge(&mut self, intensity: f64) -> EnergyFlow {
        let intensity = intensity.clamp(0.0, 1.0);
        self.apply_charge_wh(self.caps.max_power_w * intensity)
    }

    /// Apply one hour of charging with a fixed AC-side energy amount rather
    /// than an intensity fraction — used by chargers that draw a concrete
    /// current rather than a relative power level.
    pub fn charge_fixed(&mut self, ac_wh: f64) -> EnergyFlow {
        self.apply_charge_wh(ac_wh.min(self.caps.max_power_w))
    }

    /// Apply one hour of discharging enabled (`enable` nonzero). Returns the
    /// AC-side energy delivered and the loss incurred along the way.
    pub fn step_discharge(&mut self, enable: f64) -> EnergyFlow {
        if enable <= 0.0 {
            return EnergyFlow {
                ac_wh: 0.0,
                loss_wh: 0.0,
            };
        }
        let floor_wh = self.caps.capacity_wh * self.caps.min_soc_percent / 100.0;
        let available_dc_wh = (self.energy_wh() - floor_wh).max(0.0);
        let dc_wh = available_dc_wh.min(self.caps.max_power_w);
        let ac_wh = dc_wh * self.caps.discharge_efficiency;
        self.soc_percent =
            (self.soc_percent - (dc_wh / self.caps.capacity_wh) * 100.0).clamp(0.0, 100.0);
        EnergyFlow {
            ac_wh,
            loss_wh: dc_wh - ac_wh,
        }
    }
}
