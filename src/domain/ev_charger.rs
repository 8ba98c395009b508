use serde::{Deserialize, Serialize};

/// Fixed three-phase charger geometry used to convert a current level into
/// watt-hours for one simulated hour. A pure function — there is no charger
/// hardware here, only the discrete current levels a dispatch plan can
/// select from.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ChargerGeometry {
    pub voltage_v: f64,
    pub phases: u8,
}

impl Default for ChargerGeometry {
    fn default() -> Self {
        Self {
            voltage_v: 230.0,
            phases: 3,
        }
    }
}

impl ChargerGeometry {
    pub fn watt_hours_for(&self, amps: f64) -> f64 {
        amps.max(0.0) * self.voltage_v * self.phases as f64
    }
}

/// The ordered, finite set of EV charge currents a dispatch plan indexes
/// into. Index 0 is always "no charge".
pub fn default_charge_currents() -> Vec<f64> {
    vec![0.0, 2.0, 4.0, 6.0, 8.0, 10.0, 13.0, 16.0]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_zero_means_no_charge() {
        let currents = default_charge_currents();
        assert_eq!(currents[0], 0.0);
    }

    #[test]
    fn geometry_computes_three_phase_power() {
        let g = ChargerGeometry::default();
        assert_eq!(g.watt_hours_for(16.0), 16.0 * 230.0 * 3.0);
    }
}
