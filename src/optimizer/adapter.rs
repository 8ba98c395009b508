use crate::error::Result;
use crate::simulator::{OutcomeRecord, SimulatorContext};

use super::fitness::{self, Diagnostics, FitnessContext};
use super::genome::Codec;

/// Drives the simulator with a decoded plan and scores the result. Owns the
/// one simulator context reused across every evaluation in a run.
pub struct SimulatorAdapter {
    pub codec: Codec,
    pub context: SimulatorContext,
    pub ev_currents: Vec<f64>,
    pub start_hour: usize,
    pub fitness: FitnessContext,
}

impl SimulatorAdapter {
    /// Reset the simulator, apply the decoded plan, run the horizon, and
    /// return both the raw outcome and the scored fitness.
    pub fn evaluate(&mut self, genome: &[i32]) -> Result<(OutcomeRecord, f64, Option<Diagnostics>)> {
        let (battery_actions, ev_indices, appliance_hour) = self.codec.split(genome);
        let (charge, discharge) = self.codec.decode_battery(battery_actions);
        let ev_currents = self.codec.decode_ev(ev_indices, &self.ev_currents);

        self.context.reset();
        if let Some(hour) = appliance_hour {
            self.context
                .set_appliance_start(hour as usize, self.start_hour);
        }
        self.context.set_battery_charge(charge)?;
        self.context.set_battery_discharge(discharge)?;
        let ev_nonzero: Vec<bool> = ev_currents.iter().map(|&a| a > 0.0).collect();
        self.context.set_ev_charge_currents(ev_currents)?;

        let outcome = self.context.simulate(self.start_hour);
        let (fitness, diagnostics) = fitness::evaluate(
            &outcome,
            battery_actions,
            &ev_nonzero,
            self.context.ev_final_soc_percent(),
            self.context.battery_energy_wh(),
            &self.fitness,
        );

        Ok((outcome, fitness, diagnostics))
    }
}
