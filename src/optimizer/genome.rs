use rand::Rng;

use crate::error::{OptimizerError, Result};

/// The three gene kinds a dispatch genome is built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeneKind {
    BatteryAction,
    EvIndex,
    ApplianceHour,
}

/// Owns the genome layout for one run: horizon, locked EV tail, whether an
/// appliance gene is present, and the domain bounds for each gene kind.
/// Every operator (mutation, crossover, decoding) goes through this codec so
/// gene domains are enforced in exactly one place.
#[derive(Debug, Clone)]
pub struct Codec {
    pub horizon: usize,
    pub ev_locked_tail: usize,
    pub start_hour: usize,
    pub has_appliance: bool,
    pub battery_action_bound: i32,
    pub ev_index_count: usize,
}

impl Codec {
    pub fn new(
        horizon: usize,
        ev_locked_tail: usize,
        start_hour: usize,
        has_appliance: bool,
        battery_action_bound: i32,
        ev_index_count: usize,
    ) -> Result<Self> {
        if ev_locked_tail > horizon {
            return Err(OptimizerError::InvalidParameters(format!(
                "ev_locked_tail {ev_locked_tail} exceeds horizon {horizon}"
            )));
        }
        if start_hour > 23 {
            return Err(OptimizerError::InvalidParameters(format!(
                "start_hour {start_hour} out of range [0,23]"
            )));
        }
        if ev_index_count == 0 {
            return Err(OptimizerError::InvalidParameters(
                "ev_index_count must be at least 1".into(),
            ));
        }
        Ok(Self {
            horizon,
            ev_locked_tail,
            start_hour,
            has_appliance,
            battery_action_bound,
            ev_index_count,
        })
    }

    /// The genome length `L = 2H + {0,1}`.
    pub fn layout(&self) -> usize {
        2 * self.horizon + usize::from(self.has_appliance)
    }

    /// Index of the first EV gene locked to zero, or `horizon` if nothing is
    /// locked.
    pub fn ev_unlocked_count(&self) -> usize {
        self.horizon - self.ev_locked_tail
    }

    fn battery_action_range(&self) -> (i32, i32) {
        (-self.battery_action_bound, 1)
    }

    pub fn sample_gene(&self, kind: GeneKind, rng: &mut impl Rng) -> i32 {
        match kind {
            GeneKind::BatteryAction => {
                let (lo, hi) = self.battery_action_range();
                rng.gen_range(lo..=hi)
            }
            GeneKind::EvIndex => rng.gen_range(0..self.ev_index_count as i32),
            GeneKind::ApplianceHour => rng.gen_range(self.start_hour as i32..=23),
        }
    }

    /// Assemble a fresh, domain-valid genome.
    pub fn new_random_individual(&self, rng: &mut impl Rng) -> Vec<i32> {
        let mut genome = Vec::with_capacity(self.layout());
        for _ in 0..self.horizon {
            genome.push(self.sample_gene(GeneKind::BatteryAction, rng));
        }
        for _ in 0..self.horizon {
            genome.push(self.sample_gene(GeneKind::EvIndex, rng));
        }
        if self.has_appliance {
            genome.push(self.sample_gene(GeneKind::ApplianceHour, rng));
        }
        self.zero_locked_tail(&mut genome);
        genome
    }

    /// Force every EV gene in the locked tail back to zero. Idempotent and
    /// cheap enough to call after every mutation or crossover.
    pub fn zero_locked_tail(&self, genome: &mut [i32]) {
        let unlocked = self.ev_unlocked_count();
        for h in unlocked..self.horizon {
            genome[self.horizon + h] = 0;
        }
    }

    /// Split a genome into its three gene regions.
    pub fn split<'g>(&self, genome: &'g [i32]) -> (&'g [i32], &'g [i32], Option<i32>) {
        let battery_actions = &genome[0..self.horizon];
        let ev_indices = &genome[self.horizon..2 * self.horizon];
        let appliance_hour = if self.has_appliance {
            Some(genome[2 * self.horizon])
        } else {
            None
        };
        (battery_actions, ev_indices, appliance_hour)
    }

    /// Turn the raw `[-bound,+1]` battery actions into a 0/1 discharge array
    /// and a charge-intensity array normalized against its own peak.
    pub fn decode_battery(&self, battery_actions: &[i32]) -> (Vec<f64>, Vec<f64>) {
        let discharge: Vec<f64> = battery_actions
            .iter()
            .map(|&a| a.max(0) as f64)
            .collect();
        let raw_charge: Vec<f64> = battery_actions.iter().map(|&a| (-a).max(0) as f64).collect();
        let peak = raw_charge.iter().cloned().fold(0.0_f64, f64::max);
        let charge = if peak > 0.0 {
            raw_charge.iter().map(|v| v / peak).collect()
        } else {
            vec![0.0; battery_actions.len()]
        };
        (charge, discharge)
    }

    /// Map EV gene indices through the concrete current set `I`.
    pub fn decode_ev(&self, ev_indices: &[i32], currents: &[f64]) -> Vec<f64> {
        ev_indices
            .iter()
            .map(|&idx| currents[idx as usize])
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn codec() -> Codec {
        Codec::new(6, 2, 0, true, 5, 8).unwrap()
    }

    #[test]
    fn layout_accounts_for_appliance_gene() {
        assert_eq!(codec().layout(), 13);
        assert_eq!(Codec::new(6, 2, 0, false, 5, 8).unwrap().layout(), 12);
    }

    #[test]
    fn new_random_individual_respects_domains_and_locked_tail() {
        let c = codec();
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        for _ in 0..50 {
            let g = c.new_random_individual(&mut rng);
            let (battery, ev, appliance) = c.split(&g);
            assert!(battery.iter().all(|&a| (-5..=1).contains(&a)));
            assert!(ev.iter().all(|&i| (0..8).contains(&i)));
            assert!(appliance.unwrap() >= 0 && appliance.unwrap() <= 23);
            assert!(ev[c.ev_unlocked_count()..].iter().all(|&i| i == 0));
        }
    }

    #[test]
    fn all_nonnegative_actions_decode_to_zero_charge() {
        let c = codec();
        let actions = vec![0, 1, 0, 1, 0, 0];
        let (charge, discharge) = c.decode_battery(&actions);
        assert!(charge.iter().all(|&v| v == 0.0));
        assert_eq!(discharge, vec![0.0, 1.0, 0.0, 1.0, 0.0, 0.0]);
    }

    #[test]
    fn charge_is_normalized_against_peak() {
        let c = codec();
        let actions = vec![-5, -2, 0, 1, 0, 0];
        let (charge, _) = c.decode_battery(&actions);
        assert_eq!(charge[0], 1.0);
        assert_eq!(charge[1], 0.4);
        assert_eq!(charge[2], 0.0);
    }

    #[test]
    fn decode_ev_maps_indices_through_current_set() {
        let c = Codec::new(3, 0, 0, false, 5, 4).unwrap();
        let currents = vec![0.0, 6.0, 10.0, 16.0];
        assert_eq!(c.decode_ev(&[0, 2, 3], &currents), vec![0.0, 10.0, 16.0]);
    }
}
