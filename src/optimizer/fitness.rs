use crate::simulator::OutcomeRecord;

/// Constraint and pricing context the fitness function is bound to for the
/// whole run. Does not change between individuals.
#[derive(Debug, Clone, Copy)]
pub struct FitnessContext {
    pub ev_min_soc_percent: f64,
    pub battery_price_eur_per_wh: f64,
    pub penalty_weight: f64,
    pub infeasible_cost: f64,
    pub idle_shaping: f64,
    pub worst_case: bool,
}

/// The three numbers worth keeping per individual for diagnostics: monetary
/// balance, total conversion losses, EV SoC shortfall against its target.
pub type Diagnostics = (f64, f64, f64);

/// Map one outcome record to a scalar cost, following the contract: signed
/// balance, idle-discharge shaping, EV under-SoC penalty, residual battery
/// value, and a shortfall penalty — or the sentinel cost if the simulation
/// produced a non-finite result.
pub fn evaluate(
    outcome: &OutcomeRecord,
    battery_actions: &[i32],
    ev_currents_nonzero: &[bool],
    ev_final_soc_percent: f64,
    battery_energy_wh: f64,
    ctx: &FitnessContext,
) -> (f64, Option<Diagnostics>) {
    if !outcome.total_balance_eur.is_finite() || !outcome.total_losses_wh.is_finite() {
        return (ctx.infeasible_cost, None);
    }

    let sign = if ctx.worst_case { -1.0 } else { 1.0 };
    let mut fitness = sign * outcome.total_balance_eur;

    let idle_hours = battery_actions.iter().filter(|&&a| a == 0).count();
    fitness += ctx.idle_shaping * idle_hours as f64;

    let shortfall = (ctx.ev_min_soc_percent - ev_final_soc_percent).max(0.0);
    if shortfall > 0.0 {
        let ev_active_hours = ev_currents_nonzero.iter().filter(|&&nonzero| nonzero).count();
        fitness += ctx.penalty_weight * ev_active_hours as f64;
    }

    fitness -= battery_energy_wh * ctx.battery_price_eur_per_wh;
    fitness += (shortfall * ctx.penalty_weight).max(0.0);

    (
        fitness,
        Some((
            outcome.total_balance_eur,
            outcome.total_losses_wh,
            ctx.ev_min_soc_percent - ev_final_soc_percent,
        )),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> FitnessContext {
        FitnessContext {
            ev_min_soc_percent: 80.0,
            battery_price_eur_per_wh: 0.0002,
            penalty_weight: 10.0,
            infeasible_cost: 1e5,
            idle_shaping: 0.01,
            worst_case: false,
        }
    }

    fn outcome_with_balance(balance: f64) -> OutcomeRecord {
        let mut o = OutcomeRecord::with_horizon(4);
        o.total_balance_eur = balance;
        o.total_losses_wh = 10.0;
        o
    }

    #[test]
    fn non_finite_outcome_returns_sentinel_without_diagnostics() {
        let o = outcome_with_balance(f64::NAN);
        let (fitness, diag) = evaluate(&o, &[0, 0], &[false, false], 90.0, 1000.0, &ctx());
        assert_eq!(fitness, 1e5);
        assert!(diag.is_none());
    }

    #[test]
    fn met_soc_target_adds_no_shortfall_penalty() {
        let o = outcome_with_balance(5.0);
        let (fitness, diag) = evaluate(&o, &[0, 1], &[true, true], 90.0, 1000.0, &ctx());
        let (balance, losses, shortfall) = diag.unwrap();
        assert_eq!(balance, 5.0);
        assert_eq!(losses, 10.0);
        assert_eq!(shortfall, -10.0);
        let idle_term = 0.01 * 1.0;
        let residual = 1000.0 * 0.0002;
        assert!((fitness - (5.0 + idle_term - residual)).abs() < 1e-9);
    }

    #[test]
    fn unmet_soc_target_penalizes_nonzero_ev_hours() {
        let o = outcome_with_balance(5.0);
        let (fitness, _) = evaluate(&o, &[1, 1], &[true, false], 60.0, 0.0, &ctx());
        assert!(fitness > 5.0 + 10.0 * 10.0);
    }

    #[test]
    fn worst_case_flips_only_the_monetary_term() {
        let o = outcome_with_balance(5.0);
        let (normal, _) = evaluate(&o, &[0, 0], &[false, false], 90.0, 0.0, &ctx());
        let mut worst_ctx = ctx();
        worst_ctx.worst_case = true;
        let (worst, _) = evaluate(&o, &[0, 0], &[false, false], 90.0, 0.0, &worst_ctx);
        assert_eq!(normal + worst, 0.02 * 2.0);
    }
}
