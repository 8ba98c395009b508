use rand::seq::index::sample;
use rand::Rng;

use super::genome::{Codec, GeneKind};

/// Resample each gene independently with probability `rate`, staying within
/// its region's domain, then repair the EV locked tail.
pub fn mutate(genome: &mut [i32], codec: &Codec, rate: f64, rng: &mut impl Rng) {
    for h in 0..codec.horizon {
        if rng.gen_bool(rate) {
            genome[h] = codec.sample_gene(GeneKind::BatteryAction, rng);
        }
    }
    for h in 0..codec.horizon {
        if rng.gen_bool(rate) {
            genome[codec.horizon + h] = codec.sample_gene(GeneKind::EvIndex, rng);
        }
    }
    if codec.has_appliance && rng.gen_bool(rate) {
        let last = genome.len() - 1;
        genome[last] = codec.sample_gene(GeneKind::ApplianceHour, rng);
    }
    codec.zero_locked_tail(genome);
}

/// Two-point crossover over the flat genome. Gene regions have equal length
/// in both parents, so any cut point preserves per-position domains; the EV
/// locked tail is re-zeroed afterward as a cheap repair.
pub fn crossover_two_point(
    parent_a: &[i32],
    parent_b: &[i32],
    codec: &Codec,
    rng: &mut impl Rng,
) -> (Vec<i32>, Vec<i32>) {
    let len = parent_a.len();
    let mut cut_a = rng.gen_range(0..len);
    let mut cut_b = rng.gen_range(0..len);
    if cut_a > cut_b {
        std::mem::swap(&mut cut_a, &mut cut_b);
    }

    let mut child_a = parent_a.to_vec();
    let mut child_b = parent_b.to_vec();
    child_a[cut_a..cut_b].clone_from_slice(&parent_b[cut_a..cut_b]);
    child_b[cut_a..cut_b].clone_from_slice(&parent_a[cut_a..cut_b]);

    codec.zero_locked_tail(&mut child_a);
    codec.zero_locked_tail(&mut child_b);
    (child_a, child_b)
}

/// Tournament selection of the given size, minimizing fitness; returns the
/// index of the winner within `population`.
pub fn tournament_select(fitnesses: &[f64], tournament_size: usize, rng: &mut impl Rng) -> usize {
    let k = tournament_size.min(fitnesses.len());
    sample(rng, fitnesses.len(), k)
        .into_iter()
        .min_by(|&a, &b| fitnesses[a].total_cmp(&fitnesses[b]))
        .expect("tournament size is at least 1")
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn codec() -> Codec {
        Codec::new(8, 3, 0, true, 5, 8).unwrap()
    }

    #[test]
    fn mutation_keeps_genes_in_domain() {
        let c = codec();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let mut g = c.new_random_individual(&mut rng);
        for _ in 0..20 {
            mutate(&mut g, &c, 0.5, &mut rng);
            let (battery, ev, appliance) = c.split(&g);
            assert!(battery.iter().all(|&a| (-5..=1).contains(&a)));
            assert!(ev.iter().all(|&i| (0..8).contains(&i)));
            assert!(appliance.unwrap() <= 23);
            assert!(ev[c.ev_unlocked_count()..].iter().all(|&i| i == 0));
        }
    }

    #[test]
    fn crossover_preserves_length_and_locked_tail() {
        let c = codec();
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let a = c.new_random_individual(&mut rng);
        let b = c.new_random_individual(&mut rng);
        let (child_a, child_b) = crossover_two_point(&a, &b, &c, &mut rng);
        assert_eq!(child_a.len(), a.len());
        assert_eq!(child_b.len(), b.len());
        let (_, ev_a, _) = c.split(&child_a);
        assert!(ev_a[c.ev_unlocked_count()..].iter().all(|&i| i == 0));
    }

    #[test]
    fn full_pool_tournament_always_finds_the_global_minimum() {
        let fitnesses = vec![10.0, 1.0, 100.0, 5.0];
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        for _ in 0..200 {
            assert_eq!(tournament_select(&fitnesses, 4, &mut rng), 1);
        }
    }
}
