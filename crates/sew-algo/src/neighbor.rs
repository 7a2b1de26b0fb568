//! Neighbourhood generation.
//!
//! Stateless: given a base solution, produces a batch of already-evaluated
//! candidates. Two families are emitted: cheap local moves on a single line
//! (always) and destroy-and-repair moves that blank 5–20 % of the slots and
//! let the evaluator's material-availability rule refill them (with the
//! configured probability). The base solution is never mutated.
//!
//! With the `parallel` feature the batch is evaluated on rayon workers; each
//! candidate gets its own seed drawn up front, so the result is identical to
//! the serial path.

use crate::evaluator::Evaluator;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
#[cfg(feature = "parallel")]
use rayon::prelude::*;
use sew_core::{Assignment, LineId, MoveKind, ProblemModel, Solution};

/// Fraction bounds of the slot count a destroy operator may blank.
const DESTROY_MIN_FRACTION: f64 = 0.05;
const DESTROY_MAX_FRACTION: f64 = 0.20;

/// Produces evaluated neighbour batches from a base solution.
#[derive(Debug, Clone)]
pub struct NeighborGenerator<'a> {
    model: &'a ProblemModel,
}

impl<'a> NeighborGenerator<'a> {
    pub fn new(model: &'a ProblemModel) -> Self {
        Self { model }
    }

    /// Generate a batch of evaluated candidates around `base`.
    ///
    /// `destroy_probability` gates the destroy-and-repair family; local moves
    /// are always produced (roughly `max(2·L, 10)` attempts, attempts that
    /// change nothing are dropped).
    pub fn generate(
        &self,
        base: &Solution,
        destroy_probability: f64,
        evaluator: &Evaluator<'_>,
        rng: &mut StdRng,
    ) -> Vec<Solution> {
        let mut candidates: Vec<(Assignment, MoveKind)> = Vec::new();

        let attempts = (2 * self.model.num_lines()).max(10);
        for _ in 0..attempts {
            if let Some(candidate) = self.local_move(&base.assignment, rng) {
                candidates.push(candidate);
            }
        }

        if rng.gen::<f64>() < destroy_probability {
            candidates.push(self.random_destroy(&base.assignment, rng));
            candidates.push(self.worst_setup_destroy(&base.assignment, rng));
            candidates.push(self.zone_destroy(&base.assignment, rng));
        }

        // Seeds are drawn before evaluation so the parallel and serial paths
        // produce the same batch.
        let seeded: Vec<(Assignment, MoveKind, u64)> = candidates
            .into_iter()
            .map(|(a, kind)| {
                let seed = rng.gen::<u64>();
                (a, kind, seed)
            })
            .collect();

        let evaluate_one = |(assignment, kind, seed): (Assignment, MoveKind, u64)| {
            let mut candidate_rng = StdRng::seed_from_u64(seed);
            let mut solution = evaluator.evaluate(assignment, &mut candidate_rng);
            solution.move_kind = Some(kind);
            solution
        };

        #[cfg(feature = "parallel")]
        {
            seeded.into_par_iter().map(evaluate_one).collect()
        }
        #[cfg(not(feature = "parallel"))]
        {
            seeded.into_iter().map(evaluate_one).collect()
        }
    }

    // =====================================================================
    // Local moves
    // =====================================================================

    fn local_move(&self, base: &Assignment, rng: &mut StdRng) -> Option<(Assignment, MoveKind)> {
        let horizon = self.model.horizon();
        let line = self.random_line(rng);

        match rng.gen_range(0..3u8) {
            0 => self.swap(base, line, rng),
            1 if horizon > 5 => self.reassign_block(base, line, rng),
            _ => self.reassign_single(base, line, rng),
        }
    }

    fn swap(
        &self,
        base: &Assignment,
        line: LineId,
        rng: &mut StdRng,
    ) -> Option<(Assignment, MoveKind)> {
        let horizon = self.model.horizon();
        if horizon < 2 {
            return None;
        }
        let t1 = rng.gen_range(1..=horizon);
        let mut t2 = rng.gen_range(1..=horizon - 1);
        if t2 >= t1 {
            t2 += 1;
        }
        let a = base.get(line, t1);
        let b = base.get(line, t2);
        if a == b {
            return None;
        }
        let mut next = base.clone();
        next.set(line, t1, b);
        next.set(line, t2, a);
        Some((next, MoveKind::Swap))
    }

    fn reassign_block(
        &self,
        base: &Assignment,
        line: LineId,
        rng: &mut StdRng,
    ) -> Option<(Assignment, MoveKind)> {
        let horizon = self.model.horizon();
        let max_block = (horizon / 4).max(2);
        let block = rng.gen_range(2..=max_block);
        let start = rng.gen_range(1..=horizon - block + 1);
        let style = self.random_style(line, rng);

        let mut next = base.clone();
        let mut changed = false;
        for t in start..start + block {
            if next.get(line, t) != Some(style) {
                next.set(line, t, Some(style));
                changed = true;
            }
        }
        changed.then_some((next, MoveKind::ReassignBlock))
    }

    fn reassign_single(
        &self,
        base: &Assignment,
        line: LineId,
        rng: &mut StdRng,
    ) -> Option<(Assignment, MoveKind)> {
        let t = rng.gen_range(1..=self.model.horizon());
        let style = self.random_style(line, rng);
        if base.get(line, t) == Some(style) {
            return None;
        }
        let mut next = base.clone();
        next.set(line, t, Some(style));
        Some((next, MoveKind::ReassignSingle))
    }

    // =====================================================================
    // Destroy operators
    // =====================================================================

    fn destroy_quota(&self, rng: &mut StdRng) -> usize {
        let slots = self.model.num_lines() * self.model.horizon();
        let fraction = rng.gen_range(DESTROY_MIN_FRACTION..=DESTROY_MAX_FRACTION);
        ((slots as f64 * fraction).round() as usize).clamp(1, slots)
    }

    fn random_destroy(&self, base: &Assignment, rng: &mut StdRng) -> (Assignment, MoveKind) {
        let quota = self.destroy_quota(rng);
        let mut slots: Vec<usize> = (0..base.slots().len()).collect();
        slots.shuffle(rng);

        let mut next = base.clone();
        for &slot in slots.iter().take(quota) {
            self.blank_slot(&mut next, slot);
        }
        (next, MoveKind::RandomDestroy)
    }

    /// Prefer slots that incur a changeover from the previous day, padding
    /// with random slots when there are fewer than the quota.
    fn worst_setup_destroy(&self, base: &Assignment, rng: &mut StdRng) -> (Assignment, MoveKind) {
        let quota = self.destroy_quota(rng);
        let horizon = self.model.horizon();

        let mut setup_slots = Vec::new();
        let mut other_slots = Vec::new();
        for l in self.model.lines() {
            for t in 1..=horizon {
                let slot = base.slot(l, t);
                if t >= 2 && base.get(l, t - 1) != base.get(l, t) {
                    setup_slots.push(slot);
                } else {
                    other_slots.push(slot);
                }
            }
        }
        setup_slots.shuffle(rng);
        other_slots.shuffle(rng);

        let mut next = base.clone();
        let mut blanked = 0;
        for &slot in setup_slots.iter().chain(other_slots.iter()) {
            if blanked >= quota {
                break;
            }
            self.blank_slot(&mut next, slot);
            blanked += 1;
        }
        (next, MoveKind::WorstSetupDestroy)
    }

    /// Blank a contiguous window around a random seed slot, spilling onto one
    /// neighbour line when the seed line cannot satisfy the quota.
    fn zone_destroy(&self, base: &Assignment, rng: &mut StdRng) -> (Assignment, MoveKind) {
        let quota = self.destroy_quota(rng);
        let horizon = self.model.horizon();
        let num_lines = self.model.num_lines();

        let seed_line = self.random_line(rng);
        let seed_day = rng.gen_range(1..=horizon);

        let mut next = base.clone();
        let mut blanked = 0;

        // Forward from the seed, then backward, then the neighbour line.
        for t in seed_day..=horizon {
            if blanked >= quota {
                break;
            }
            next.set(seed_line, t, None);
            blanked += 1;
        }
        for t in (1..seed_day).rev() {
            if blanked >= quota {
                break;
            }
            next.set(seed_line, t, None);
            blanked += 1;
        }
        if blanked < quota && num_lines > 1 {
            let neighbour = if seed_line.index() + 1 < num_lines {
                LineId::new((seed_line.index() + 1) as u16)
            } else {
                LineId::new((seed_line.index() - 1) as u16)
            };
            for t in seed_day..=horizon {
                if blanked >= quota {
                    break;
                }
                next.set(neighbour, t, None);
                blanked += 1;
            }
        }
        (next, MoveKind::ZoneDestroy)
    }

    // =====================================================================
    // Helpers
    // =====================================================================

    fn blank_slot(&self, assignment: &mut Assignment, slot: usize) {
        let horizon = assignment.horizon();
        let line = LineId::new((slot / horizon) as u16);
        let t = slot % horizon + 1;
        assignment.set(line, t, None);
    }

    fn random_line(&self, rng: &mut StdRng) -> LineId {
        LineId::new(rng.gen_range(0..self.model.num_lines()) as u16)
    }

    fn random_style(&self, line: LineId, rng: &mut StdRng) -> sew_core::StyleId {
        let pool = self.model.allowed(line);
        pool[rng.gen_range(0..pool.len())]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::ModelFixture;
    use sew_core::ProblemModel;

    fn model() -> ProblemModel {
        ModelFixture::new(8)
            .style("A", 10.0, 0, 0)
            .style("B", 12.0, 0, 0)
            .style("C", 9.0, 0, 0)
            .line("L1", 10, 0.0)
            .line("L2", 8, 0.0)
            .order("A", 400.0, 4, 1)
            .order("B", 300.0, 8, 2)
            .build()
    }

    fn rng() -> StdRng {
        StdRng::seed_from_u64(11)
    }

    #[test]
    fn batch_is_generated_and_base_untouched() {
        let m = model();
        let eval = Evaluator::new(&m);
        let generator = NeighborGenerator::new(&m);
        let mut r = rng();

        let base = eval.initial_solution(&mut r);
        let snapshot = base.assignment.clone();
        let batch = generator.generate(&base, 1.0, &eval, &mut r);

        assert!(!batch.is_empty());
        assert_eq!(base.assignment, snapshot);
        for candidate in &batch {
            assert!(candidate.assignment.is_fully_assigned());
            assert!(candidate.move_kind.is_some());
        }
    }

    #[test]
    fn destroy_moves_present_when_gate_fires() {
        let m = model();
        let eval = Evaluator::new(&m);
        let generator = NeighborGenerator::new(&m);
        let mut r = rng();

        let base = eval.initial_solution(&mut r);
        let batch = generator.generate(&base, 1.0, &eval, &mut r);

        for kind in [
            MoveKind::RandomDestroy,
            MoveKind::WorstSetupDestroy,
            MoveKind::ZoneDestroy,
        ] {
            assert!(
                batch.iter().any(|s| s.move_kind == Some(kind)),
                "missing {:?}",
                kind
            );
        }
    }

    #[test]
    fn no_destroy_moves_when_gate_closed() {
        let m = model();
        let eval = Evaluator::new(&m);
        let generator = NeighborGenerator::new(&m);
        let mut r = rng();

        let base = eval.initial_solution(&mut r);
        let batch = generator.generate(&base, 0.0, &eval, &mut r);

        assert!(batch.iter().all(|s| matches!(
            s.move_kind,
            Some(MoveKind::Swap | MoveKind::ReassignBlock | MoveKind::ReassignSingle)
        )));
    }

    #[test]
    fn generation_is_deterministic_for_a_seed() {
        let m = model();
        let eval = Evaluator::new(&m);
        let generator = NeighborGenerator::new(&m);

        let run = || {
            let mut r = StdRng::seed_from_u64(123);
            let base = eval.initial_solution(&mut r);
            generator
                .generate(&base, 0.5, &eval, &mut r)
                .iter()
                .map(|s| s.total_cost)
                .collect::<Vec<_>>()
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn candidates_respect_capability() {
        let m = ModelFixture::new(8)
            .style("A", 10.0, 0, 0)
            .style("B", 12.0, 0, 0)
            .line("L1", 10, 0.0)
            .line("L2", 8, 0.0)
            .disable("L2", "B")
            .order("A", 100.0, 4, 1)
            .build();
        let eval = Evaluator::new(&m);
        let generator = NeighborGenerator::new(&m);
        let mut r = rng();

        let base = eval.initial_solution(&mut r);
        let batch = generator.generate(&base, 1.0, &eval, &mut r);

        for candidate in &batch {
            for l in m.lines() {
                for t in m.days() {
                    let s = candidate.assignment.get(l, t).unwrap();
                    assert!(m.is_enabled(l, s));
                }
            }
        }
    }

    #[test]
    fn destroy_quota_within_bounds() {
        let m = model();
        let generator = NeighborGenerator::new(&m);
        let slots = m.num_lines() * m.horizon();
        let mut r = rng();
        for _ in 0..100 {
            let q = generator.destroy_quota(&mut r);
            assert!(q >= 1);
            assert!(q as f64 <= (slots as f64 * DESTROY_MAX_FRACTION).round());
        }
    }
}
