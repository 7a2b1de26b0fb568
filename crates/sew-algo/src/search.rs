//! Tabu search driver.
//!
//! Owns the outer loop: greedy initial solution, neighbour selection under
//! tabu/aspiration rules, adaptive tenure, and iteration/wall-clock
//! termination. Moves are identified by their *signature*, the sorted list
//! of `(slot, from, to)` changes between two assignments, so a transition is
//! tabu regardless of which operator produced it.

use crate::evaluator::Evaluator;
use crate::neighbor::NeighborGenerator;
use rand::rngs::StdRng;
use rand::SeedableRng;
use sew_core::{Assignment, MoveKind, ProblemModel, Solution, StyleId};
use std::collections::{HashMap, VecDeque};
use std::time::{Duration, Instant};

/// Multiplier applied to the incumbent best when setting the evaluator's
/// prune ceiling.
const PRUNE_SLACK: f64 = 1.2;

/// Sorted slot-level changes between two assignments. Order-independent and
/// unique per transition.
pub type MoveSignature = Vec<(usize, Option<StyleId>, Option<StyleId>)>;

/// Compute the move signature between two assignments.
pub fn move_signature(from: &Assignment, to: &Assignment) -> MoveSignature {
    // `diff` walks slots in ascending order, so the result is already sorted.
    from.diff(to)
}

/// Tabu search configuration
#[derive(Debug, Clone)]
pub struct TabuConfig {
    /// Maximum number of iterations
    pub max_iter: usize,
    /// Starting tabu tenure (queue capacity)
    pub tabu_tenure: usize,
    /// Wall-clock budget; polled at iteration boundaries
    pub max_time: Duration,
    /// Tenure floor
    pub min_tenure: usize,
    /// Tenure cap
    pub max_tenure: usize,
    /// Non-improving iterations before tenure grows by 2
    pub increase_threshold: usize,
    /// Improving iterations before tenure shrinks by 1
    pub decrease_threshold: usize,
    /// Probability of emitting destroy-and-repair candidates per iteration
    pub destroy_probability: f64,
    /// RNG seed; the whole run is deterministic given the seed
    pub seed: u64,
}

impl Default for TabuConfig {
    fn default() -> Self {
        Self {
            max_iter: 1000,
            tabu_tenure: 10,
            max_time: Duration::from_secs(1200),
            min_tenure: 5,
            max_tenure: 30,
            increase_threshold: 50,
            decrease_threshold: 10,
            destroy_probability: 0.3,
            seed: 42,
        }
    }
}

/// Statistics collected over one search run
#[derive(Debug, Clone, Default)]
pub struct SearchStats {
    /// Iterations actually executed
    pub iterations: usize,
    /// Incumbent cost after each iteration (index 0 = initial solution)
    pub cost_history: Vec<f64>,
    /// Best-so-far cost after each iteration
    pub best_history: Vec<f64>,
    /// Accepted moves per operator
    pub accepted_moves: HashMap<MoveKind, usize>,
    pub elapsed: Duration,
}

impl SearchStats {
    /// Accepted-operator counts as sorted `(label, count)` pairs
    pub fn operator_counts(&self) -> Vec<(&'static str, usize)> {
        let mut counts: Vec<_> = self
            .accepted_moves
            .iter()
            .map(|(kind, n)| (kind.label(), *n))
            .collect();
        counts.sort();
        counts
    }
}

/// The tabu search driver
pub struct TabuSearch<'a> {
    config: TabuConfig,
    evaluator: Evaluator<'a>,
    neighbor_gen: NeighborGenerator<'a>,
    rng: StdRng,
    tenure: usize,
    tabu: VecDeque<MoveSignature>,
    no_improve: usize,
    consecutive_improve: usize,
}

impl<'a> TabuSearch<'a> {
    pub fn new(model: &'a ProblemModel, config: TabuConfig) -> Self {
        let rng = StdRng::seed_from_u64(config.seed);
        let tenure = config.tabu_tenure.clamp(config.min_tenure, config.max_tenure);
        Self {
            config,
            evaluator: Evaluator::new(model),
            neighbor_gen: NeighborGenerator::new(model),
            rng,
            tenure,
            tabu: VecDeque::new(),
            no_improve: 0,
            consecutive_improve: 0,
        }
    }

    /// Run the search to completion and return the best solution found,
    /// re-evaluated once so every derived field is current.
    pub fn run(&mut self) -> (Solution, SearchStats) {
        let start = Instant::now();
        let mut stats = SearchStats::default();

        let mut current = self.evaluator.initial_solution(&mut self.rng);
        let mut best = current.clone();
        let mut best_cost = best.total_cost;
        self.evaluator.set_prune_ceiling(prune_ceiling(best_cost));
        stats.cost_history.push(current.total_cost);
        stats.best_history.push(best_cost);

        for _ in 0..self.config.max_iter {
            if start.elapsed() >= self.config.max_time {
                break;
            }
            stats.iterations += 1;

            let mut neighbors = self.neighbor_gen.generate(
                &current,
                self.config.destroy_probability,
                &self.evaluator,
                &mut self.rng,
            );
            if neighbors.is_empty() {
                stats.cost_history.push(current.total_cost);
                stats.best_history.push(best_cost);
                continue;
            }
            neighbors.sort_by(|a, b| {
                a.total_cost
                    .partial_cmp(&b.total_cost)
                    .unwrap_or(std::cmp::Ordering::Equal)
            });

            let (index, signature) =
                self.select_candidate(&current.assignment, &neighbors, best_cost);
            let chosen = neighbors.swap_remove(index);
            self.push_tabu(signature);

            let improved_best = chosen.total_cost < best_cost;
            if improved_best {
                best = chosen.clone();
                best_cost = chosen.total_cost;
                self.evaluator.set_prune_ceiling(prune_ceiling(best_cost));
            }
            if let Some(kind) = chosen.move_kind {
                *stats.accepted_moves.entry(kind).or_insert(0) += 1;
            }
            current = chosen;

            stats.cost_history.push(current.total_cost);
            stats.best_history.push(best_cost);
            self.update_tenure(improved_best);
        }

        // Final re-evaluation so the returned solution's derived fields match
        // its assignment exactly.
        self.evaluator.set_prune_ceiling(f64::INFINITY);
        let move_kind = best.move_kind;
        let mut final_best = self.evaluator.evaluate(best.assignment, &mut self.rng);
        final_best.move_kind = move_kind;

        stats.elapsed = start.elapsed();
        (final_best, stats)
    }

    /// Walk the cost-sorted batch and pick the first candidate that either
    /// beats the best-ever cost (aspiration) or is not tabu. When everything
    /// is tabu and nothing aspirates, the cheapest candidate is forced.
    fn select_candidate(
        &self,
        current: &Assignment,
        sorted: &[Solution],
        best_cost: f64,
    ) -> (usize, MoveSignature) {
        for (index, neighbor) in sorted.iter().enumerate() {
            let signature = move_signature(current, &neighbor.assignment);
            let aspirates = neighbor.total_cost < best_cost;
            if aspirates || !self.tabu.contains(&signature) {
                return (index, signature);
            }
        }
        (0, move_signature(current, &sorted[0].assignment))
    }

    fn push_tabu(&mut self, signature: MoveSignature) {
        self.tabu.push_back(signature);
        while self.tabu.len() > self.tenure {
            self.tabu.pop_front();
        }
    }

    /// Adaptive tenure: long non-improving streaks grow the queue by 2 (up to
    /// the cap), improving streaks shrink it by 1 (down to the floor). The
    /// queue keeps its most recent entries on resize.
    fn update_tenure(&mut self, improved: bool) {
        if improved {
            self.consecutive_improve += 1;
            self.no_improve = 0;
            if self.consecutive_improve >= self.config.decrease_threshold {
                self.tenure = (self.tenure.saturating_sub(1)).max(self.config.min_tenure);
                self.shrink_to_tenure();
                self.consecutive_improve = 0;
            }
        } else {
            self.no_improve += 1;
            self.consecutive_improve = 0;
            if self.no_improve >= self.config.increase_threshold {
                self.tenure = (self.tenure + 2).min(self.config.max_tenure);
                self.no_improve = 0;
            }
        }
    }

    fn shrink_to_tenure(&mut self) {
        while self.tabu.len() > self.tenure {
            self.tabu.pop_front();
        }
    }

    #[cfg(test)]
    fn tenure(&self) -> usize {
        self.tenure
    }

    #[cfg(test)]
    fn tabu_queue(&self) -> &VecDeque<MoveSignature> {
        &self.tabu
    }
}

fn prune_ceiling(best_cost: f64) -> f64 {
    if best_cost.is_finite() {
        best_cost * PRUNE_SLACK
    } else {
        f64::INFINITY
    }
}
