//! The production simulator.
//!
//! Given an assignment matrix, [`Evaluator::evaluate`] runs the per-day state
//! machine (fabric receipts, line decisions under the material-availability
//! rule, pro-rata production, shipments and backlog) and returns a fully
//! populated [`Solution`] with its cost breakdown.
//!
//! The evaluator is pure: the same model, assignment and RNG seed produce a
//! bit-identical solution, so neighbour batches can be evaluated on worker
//! threads. All simulation state is per-call scratch.
//!
//! Fabric shortage is not an error. A line that cannot run its assigned style
//! either waits (a *valid bridge*: same style yesterday and tomorrow) or is
//! switched to a style with fabric on hand; the resulting zero production and
//! late cost are the economic signal the search optimises against. The
//! returned solution therefore carries the *realised* assignment, which may
//! differ from the requested one.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::Rng;
use sew_core::{Assignment, ChangeEvent, LineId, MoveKind, ProblemModel, Solution, StyleId};

/// Inventory below this is treated as out of fabric.
pub const FABRIC_EPS: f64 = 1e-6;

/// Time discount applied to day-`t` costs.
pub(crate) fn discount(alpha: f64, t: usize) -> f64 {
    1.0 / (1.0 + alpha).powi(t as i32)
}

struct LineState {
    current: Option<StyleId>,
    exp: f64,
    /// Experience day earned today, credited tomorrow
    pending_exp: f64,
}

/// Simulator and repair engine for assignment matrices.
#[derive(Debug, Clone)]
pub struct Evaluator<'a> {
    model: &'a ProblemModel,
    prune_ceiling: f64,
}

impl<'a> Evaluator<'a> {
    pub fn new(model: &'a ProblemModel) -> Self {
        Self {
            model,
            prune_ceiling: f64::INFINITY,
        }
    }

    pub fn model(&self) -> &ProblemModel {
        self.model
    }

    /// Cost cutoff above which an in-progress evaluation is abandoned with
    /// `total_cost = +∞`.
    pub fn set_prune_ceiling(&mut self, ceiling: f64) {
        self.prune_ceiling = ceiling;
    }

    pub fn prune_ceiling(&self) -> f64 {
        self.prune_ceiling
    }

    /// Greedy seed: each line runs the allowed style with the largest total
    /// demand over the horizon (ties to the smallest style id) on every day.
    pub fn initial_solution(&self, rng: &mut StdRng) -> Solution {
        let model = self.model;
        let mut assignment = Assignment::unassigned(model.num_lines(), model.horizon());
        for l in model.lines() {
            let allowed = model.allowed(l);
            let mut choice = allowed[0];
            let mut best_demand = model.total_demand(choice);
            for &s in &allowed[1..] {
                let d = model.total_demand(s);
                if d > best_demand {
                    choice = s;
                    best_demand = d;
                }
            }
            for t in model.days() {
                assignment.set(l, t, Some(choice));
            }
        }
        let mut solution = self.evaluate(assignment, rng);
        solution.move_kind = Some(MoveKind::Initial);
        solution
    }

    /// Run the per-day simulation over `assignment` and return the evaluated
    /// schedule. Capability violations are repaired with a random allowed
    /// style up front; unassigned slots are filled inside the day loop by the
    /// material-availability rule, so repair decisions see live inventories.
    pub fn evaluate(&self, assignment: Assignment, rng: &mut StdRng) -> Solution {
        let model = self.model;
        let horizon = model.horizon();
        let num_styles = model.num_styles();

        let mut sol = Solution::shell(assignment, num_styles);

        // Capability repair pre-pass.
        for l in model.lines() {
            for t in 1..=horizon {
                if let Some(s) = sol.assignment.get(l, t) {
                    if !model.is_enabled(l, s) {
                        let replacement = self.random_allowed(l, rng);
                        sol.assignment.set(l, t, Some(replacement));
                    }
                }
            }
        }

        // Per-evaluation scratch state.
        let mut inv_fab: Vec<f64> = model.styles().map(|s| model.i0_fabric(s)).collect();
        let mut inv_prod: Vec<f64> = model.styles().map(|s| model.i0_product(s)).collect();
        let mut backlog: Vec<f64> = model.styles().map(|s| model.backlog0(s)).collect();
        let mut states: Vec<LineState> = model
            .lines()
            .map(|l| LineState {
                current: model.y0(l),
                exp: model.exp0(l),
                pending_exp: 0.0,
            })
            .collect();
        // Production candidates per style, reused across days.
        let mut candidates: Vec<Vec<(LineId, f64)>> = vec![Vec::new(); num_styles];

        let mut total_setup = 0.0;
        let mut total_late = 0.0;
        let mut total_exp = 0.0;

        for t in 1..=horizon {
            if total_setup + total_late - total_exp > self.prune_ceiling {
                sol.total_setup = total_setup;
                sol.total_late = total_late;
                sol.total_exp = total_exp;
                sol.total_cost = f64::INFINITY;
                return sol;
            }
            let disc = discount(model.discount_alpha(), t);

            // Phase 1: fabric receipts land after their processing lead.
            for s in model.styles() {
                let lead = model.fabric_lead(s);
                if t > lead {
                    inv_fab[s.index()] += model.fabric_in(s, t - lead);
                }
            }

            // Phase 2: line decisions.
            for l in model.lines() {
                let li = l.index();
                let (current, carried_exp) = {
                    let st = &mut states[li];
                    st.exp += st.pending_exp;
                    st.pending_exp = 0.0;
                    (st.current, st.exp)
                };
                let mut exp = carried_exp;

                let proposed = sol.assignment.get(l, t);
                let final_style =
                    self.resolve_style(l, t, proposed, current, &mut sol.assignment, &inv_fab, rng);

                if current != Some(final_style) {
                    sol.changes.push(ChangeEvent {
                        line: l,
                        from: current,
                        to: final_style,
                        day: t,
                    });
                    total_setup += model.setup_cost() * disc;
                    let keeps_experience =
                        current.map_or(false, |c| model.same_family(c, final_style));
                    if !keeps_experience {
                        exp = model.lexp0(l, final_style);
                    }
                }

                let slot = sol.assignment.slot(l, t);
                sol.experience[slot] = exp;
                let eff = model.curve().eff(exp);
                sol.efficiency[slot] = eff;
                total_exp += exp * model.exp_reward();

                if model.hours(l, t) > 0.0 && model.sam(final_style) > 0.0 {
                    let max_p = model.base_capacity_minutes(l, t) * eff / model.sam(final_style);
                    candidates[final_style.index()].push((l, max_p));
                }

                let st = &mut states[li];
                st.exp = exp;
                st.current = Some(final_style);
            }

            // Phase 3: realise production, splitting fabric pro rata by capacity.
            for s in model.styles() {
                let si = s.index();
                if candidates[si].is_empty() {
                    continue;
                }
                let total_cap: f64 = candidates[si].iter().map(|(_, p)| p).sum();
                let actual = total_cap.min(inv_fab[si]);
                sol.produced[si * horizon + (t - 1)] = actual;
                inv_fab[si] -= actual;
                if total_cap > 0.0 {
                    for &(l, max_p) in &candidates[si] {
                        let share = actual * max_p / total_cap;
                        let slot = sol.assignment.slot(l, t);
                        sol.production[slot] = share;
                        // An experience day accrues only when the line ran at
                        // least half of its capacity.
                        if share >= 0.5 * max_p {
                            states[l.index()].pending_exp = 1.0;
                        }
                    }
                }
                candidates[si].clear();
            }

            // Phase 4: shipments and backlog.
            for s in model.styles() {
                let si = s.index();
                let lead = model.finish_lead(s);
                let finished = if t > lead {
                    sol.produced[si * horizon + (t - lead - 1)]
                } else {
                    0.0
                };
                inv_prod[si] += finished;

                let needed = backlog[si] + model.demand(s, t);
                let ship = inv_prod[si].min(needed);
                sol.shipment[si * horizon + (t - 1)] = ship;
                inv_prod[si] -= ship;
                backlog[si] = needed - ship;

                if backlog[si] > FABRIC_EPS {
                    total_late += backlog[si] * model.late_penalty(s) * disc;
                }
            }
        }

        sol.final_backlog = backlog;
        sol.total_setup = total_setup;
        sol.total_late = total_late;
        sol.total_exp = total_exp;
        sol.total_cost = total_setup + total_late - total_exp;
        sol
    }

    /// Material-availability rule for one slot. May rewrite `assignment` so
    /// the look-ahead of later days sees the mutation.
    fn resolve_style(
        &self,
        l: LineId,
        t: usize,
        proposed: Option<StyleId>,
        current: Option<StyleId>,
        assignment: &mut Assignment,
        inv_fab: &[f64],
        rng: &mut StdRng,
    ) -> StyleId {
        let model = self.model;
        match proposed {
            Some(p) => {
                if inv_fab[p.index()] > FABRIC_EPS {
                    return p;
                }
                // Valid bridge: same style yesterday and tomorrow, so the
                // line waits for fabric without a changeover.
                let next_same = t < model.horizon() && assignment.get(l, t + 1) == Some(p);
                if current == Some(p) && next_same {
                    return p;
                }
                // Must switch away (covers the trailing-zero case too).
                let chosen = self
                    .fallback_with_fabric(l, current, inv_fab, rng)
                    .unwrap_or(match current {
                        Some(c) if model.is_enabled(l, c) => c,
                        _ => p,
                    });
                assignment.set(l, t, Some(chosen));
                chosen
            }
            None => {
                // Destroyed slot: repair from the priority pool.
                let chosen = self
                    .fallback_with_fabric(l, current, inv_fab, rng)
                    .or(current.filter(|&c| model.is_enabled(l, c)))
                    .unwrap_or_else(|| self.random_allowed(l, rng));
                assignment.set(l, t, Some(chosen));
                chosen
            }
        }
    }

    /// Priority pool shared by switch and repair: keep the current style if
    /// its fabric is on hand, otherwise any allowed style with fabric
    /// (shuffled so repeated repairs spread across styles).
    fn fallback_with_fabric(
        &self,
        l: LineId,
        current: Option<StyleId>,
        inv_fab: &[f64],
        rng: &mut StdRng,
    ) -> Option<StyleId> {
        let model = self.model;
        if let Some(c) = current {
            if model.is_enabled(l, c) && inv_fab[c.index()] > FABRIC_EPS {
                return Some(c);
            }
        }
        let mut pool: Vec<StyleId> = model.allowed(l).to_vec();
        pool.shuffle(rng);
        pool.into_iter().find(|s| inv_fab[s.index()] > FABRIC_EPS)
    }

    pub(crate) fn random_allowed(&self, l: LineId, rng: &mut StdRng) -> StyleId {
        let pool = self.model.allowed(l);
        pool[rng.gen_range(0..pool.len())]
    }
}
