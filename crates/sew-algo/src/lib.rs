//! # sew-algo: Simulation and neighbourhood search for line scheduling
//!
//! The two coupled engines behind the weekly production scheduler:
//!
//! - [`Evaluator`]: the deterministic per-day production simulator. Given an
//!   assignment matrix it repairs capability and material violations, runs
//!   fabric receipts, learning-curve efficiency, pro-rata production,
//!   shipments and backlog, and returns a fully costed [`sew_core::Solution`].
//! - [`NeighborGenerator`]: produces evaluated candidate batches from local
//!   moves (swap, block/single reassignment) and destroy-and-repair
//!   operators.
//! - [`TabuSearch`]: the outer loop: aspiration, adaptive tenure, and
//!   iteration/wall-clock termination.
//!
//! Everything is deterministic given a [`TabuConfig::seed`]; with the
//! `parallel` feature neighbour batches are evaluated on rayon workers
//! without changing any result.
//!
//! ## Example
//!
//! ```ignore
//! use sew_algo::{TabuConfig, TabuSearch};
//!
//! let (best, stats) = TabuSearch::new(&model, TabuConfig::default()).run();
//! println!("{}", best.summary(&model));
//! println!("iterations: {}", stats.iterations);
//! ```

pub mod evaluator;
pub mod neighbor;
pub mod search;
pub mod test_utils;

pub use evaluator::{Evaluator, FABRIC_EPS};
pub use neighbor::NeighborGenerator;
pub use search::{move_signature, MoveSignature, SearchStats, TabuConfig, TabuSearch};
