//! Heuristics module for the TSP.
//!
//! This module exports the construction heuristics, the 2-opt local search
//! and the two metaheuristics (genetic algorithm, simulated annealing).

pub mod annealing;
pub mod construction;
pub mod genetic;
pub mod local_search;

pub use annealing::*;
pub use construction::*;
pub use genetic::*;
pub use local_search::*;
