//! TSP Optimizer Library
//!
//! Solvers for the symmetric Traveling Salesman Problem over planar or
//! geographic (latitude/longitude) points.
//!
//! # Features
//!
//! - TSPLIB-like dataset loading with Euclidean or great-circle distances
//! - Nearest Neighbor construction (single and multi-start) and 2-opt
//! - Exact brute force search for small instances
//! - Genetic Algorithm and Simulated Annealing with seedable randomness
//! - A solve notification hook for external progress displays
//! - Solution files, verification and benchmarking tools
//!
//! # Example
//!
//! ```no_run
//! use tsp_optimizer::engine::TspEngine;
//! use tsp_optimizer::heuristics::genetic::GaConfig;
//!
//! let mut engine = TspEngine::from_file("att48.tsp")?;
//! engine.solve_nearest_neighbor()?;
//! println!("Nearest neighbor: {:.2}", engine.solution_distance());
//!
//! engine.solve_genetic(GaConfig::default())?;
//! engine.write_solution("att48.sol", None)?;
//! # Ok::<(), tsp_optimizer::Error>(())
//! ```

pub mod benchmark;
pub mod config;
pub mod distance;
pub mod engine;
pub mod error;
pub mod exact;
pub mod heuristics;
pub mod instance;
pub mod notifier;
pub mod route;
pub mod solution;
pub mod solver;

pub use engine::TspEngine;
pub use error::{Error, Result};
pub use instance::{Point, TspInstance};
pub use route::Route;
pub use solution::Solution;
pub use solver::TourSolver;
