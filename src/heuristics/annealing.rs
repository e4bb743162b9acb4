//! Simulated Annealing over swap and segment-reversal moves.
//!
//! Accepts worse tours with probability `exp(-delta / T)` while the
//! temperature decays geometrically toward the stopping threshold. Unless
//! configured, the starting temperature and the moves per temperature are
//! derived from the instance, so the schedule fits the scale of its edges.

use crate::error::{Error, Result};
use crate::heuristics::construction::NearestNeighbor;
use crate::instance::TspInstance;
use crate::route::Route;
use crate::solution::Solution;
use crate::solver::{report, TourSolver};
use log::{debug, info};
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// Random moves sampled per point to derive the starting temperature
const TEMPERATURE_SAMPLES_PER_POINT: usize = 10;

/// Tour the annealing starts from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SaInit {
    /// Points in dataset order
    Identity,
    /// Greedy tour from the first point
    NearestNeighbor,
}

/// Neighborhood explored by the annealing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SaMove {
    /// Exchange the points at two positions
    Swap,
    /// Reverse the segment between two positions (a 2-opt move)
    Reversal,
    /// Swap or reversal with equal probability
    Mixed,
}

/// Simulated Annealing configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SaConfig {
    /// Starting temperature, > 0. `None` uses the mean absolute cost change
    /// of random moves on the starting tour.
    pub initial_temperature: Option<f64>,
    /// The search stops once the temperature is at or below this, in (0, initial)
    pub stopping_temperature: f64,
    /// Geometric cooling factor in (0, 1)
    pub cooling_rate: f64,
    /// Moves tried before each cooling step. `None` uses the point count.
    pub iterations_per_temperature: Option<usize>,
    pub moves: SaMove,
    pub initial_route: SaInit,
    /// Random seed
    pub seed: u64,
}

impl Default for SaConfig {
    fn default() -> Self {
        SaConfig {
            initial_temperature: None,
            stopping_temperature: 1e-3,
            cooling_rate: 0.9995,
            iterations_per_temperature: None,
            moves: SaMove::Mixed,
            initial_route: SaInit::NearestNeighbor,
            seed: 42,
        }
    }
}

impl SaConfig {
    pub fn with_temperatures(mut self, initial: f64, stopping: f64) -> Self {
        self.initial_temperature = Some(initial);
        self.stopping_temperature = stopping;
        self
    }

    pub fn with_cooling_rate(mut self, cooling_rate: f64) -> Self {
        self.cooling_rate = cooling_rate;
        self
    }

    pub fn with_iterations_per_temperature(mut self, n: usize) -> Self {
        self.iterations_per_temperature = Some(n);
        self
    }

    pub fn with_moves(mut self, moves: SaMove) -> Self {
        self.moves = moves;
        self
    }

    pub fn with_initial_route(mut self, initial_route: SaInit) -> Self {
        self.initial_route = initial_route;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.stopping_temperature > 0.0) || !self.stopping_temperature.is_finite() {
            return Err(Error::validation(
                "stopping_temperature",
                format!("must be positive, got {}", self.stopping_temperature),
            ));
        }
        if let Some(initial) = self.initial_temperature {
            if !(initial > 0.0) || !initial.is_finite() {
                return Err(Error::validation(
                    "initial_temperature",
                    format!("must be positive, got {}", initial),
                ));
            }
            if self.stopping_temperature >= initial {
                return Err(Error::validation(
                    "stopping_temperature",
                    format!(
                        "{} must be below the initial temperature {}",
                        self.stopping_temperature, initial
                    ),
                ));
            }
        }
        if !(self.cooling_rate > 0.0 && self.cooling_rate < 1.0) {
            return Err(Error::validation(
                "cooling_rate",
                format!("must be in (0, 1), got {}", self.cooling_rate),
            ));
        }
        if self.iterations_per_temperature == Some(0) {
            return Err(Error::validation(
                "iterations_per_temperature",
                "must be a positive integer",
            ));
        }
        Ok(())
    }

    /// Number of cooling steps from `initial_temperature` down to the stopping temperature
    pub fn cooling_steps(&self, initial_temperature: f64) -> usize {
        if initial_temperature <= self.stopping_temperature {
            return 0;
        }
        let ratio = self.stopping_temperature / initial_temperature;
        (ratio.ln() / self.cooling_rate.ln()).ceil().max(0.0) as usize
    }
}

/// Simulated Annealing solver
pub struct SimulatedAnnealing<R: Rng = ChaCha8Rng> {
    config: SaConfig,
    rng: R,
    iterations: usize,
    accepted: usize,
}

impl SimulatedAnnealing<ChaCha8Rng> {
    /// Validate `config` and seed the generator from `config.seed`.
    pub fn new(config: SaConfig) -> Result<Self> {
        let rng = ChaCha8Rng::seed_from_u64(config.seed);
        Self::with_rng(config, rng)
    }
}

impl<R: Rng> SimulatedAnnealing<R> {
    pub fn with_rng(config: SaConfig, rng: R) -> Result<Self> {
        config.validate()?;
        Ok(SimulatedAnnealing {
            config,
            rng,
            iterations: 0,
            accepted: 0,
        })
    }

    pub fn config(&self) -> &SaConfig {
        &self.config
    }

    /// Neighbors evaluated by the last run
    pub fn iterations(&self) -> usize {
        self.iterations
    }

    /// Neighbors accepted by the last run
    pub fn accepted(&self) -> usize {
        self.accepted
    }

    fn initial_route(&self, instance: &TspInstance) -> Result<Route> {
        match self.config.initial_route {
            SaInit::Identity => Ok(Route::identity(instance.dimension())),
            SaInit::NearestNeighbor => NearestNeighbor::build_tour(instance, 0),
        }
    }

    /// Two distinct positions of a tour of `n >= 2` points, in ascending order
    fn pick_positions(&mut self, n: usize) -> (usize, usize) {
        let i = self.rng.gen_range(0..n);
        let mut j = self.rng.gen_range(0..n - 1);
        if j >= i {
            j += 1;
        }
        (i.min(j), i.max(j))
    }

    /// Draw a neighbor of `route`: its kind, its positions and its cost change.
    fn propose(&mut self, route: &Route, instance: &TspInstance) -> (SaMove, usize, usize, f64) {
        let kind = match self.config.moves {
            SaMove::Mixed => {
                if self.rng.gen_bool(0.5) {
                    SaMove::Reversal
                } else {
                    SaMove::Swap
                }
            }
            kind => kind,
        };
        let (i, j) = self.pick_positions(route.len());
        let matrix = instance.cost_matrix();
        let delta = match kind {
            SaMove::Reversal => route.reverse_delta(matrix, i, j),
            _ => route.swap_delta(matrix, i, j),
        };
        (kind, i, j, delta)
    }

    /// Mean absolute cost change of random moves on `route`
    fn sample_temperature(&mut self, route: &Route, instance: &TspInstance) -> f64 {
        let samples = TEMPERATURE_SAMPLES_PER_POINT * route.len();
        let total: f64 = (0..samples)
            .map(|_| self.propose(route, instance).3.abs())
            .sum();
        total / samples as f64
    }

    pub fn run(&mut self, instance: &TspInstance) -> Result<Solution> {
        let start = std::time::Instant::now();
        self.iterations = 0;
        self.accepted = 0;

        if instance.is_empty() {
            return Ok(Solution::empty("SimulatedAnnealing"));
        }

        let matrix = instance.cost_matrix();
        let n = instance.dimension();
        let mut current = self.initial_route(instance)?;
        let mut current_cost = current.cost(matrix);
        let mut best = current.clone();
        let mut best_cost = current_cost;
        report(instance, best_cost, best.as_slice());

        if n >= 3 {
            let initial_temperature = match self.config.initial_temperature {
                Some(t) => t,
                None => self.sample_temperature(&current, instance),
            };
            let per_temperature = self.config.iterations_per_temperature.unwrap_or(n);

            info!(
                "[SA] {} points, start cost {:.3}, T0 {:.3} -> {} (rate {}, {} moves per step)",
                n,
                current_cost,
                initial_temperature,
                self.config.stopping_temperature,
                self.config.cooling_rate,
                per_temperature
            );

            let mut temperature = initial_temperature;
            while temperature > self.config.stopping_temperature {
                for _ in 0..per_temperature {
                    let (kind, i, j, delta) = self.propose(&current, instance);
                    self.iterations += 1;

                    let accept = delta <= 0.0 || self.rng.gen::<f64>() < (-delta / temperature).exp();
                    if !accept {
                        continue;
                    }

                    match kind {
                        SaMove::Reversal => current.reverse(i, j)?,
                        _ => current.swap(i, j)?,
                    }
                    current_cost += delta;
                    self.accepted += 1;

                    if current_cost < best_cost {
                        best.clone_from(&current);
                        best_cost = current_cost;
                        debug!("[SA] T {:.4}  new best {:.3}", temperature, best_cost);
                        report(instance, best_cost, best.as_slice());
                    }
                }

                // Drop the rounding drift of the summed deltas
                current_cost = current.cost(matrix);
                temperature *= self.config.cooling_rate;
            }
        }

        best.validate()?;
        best.rotate_to(0);
        let mut solution = Solution::from_route(instance, best, "SimulatedAnnealing");
        solution.computation_time = start.elapsed().as_secs_f64();
        solution.iterations = Some(self.iterations);

        info!(
            "[SA] best cost {:.3} after {} moves ({} accepted, {:.2}s)",
            solution.cost, self.iterations, self.accepted, solution.computation_time
        );
        Ok(solution)
    }
}

impl<R: Rng> TourSolver for SimulatedAnnealing<R> {
    fn solve(&mut self, instance: &TspInstance) -> Result<Solution> {
        self.run(instance)
    }

    fn name(&self) -> &str {
        "SimulatedAnnealing"
    }
}
