//! Engine facade: one loaded dataset plus the last solution computed on it.

use crate::config::SolverSettings;
use crate::error::{Error, Result};
use crate::exact::BruteForce;
use crate::heuristics::annealing::{SaConfig, SimulatedAnnealing};
use crate::heuristics::construction::NearestNeighbor;
use crate::heuristics::genetic::{GaConfig, GeneticAlgorithm};
use crate::instance::{Point, TspInstance};
use crate::notifier::EngineView;
use crate::solution::Solution;
use crate::solver::TourSolver;
use std::path::Path;

/// Owns a dataset and its cost matrix. Solves take `&mut self`, so a single
/// engine never runs two solves at once.
#[derive(Debug, Clone)]
pub struct TspEngine {
    instance: TspInstance,
    settings: SolverSettings,
    solution: Option<Solution>,
}

impl TspEngine {
    pub fn new(instance: TspInstance) -> Self {
        Self::with_settings(instance, SolverSettings::default())
    }

    pub fn with_settings(instance: TspInstance, settings: SolverSettings) -> Self {
        TspEngine {
            instance,
            settings,
            solution: None,
        }
    }

    /// Load a dataset file with default settings.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        Ok(Self::new(TspInstance::from_file(path)?))
    }

    pub fn instance(&self) -> &TspInstance {
        &self.instance
    }

    pub fn settings(&self) -> &SolverSettings {
        &self.settings
    }

    pub fn point_count(&self) -> usize {
        self.instance.dimension()
    }

    pub fn point(&self, index: usize) -> Option<&Point> {
        self.instance.points().get(index)
    }

    /// Run any solver and keep its result as the current solution.
    pub fn solve_with<S: TourSolver + ?Sized>(&mut self, solver: &mut S) -> Result<&Solution> {
        let solution = solver.solve(&self.instance)?;
        Ok(&*self.solution.insert(solution))
    }

    pub fn solve_nearest_neighbor(&mut self) -> Result<&Solution> {
        self.solve_with(&mut NearestNeighbor::new())
    }

    /// Exhaustive search, refused above `brute_force_limit` points.
    pub fn solve_brute_force(&mut self) -> Result<&Solution> {
        BruteForce::check_size(self.point_count(), self.settings.brute_force_limit)?;
        self.solve_with(&mut BruteForce::new())
    }

    pub fn solve_genetic(&mut self, config: GaConfig) -> Result<&Solution> {
        let mut solver = GeneticAlgorithm::new(config)?;
        self.solve_with(&mut solver)
    }

    pub fn solve_annealing(&mut self, config: SaConfig) -> Result<&Solution> {
        let mut solver = SimulatedAnnealing::new(config)?;
        self.solve_with(&mut solver)
    }

    pub fn solution(&self) -> Option<&Solution> {
        self.solution.as_ref()
    }

    /// Distance of the last solution, 0 before any solve.
    pub fn solution_distance(&self) -> f64 {
        self.solution.as_ref().map_or(0.0, |s| s.cost)
    }

    /// View of the last solution's route.
    pub fn view(&self) -> Option<EngineView<'_>> {
        self.solution
            .as_ref()
            .map(|s| EngineView::new(&self.instance, s.tour()))
    }

    /// Write the last solution using `precision` decimals, or the settings'
    /// precision when `None`.
    pub fn write_solution<P: AsRef<Path>>(&self, path: P, precision: Option<usize>) -> Result<()> {
        let solution = self
            .solution
            .as_ref()
            .ok_or_else(|| Error::validation("solution", "no solve has run on this engine"))?;
        let precision = precision.unwrap_or(self.settings.solution_precision);
        solution.write_to_file(&self.instance, precision, path)
    }
}
