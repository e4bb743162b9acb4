//! Greedy tour construction.

use crate::error::{Error, Result};
use crate::heuristics::local_search::{LocalSearch, TwoOpt};
use crate::instance::TspInstance;
use crate::route::Route;
use crate::solution::Solution;
use crate::solver::{report, TourSolver};
use log::{debug, info};

/// Nearest Neighbor Heuristic
///
/// Builds a tour by repeatedly visiting the nearest unvisited point. Ties go
/// to the lowest index, so the result depends only on the instance.
#[derive(Debug, Clone, Default)]
pub struct NearestNeighbor {
    /// Index of the first point, below the point count
    pub start: usize,
}

impl NearestNeighbor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the greedy tour from `start` without reporting it.
    pub fn build_tour(instance: &TspInstance, start: usize) -> Result<Route> {
        let n = instance.dimension();
        if n == 0 {
            return Ok(Route::empty());
        }
        if start >= n {
            return Err(Error::validation(
                "start",
                format!("index {} out of range for {} points", start, n),
            ));
        }

        let mut visited = vec![false; n];
        let mut tour = Vec::with_capacity(n);
        let mut current = start;
        visited[current] = true;
        tour.push(current);

        while tour.len() < n {
            let row = instance.cost_matrix().row(current);
            let mut nearest = None;
            let mut nearest_distance = f64::INFINITY;
            for (candidate, &distance) in row.iter().enumerate() {
                if !visited[candidate] && (nearest.is_none() || distance < nearest_distance) {
                    nearest = Some(candidate);
                    nearest_distance = distance;
                }
            }

            // Some unvisited point always remains while the tour is short
            let Some(next) = nearest else { break };
            visited[next] = true;
            tour.push(next);
            current = next;
        }

        Route::new(tour, n)
    }
}

impl TourSolver for NearestNeighbor {
    fn solve(&mut self, instance: &TspInstance) -> Result<Solution> {
        let start = std::time::Instant::now();
        if instance.is_empty() {
            return Ok(Solution::empty(self.name()));
        }

        let route = Self::build_tour(instance, self.start)?;
        let mut solution = Solution::from_route(instance, route, self.name());
        solution.computation_time = start.elapsed().as_secs_f64();

        info!("[NN] {} points, cost {:.3}", instance.dimension(), solution.cost);
        report(instance, solution.cost, solution.tour());
        Ok(solution)
    }

    fn name(&self) -> &str {
        "NearestNeighbor"
    }
}

/// Multi-start construction
///
/// Runs the nearest neighbor construction from every start point, optionally
/// polishing each tour with 2-opt, and keeps the best. Ties keep the lowest
/// start index.
#[derive(Debug, Clone)]
pub struct MultiStartNearestNeighbor {
    pub two_opt: Option<TwoOpt>,
}

impl MultiStartNearestNeighbor {
    pub fn new() -> Self {
        MultiStartNearestNeighbor { two_opt: None }
    }

    pub fn with_two_opt() -> Self {
        MultiStartNearestNeighbor {
            two_opt: Some(TwoOpt::new()),
        }
    }
}

impl Default for MultiStartNearestNeighbor {
    fn default() -> Self {
        Self::new()
    }
}

impl TourSolver for MultiStartNearestNeighbor {
    fn solve(&mut self, instance: &TspInstance) -> Result<Solution> {
        let start = std::time::Instant::now();
        if instance.is_empty() {
            return Ok(Solution::empty(self.name()));
        }

        let mut best: Option<Solution> = None;
        for origin in 0..instance.dimension() {
            let route = NearestNeighbor::build_tour(instance, origin)?;
            let mut candidate = Solution::from_route(instance, route, self.name());
            if let Some(two_opt) = &self.two_opt {
                two_opt.improve(instance, &mut candidate)?;
            }

            let improved = best.as_ref().map_or(true, |b| candidate.cost < b.cost);
            if improved {
                debug!("[MultiStart] start {} improves to {:.3}", origin, candidate.cost);
                report(instance, candidate.cost, candidate.tour());
                best = Some(candidate);
            }
        }

        let mut solution = best.unwrap_or_else(|| Solution::empty(self.name()));
        solution.computation_time = start.elapsed().as_secs_f64();
        solution.iterations = Some(instance.dimension());
        info!("[MultiStart] best cost {:.3}", solution.cost);
        Ok(solution)
    }

    fn name(&self) -> &str {
        if self.two_opt.is_some() {
            "MultiStartNearestNeighbor+2opt"
        } else {
            "MultiStartNearestNeighbor"
        }
    }
}
