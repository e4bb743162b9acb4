//! Exhaustive search over all tours.
//!
//! The first point is fixed to remove rotations of the same cycle, leaving
//! `(n-1)!` tours. The nearest neighbor tour is the first incumbent, so the
//! search always ends with a complete tour. Running time grows factorially;
//! callers gate its use with [`BruteForce::check_size`].

use crate::error::{Error, Result};
use crate::heuristics::construction::NearestNeighbor;
use crate::instance::TspInstance;
use crate::route::Route;
use crate::solution::Solution;
use crate::solver::{report, TourSolver};
use log::{debug, info};

#[derive(Debug, Clone, Default)]
pub struct BruteForce {
    evaluated: usize,
}

impl BruteForce {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject instances larger than `limit` points.
    pub fn check_size(n: usize, limit: usize) -> Result<()> {
        if n > limit {
            return Err(Error::validation(
                "brute_force_limit",
                format!("{} points exceed the brute force limit of {}", n, limit),
            ));
        }
        Ok(())
    }

    /// Number of complete tours evaluated by the last solve
    pub fn evaluated(&self) -> usize {
        self.evaluated
    }
}

struct Search<'a> {
    instance: &'a TspInstance,
    path: Vec<usize>,
    used: Vec<bool>,
    best_tour: Vec<usize>,
    best_cost: f64,
    evaluated: usize,
}

impl Search<'_> {
    fn extend(&mut self, prefix_cost: f64) {
        let n = self.used.len();
        // Distances are non-negative, so a prefix at the incumbent cannot win
        if prefix_cost >= self.best_cost {
            return;
        }

        let last = self.path[self.path.len() - 1];
        if self.path.len() == n {
            self.evaluated += 1;
            let cost = prefix_cost + self.instance.distance(last, self.path[0]);
            if cost < self.best_cost {
                self.best_cost = cost;
                self.best_tour.clone_from(&self.path);
                debug!("[BruteForce] new best {:.3}", cost);
                report(self.instance, cost, &self.best_tour);
            }
            return;
        }

        for next in 1..n {
            if self.used[next] {
                continue;
            }
            self.used[next] = true;
            self.path.push(next);
            self.extend(prefix_cost + self.instance.distance(last, next));
            self.path.pop();
            self.used[next] = false;
        }
    }
}

impl TourSolver for BruteForce {
    fn solve(&mut self, instance: &TspInstance) -> Result<Solution> {
        let start = std::time::Instant::now();
        let n = instance.dimension();
        self.evaluated = 0;
        if n == 0 {
            return Ok(Solution::empty(self.name()));
        }

        let incumbent = NearestNeighbor::build_tour(instance, 0)?;
        let incumbent_cost = incumbent.cost(instance.cost_matrix());
        info!("[BruteForce] enumerating {} points from incumbent {:.3}", n, incumbent_cost);
        report(instance, incumbent_cost, incumbent.as_slice());

        let mut used = vec![false; n];
        used[0] = true;
        let mut search = Search {
            instance,
            path: vec![0],
            used,
            best_tour: incumbent.as_slice().to_vec(),
            best_cost: incumbent_cost,
            evaluated: 0,
        };
        search.extend(0.0);

        self.evaluated = search.evaluated;
        let route = Route::new(search.best_tour, n)?;
        let mut solution = Solution::from_route(instance, route, self.name());
        solution.computation_time = start.elapsed().as_secs_f64();
        solution.iterations = Some(self.evaluated);

        info!(
            "[BruteForce] optimum {:.3} after {} complete tours in {:.3}s",
            solution.cost, self.evaluated, solution.computation_time
        );
        Ok(solution)
    }

    fn name(&self) -> &str {
        "BruteForce"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distance::Metric;
    use crate::heuristics::construction::NearestNeighbor;
    use crate::instance::Point;

    fn instance(coords: &[(f64, f64)]) -> TspInstance {
        let points = coords
            .iter()
            .enumerate()
            .map(|(i, &(x, y))| Point::new(i + 1, x, y))
            .collect();
        TspInstance::from_points("test", points, Metric::Euclidean)
    }

    /// Reference optimum by plain enumeration of every permutation
    fn exhaustive_optimum(inst: &TspInstance) -> f64 {
        fn permute(rest: &mut Vec<usize>, k: usize, inst: &TspInstance, best: &mut f64) {
            if k == rest.len() {
                let mut tour = vec![0];
                tour.extend_from_slice(rest);
                *best = best.min(inst.tour_length(&tour));
                return;
            }
            for i in k..rest.len() {
                rest.swap(k, i);
                permute(rest, k + 1, inst, best);
                rest.swap(k, i);
            }
        }
        let mut rest: Vec<usize> = (1..inst.dimension()).collect();
        let mut best = f64::INFINITY;
        permute(&mut rest, 0, inst, &mut best);
        best
    }

    #[test]
    fn test_finds_optimum() {
        let inst = instance(&[
            (0.0, 0.0),
            (7.0, 2.0),
            (3.0, 9.0),
            (8.0, 8.0),
            (1.0, 5.0),
            (5.0, 4.0),
            (9.0, 0.0),
        ]);
        let sol = BruteForce::new().solve(&inst).unwrap();
        assert!((sol.cost - exhaustive_optimum(&inst)).abs() < 1e-9);
        assert_eq!(sol.tour()[0], 0);
        assert!(sol.route.validate().is_ok());
    }

    #[test]
    fn test_not_worse_than_nearest_neighbor() {
        let inst = instance(&[(0.0, 0.0), (10.0, 0.0), (1.0, 0.0), (3.0, 0.0), (4.0, 6.0), (9.0, 9.0)]);
        let exact = BruteForce::new().solve(&inst).unwrap();
        let greedy = NearestNeighbor::new().solve(&inst).unwrap();
        assert!(exact.cost <= greedy.cost + 1e-9);
    }

    #[test]
    fn test_tiny_instances() {
        let sol = BruteForce::new().solve(&instance(&[])).unwrap();
        assert!(sol.tour().is_empty());
        assert_eq!(sol.cost, 0.0);

        let sol = BruteForce::new().solve(&instance(&[(2.0, 2.0)])).unwrap();
        assert_eq!(sol.tour(), &[0]);
        assert_eq!(sol.cost, 0.0);

        let sol = BruteForce::new().solve(&instance(&[(0.0, 0.0), (3.0, 4.0)])).unwrap();
        assert_eq!(sol.tour(), &[0, 1]);
        assert!((sol.cost - 10.0).abs() < 1e-12);
    }

    #[test]
    fn test_overflowing_distances_still_yield_a_tour() {
        let inst = instance(&[(0.0, 0.0), (1e200, 0.0), (0.0, 1e200)]);
        assert!(inst.distance(0, 1).is_infinite());

        let sol = BruteForce::new().solve(&inst).unwrap();
        assert_eq!(sol.route.len(), 3);
        assert!(sol.route.validate().is_ok());
        assert_eq!(sol.tour()[0], 0);
    }

    #[test]
    fn test_check_size() {
        assert!(BruteForce::check_size(10, 10).is_ok());
        assert!(matches!(BruteForce::check_size(11, 10), Err(Error::Validation { .. })));
    }
}
