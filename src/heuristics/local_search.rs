//! Local search improvement for TSP tours.

use crate::distance::CostMatrix;
use crate::error::Result;
use crate::instance::TspInstance;
use crate::route::Route;
use crate::solution::Solution;
use log::trace;

/// Moves must gain more than this to be applied
const IMPROVEMENT_EPS: f64 = 1e-10;

pub trait LocalSearch {
    /// Improve `solution` in place. Returns whether the cost went down.
    fn improve(&self, instance: &TspInstance, solution: &mut Solution) -> Result<bool>;
    fn name(&self) -> &str;
}

/// 2-Opt Local Search
///
/// Reverses the segment between two edges whenever that shortens the tour,
/// until no such move is left. The first point of the tour stays in place.
#[derive(Debug, Clone, Default)]
pub struct TwoOpt;

impl TwoOpt {
    pub fn new() -> Self {
        TwoOpt
    }

    /// Run first-improvement passes over `route` until none applies.
    /// Returns the number of reversals made.
    pub fn optimize(&self, matrix: &CostMatrix, route: &mut Route) -> Result<usize> {
        let n = route.len();
        if n < 4 {
            return Ok(0);
        }

        let mut moves = 0usize;
        loop {
            let mut improved = false;
            for i in 1..n - 1 {
                for j in i + 1..n {
                    let tour = route.as_slice();
                    let a = tour[i - 1];
                    let b = tour[i];
                    let c = tour[j];
                    let d = tour[(j + 1) % n];

                    let delta = matrix.get(a, c) + matrix.get(b, d) - matrix.get(a, b) - matrix.get(c, d);
                    if delta < -IMPROVEMENT_EPS {
                        route.reverse(i, j)?;
                        improved = true;
                        moves += 1;
                    }
                }
            }

            if !improved {
                return Ok(moves);
            }
        }
    }
}

impl LocalSearch for TwoOpt {
    fn improve(&self, instance: &TspInstance, solution: &mut Solution) -> Result<bool> {
        let matrix = instance.cost_matrix();
        let initial_cost = solution.cost;

        let moves = self.optimize(matrix, &mut solution.route)?;
        solution.cost = solution.route.cost(matrix);
        trace!("[2-opt] {} moves, {:.3} -> {:.3}", moves, initial_cost, solution.cost);
        Ok(solution.cost < initial_cost - IMPROVEMENT_EPS)
    }

    fn name(&self) -> &str {
        "TwoOpt"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distance::Metric;
    use crate::instance::Point;

    fn square() -> TspInstance {
        TspInstance::from_points(
            "square",
            vec![
                Point::new(1, 0.0, 0.0),
                Point::new(2, 1.0, 0.0),
                Point::new(3, 1.0, 1.0),
                Point::new(4, 0.0, 1.0),
            ],
            Metric::Euclidean,
        )
    }

    #[test]
    fn test_two_opt_uncrosses_square() {
        let instance = square();
        let mut solution = Solution::from_tour(&instance, vec![0, 2, 1, 3], "test").unwrap();

        let improved = TwoOpt::new().improve(&instance, &mut solution).unwrap();

        assert!(improved);
        assert!((solution.cost - 4.0).abs() < 1e-12);
        assert_eq!(solution.tour()[0], 0);
        assert!(solution.route.validate().is_ok());
    }

    #[test]
    fn test_two_opt_leaves_optimal_tour_alone() {
        let instance = square();
        let mut solution = Solution::from_tour(&instance, vec![0, 1, 2, 3], "test").unwrap();
        let improved = TwoOpt::new().improve(&instance, &mut solution).unwrap();
        assert!(!improved);
        assert_eq!(solution.tour(), &[0, 1, 2, 3]);
    }

    #[test]
    fn test_small_tours_untouched() {
        let instance = TspInstance::from_points(
            "tri",
            vec![Point::new(1, 0.0, 0.0), Point::new(2, 1.0, 0.0), Point::new(3, 0.0, 1.0)],
            Metric::Euclidean,
        );
        let mut solution = Solution::from_tour(&instance, vec![2, 0, 1], "test").unwrap();
        assert!(!TwoOpt::new().improve(&instance, &mut solution).unwrap());
    }

    #[test]
    fn test_optimize_counts_reversals_on_route() {
        let instance = square();
        let mut route = Route::new(vec![0, 2, 1, 3], 4).unwrap();

        let moves = TwoOpt::new().optimize(instance.cost_matrix(), &mut route).unwrap();
        assert!(moves >= 1);
        assert!((route.cost(instance.cost_matrix()) - 4.0).abs() < 1e-12);
        assert_eq!(TwoOpt::new().optimize(instance.cost_matrix(), &mut route).unwrap(), 0);
    }
}
