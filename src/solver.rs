//! Common interface of the tour solvers.

use crate::error::Result;
use crate::instance::TspInstance;
use crate::notifier::{self, EngineView};
use crate::solution::Solution;

pub trait TourSolver {
    /// Solve `instance`, borrowing it read-only.
    fn solve(&mut self, instance: &TspInstance) -> Result<Solution>;

    fn name(&self) -> &str;
}

/// Report `tour` with its `distance` to the registered notifier, if any.
#[inline]
pub(crate) fn report(instance: &TspInstance, distance: f64, tour: &[usize]) {
    notifier::notify(distance, &EngineView::new(instance, tour));
}
