//! Tour representation.
//!
//! A [`Route`] is a permutation of the point indices `0..n`. The invariant is
//! checked when a route is built from raw indices, and every mutation offered
//! here preserves it.

use crate::distance::CostMatrix;
use crate::error::{Error, Result};
use crate::instance::TspInstance;
use serde::{Deserialize, Serialize};

/// A closed tour visiting every point exactly once
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Route {
    order: Vec<usize>,
}

impl Route {
    /// Build a route over `n` points, failing unless `order` is a permutation of `0..n`.
    pub fn new(order: Vec<usize>, n: usize) -> Result<Self> {
        validate_permutation(&order, n)?;
        Ok(Route { order })
    }

    /// The route `0, 1, ..., n-1`
    pub fn identity(n: usize) -> Self {
        Route {
            order: (0..n).collect(),
        }
    }

    pub fn empty() -> Self {
        Route { order: Vec::new() }
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn as_slice(&self) -> &[usize] {
        &self.order
    }

    /// Point index at position `pos`
    pub fn get(&self, pos: usize) -> usize {
        self.order[pos]
    }

    /// Re-check the permutation invariant.
    pub fn validate(&self) -> Result<()> {
        validate_permutation(&self.order, self.order.len())
    }

    /// Closed-cycle cost; 0 for routes of fewer than two points.
    pub fn cost(&self, matrix: &CostMatrix) -> f64 {
        matrix.tour_length(&self.order)
    }

    /// Swap the points at positions `i` and `j`.
    pub fn swap(&mut self, i: usize, j: usize) -> Result<()> {
        self.check_position(i)?;
        self.check_position(j)?;
        self.order.swap(i, j);
        Ok(())
    }

    /// Reverse the segment `i..=j`.
    pub fn reverse(&mut self, i: usize, j: usize) -> Result<()> {
        self.check_position(j)?;
        if i > j {
            return Err(Error::InvalidRoute(format!(
                "segment start {} is after its end {}",
                i, j
            )));
        }
        self.order[i..=j].reverse();
        Ok(())
    }

    /// Remove the point at `from` and insert it so it ends up at position `to`.
    pub fn relocate(&mut self, from: usize, to: usize) -> Result<()> {
        self.check_position(from)?;
        self.check_position(to)?;
        let point = self.order.remove(from);
        self.order.insert(to, point);
        Ok(())
    }

    /// Rotate the cycle so `point` comes first. The cost is unchanged.
    pub fn rotate_to(&mut self, point: usize) {
        if let Some(pos) = self.order.iter().position(|&p| p == point) {
            self.order.rotate_left(pos);
        }
    }

    /// Cost change caused by swapping positions `i` and `j`, without applying it.
    ///
    /// Handles adjacent positions, including the wrap-around pair `(0, n-1)`.
    pub fn swap_delta(&self, matrix: &CostMatrix, i: usize, j: usize) -> f64 {
        let n = self.order.len();
        if i == j || n < 3 {
            return 0.0;
        }

        // Start positions of the edges touching i or j, deduplicated
        let mut edges = [(i + n - 1) % n, i, (j + n - 1) % n, j];
        edges.sort_unstable();
        let mut unique = [0usize; 4];
        let mut count = 0;
        for &e in &edges {
            if count == 0 || unique[count - 1] != e {
                unique[count] = e;
                count += 1;
            }
        }

        let at = |pos: usize| -> usize {
            if pos == i {
                self.order[j]
            } else if pos == j {
                self.order[i]
            } else {
                self.order[pos]
            }
        };

        let mut delta = 0.0;
        for &e in &unique[..count] {
            let next = (e + 1) % n;
            delta -= matrix.get(self.order[e], self.order[next]);
            delta += matrix.get(at(e), at(next));
        }
        delta
    }

    /// Cost change caused by reversing the segment `i..=j` (`i <= j`), without
    /// applying it.
    pub fn reverse_delta(&self, matrix: &CostMatrix, i: usize, j: usize) -> f64 {
        let n = self.order.len();
        if i >= j || n < 3 || (j + 1) % n == i {
            return 0.0;
        }

        let before = self.order[(i + n - 1) % n];
        let after = self.order[(j + 1) % n];
        let first = self.order[i];
        let last = self.order[j];
        matrix.get(before, last) + matrix.get(first, after) - matrix.get(before, first) - matrix.get(last, after)
    }

    /// Dataset ids of the points in visiting order
    pub fn ids(&self, instance: &TspInstance) -> Vec<usize> {
        self.order.iter().map(|&i| instance.point(i).id()).collect()
    }

    fn check_position(&self, pos: usize) -> Result<()> {
        if pos >= self.order.len() {
            return Err(Error::InvalidRoute(format!(
                "position {} out of range for a route of {} points",
                pos,
                self.order.len()
            )));
        }
        Ok(())
    }
}

fn validate_permutation(order: &[usize], n: usize) -> Result<()> {
    if order.len() != n {
        return Err(Error::InvalidRoute(format!(
            "route has {} entries, expected {}",
            order.len(),
            n
        )));
    }

    let mut seen = vec![false; n];
    for &index in order {
        if index >= n {
            return Err(Error::InvalidRoute(format!(
                "index {} out of range for {} points",
                index, n
            )));
        }
        if seen[index] {
            return Err(Error::InvalidRoute(format!("index {} appears twice", index)));
        }
        seen[index] = true;
    }
    Ok(())
}
