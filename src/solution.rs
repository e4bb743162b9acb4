//! Solution representation and the flat solution file.
//!
//! The file format is the total distance on the first line followed by one
//! point id per line in visiting order.

use crate::error::{Error, Result};
use crate::instance::TspInstance;
use crate::route::Route;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

/// Relative tolerance accepted between a stored and a recomputed distance
pub const VERIFY_TOLERANCE: f64 = 0.05;

/// Represents a solution to the TSP
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Solution {
    /// The tour as point indices in visiting order
    pub route: Route,
    /// Total closed tour length
    pub cost: f64,
    /// Algorithm that generated this solution
    pub algorithm: String,
    /// Computation time in seconds
    pub computation_time: f64,
    /// Number of iterations (if applicable)
    pub iterations: Option<usize>,
}

impl Solution {
    /// Create a solution from a validated route, computing its cost
    pub fn from_route(instance: &TspInstance, route: Route, algorithm: &str) -> Self {
        let cost = route.cost(instance.cost_matrix());
        Solution {
            route,
            cost,
            algorithm: algorithm.to_string(),
            computation_time: 0.0,
            iterations: None,
        }
    }

    /// Create a solution from raw indices, validating them first
    pub fn from_tour(instance: &TspInstance, tour: Vec<usize>, algorithm: &str) -> Result<Self> {
        let route = Route::new(tour, instance.dimension())?;
        Ok(Self::from_route(instance, route, algorithm))
    }

    /// The zero-length solution of an empty instance
    pub fn empty(algorithm: &str) -> Self {
        Solution {
            route: Route::empty(),
            cost: 0.0,
            algorithm: algorithm.to_string(),
            computation_time: 0.0,
            iterations: None,
        }
    }

    pub fn tour(&self) -> &[usize] {
        self.route.as_slice()
    }

    /// Dataset ids in visiting order
    pub fn ids(&self, instance: &TspInstance) -> Vec<usize> {
        self.route.ids(instance)
    }

    /// Write the solution file.
    ///
    /// `precision == 0` writes the distance rounded to an integer, otherwise
    /// with `precision` decimals.
    pub fn write_to<W: Write>(&self, instance: &TspInstance, precision: usize, mut writer: W) -> Result<()> {
        writeln!(writer, "{}", format_distance(self.cost, precision))?;
        for id in self.ids(instance) {
            writeln!(writer, "{}", id)?;
        }
        writer.flush()?;
        Ok(())
    }

    pub fn write_to_file<P: AsRef<Path>>(&self, instance: &TspInstance, precision: usize, path: P) -> Result<()> {
        let file = File::create(path)?;
        self.write_to(instance, precision, BufWriter::new(file))
    }
}

impl std::fmt::Display for Solution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Solution ({})", self.algorithm)?;
        writeln!(f, "  Cost: {:.2}", self.cost)?;
        writeln!(f, "  Time: {:.4}s", self.computation_time)?;
        if let Some(iter) = self.iterations {
            writeln!(f, "  Iterations: {}", iter)?;
        }
        writeln!(f, "  Tour: {:?}", self.route.as_slice())
    }
}

fn format_distance(distance: f64, precision: usize) -> String {
    if precision == 0 {
        format!("{}", distance.round() as i64)
    } else {
        format!("{:.*}", precision, distance)
    }
}

/// A solution file read back from disk
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolutionRecord {
    pub distance: f64,
    pub ids: Vec<usize>,
}

impl SolutionRecord {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        Self::from_reader(BufReader::new(file))
    }

    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self> {
        let mut distance = None;
        let mut ids = Vec::new();

        for (index, line) in reader.lines().enumerate() {
            let line_no = index + 1;
            let line = line?;
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            if distance.is_none() {
                let value: f64 = line.parse().map_err(|_| Error::SolutionFormat {
                    line: line_no,
                    reason: format!("invalid distance `{}`", line),
                })?;
                distance = Some(value);
            } else {
                let id: usize = line.parse().map_err(|_| Error::SolutionFormat {
                    line: line_no,
                    reason: format!("invalid point id `{}`", line),
                })?;
                ids.push(id);
            }
        }

        let distance = distance.ok_or_else(|| Error::SolutionFormat {
            line: 1,
            reason: "missing distance".to_string(),
        })?;

        Ok(SolutionRecord { distance, ids })
    }

    /// Recompute the tour length from the instance coordinates and compare it
    /// with the stored distance.
    pub fn verify(&self, instance: &TspInstance) -> Result<Verification> {
        if self.ids.len() != instance.dimension() {
            return Err(Error::InvalidRoute(format!(
                "solution lists {} points, instance has {}",
                self.ids.len(),
                instance.dimension()
            )));
        }

        let mut seen = HashSet::with_capacity(self.ids.len());
        let mut tour = Vec::with_capacity(self.ids.len());
        for &id in &self.ids {
            if !seen.insert(id) {
                return Err(Error::InvalidRoute(format!("point id {} appears twice", id)));
            }
            let index = instance
                .index_of(id)
                .ok_or_else(|| Error::InvalidRoute(format!("unknown point id {}", id)))?;
            tour.push(index);
        }

        let recomputed = instance.tour_length(&tour);
        let difference = (self.distance - recomputed).abs();
        let relative_gap = if self.distance > 0.0 {
            difference / self.distance
        } else if difference == 0.0 {
            0.0
        } else {
            f64::INFINITY
        };

        Ok(Verification {
            stored: self.distance,
            recomputed,
            relative_gap,
            within_tolerance: difference <= self.distance * VERIFY_TOLERANCE,
        })
    }
}

/// Outcome of [`SolutionRecord::verify`]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Verification {
    pub stored: f64,
    pub recomputed: f64,
    pub relative_gap: f64,
    pub within_tolerance: bool,
}
