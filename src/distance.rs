//! Distance metrics and the precomputed cost matrix.
//!
//! Two metrics are supported: planar Euclidean distance and great-circle
//! (haversine) distance over latitude/longitude in decimal degrees.

use crate::instance::Point;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Mean Earth radius used by the haversine metric, in kilometers
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Instances at least this large build their matrix rows in parallel
const PARALLEL_THRESHOLD: usize = 256;

/// How the distance between two points is measured
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
pub enum Metric {
    /// `sqrt((x1-x2)^2 + (y1-y2)^2)`
    #[default]
    Euclidean,
    /// Great-circle distance in kilometers; `x` is latitude, `y` is longitude
    Haversine,
}

impl Metric {
    /// Pick the metric matching a TSPLIB `EDGE_WEIGHT_TYPE` value.
    pub fn from_edge_weight_type(value: &str) -> Self {
        match value.trim().to_ascii_uppercase().as_str() {
            "GEO" => Metric::Haversine,
            _ => Metric::Euclidean,
        }
    }

    #[inline]
    pub fn distance(&self, a: &Point, b: &Point) -> f64 {
        match self {
            Metric::Euclidean => euclidean(a.x(), a.y(), b.x(), b.y()),
            Metric::Haversine => haversine(a.x(), a.y(), b.x(), b.y()),
        }
    }
}

impl std::fmt::Display for Metric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Metric::Euclidean => write!(f, "euclidean"),
            Metric::Haversine => write!(f, "haversine"),
        }
    }
}

#[inline]
fn euclidean(x1: f64, y1: f64, x2: f64, y2: f64) -> f64 {
    let dx = x1 - x2;
    let dy = y1 - y2;
    (dx * dx + dy * dy).sqrt()
}

fn haversine(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let lat1 = lat1.to_radians();
    let lat2 = lat2.to_radians();
    let d_lat = lat2 - lat1;
    let d_lon = (lon2 - lon1).to_radians();

    let a = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2);
    // Rounding can push `a` a hair past 1 for antipodal points
    let a = a.clamp(0.0, 1.0);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_KM * c
}

/// Dense, symmetric n x n distance matrix stored in row-major order.
#[derive(Debug, Clone, Default)]
pub struct CostMatrix {
    data: Vec<f64>,
    size: usize,
}

impl CostMatrix {
    /// Compute all pairwise distances between `points` under `metric`.
    pub fn build(points: &[Point], metric: Metric) -> Self {
        let n = points.len();
        let mut data = vec![0.0; n * n];

        let fill_row = |(i, row): (usize, &mut [f64])| {
            for (j, cell) in row.iter_mut().enumerate() {
                if i != j {
                    *cell = metric.distance(&points[i], &points[j]);
                }
            }
        };

        if n >= PARALLEL_THRESHOLD {
            data.par_chunks_mut(n).enumerate().for_each(fill_row);
        } else if n > 0 {
            data.chunks_mut(n).enumerate().for_each(fill_row);
        }

        CostMatrix { data, size: n }
    }

    /// Distance from `from` to `to`.
    ///
    /// # Panics
    ///
    /// Panics if either index is out of bounds.
    #[inline]
    pub fn get(&self, from: usize, to: usize) -> f64 {
        self.data[from * self.size + to]
    }

    /// Number of points covered by the matrix
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Row of distances from `from` to every point.
    pub fn row(&self, from: usize) -> &[f64] {
        &self.data[from * self.size..(from + 1) * self.size]
    }

    /// Closed-cycle length of `tour`: consecutive edges plus the edge back to the start.
    pub fn tour_length(&self, tour: &[usize]) -> f64 {
        if tour.len() < 2 {
            return 0.0;
        }

        let mut length: f64 = tour.windows(2).map(|w| self.get(w[0], w[1])).sum();
        length += self.get(tour[tour.len() - 1], tour[0]);
        length
    }
}
