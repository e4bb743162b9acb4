//! Module for parsing and representing TSP instances.
//!
//! This module handles the TSPLIB-like coordinate files: a header of
//! `KEY : value` lines, a `NODE_COORD_SECTION` with one `id x y` line per
//! point, and an `EOF` sentinel. Points keep their file order; the cost matrix
//! is computed once when the instance is built.

use crate::distance::{CostMatrix, Metric};
use crate::error::{Error, Result};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

/// A point of the instance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Point {
    id: usize,
    x: f64,
    y: f64,
    position: Option<usize>,
    visited: bool,
}

impl Point {
    pub fn new(id: usize, x: f64, y: f64) -> Self {
        Point {
            id,
            x,
            y,
            position: None,
            visited: false,
        }
    }

    /// Build a point carrying its route position and visited flag.
    pub fn with_state(id: usize, x: f64, y: f64, position: Option<usize>, visited: bool) -> Self {
        Point {
            id,
            x,
            y,
            position,
            visited,
        }
    }

    /// Identifier from the dataset (1-based, stable input order)
    pub fn id(&self) -> usize {
        self.id
    }

    /// X coordinate, or latitude for geographic instances
    pub fn x(&self) -> f64 {
        self.x
    }

    /// Y coordinate, or longitude for geographic instances
    pub fn y(&self) -> f64 {
        self.y
    }

    /// Index of the point in its containing route, if known
    pub fn position(&self) -> Option<usize> {
        self.position
    }

    pub fn is_visited(&self) -> bool {
        self.visited
    }
}

/// Represents a complete TSP instance
#[derive(Debug, Clone)]
pub struct TspInstance {
    /// Name of the instance
    pub name: String,
    /// Comment/description
    pub comment: String,
    /// Value of the `DIMENSION` header, if present
    pub declared_dimension: Option<usize>,
    points: Vec<Point>,
    metric: Metric,
    matrix: CostMatrix,
}

impl TspInstance {
    /// Build an instance from points already in memory.
    pub fn from_points(name: impl Into<String>, points: Vec<Point>, metric: Metric) -> Self {
        let matrix = CostMatrix::build(&points, metric);
        TspInstance {
            name: name.into(),
            comment: String::new(),
            declared_dimension: None,
            points,
            metric,
            matrix,
        }
    }

    /// Parse an instance from a TSPLIB-like coordinate file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        debug!("Opening dataset: {:?}", path);

        let file = File::open(path).map_err(|source| Error::DatasetNotFound {
            path: path.to_path_buf(),
            source,
        })?;

        let mut instance = Self::from_reader(BufReader::new(file))?;
        if instance.name.is_empty() {
            if let Some(stem) = path.file_stem() {
                instance.name = stem.to_string_lossy().into_owned();
            }
        }
        Ok(instance)
    }

    /// Parse an instance from any buffered reader
    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self> {
        let mut name = String::new();
        let mut comment = String::new();
        let mut declared_dimension = None;
        let mut metric = Metric::Euclidean;
        let mut points: Vec<Point> = Vec::new();
        let mut seen_ids = HashSet::new();

        let mut in_coords = false;
        let mut found_section = false;

        for (index, line) in reader.lines().enumerate() {
            let line_no = index + 1;
            let line = line.map_err(|e| match e.kind() {
                io::ErrorKind::InvalidData => Error::format(line_no, "line is not valid UTF-8"),
                _ => Error::Io(e),
            })?;
            let line = line.trim();

            if line.is_empty() {
                continue;
            }
            if line == "EOF" {
                break;
            }

            if line.starts_with("NODE_COORD_SECTION") {
                in_coords = true;
                found_section = true;
                continue;
            }
            if line.ends_with("_SECTION") {
                // Other sections (display data, tours) are not used
                if in_coords {
                    break;
                }
                continue;
            }

            if in_coords {
                let parts: Vec<&str> = line.split_whitespace().collect();
                if parts.len() < 3 {
                    continue;
                }

                let id: usize = parts[0]
                    .parse()
                    .map_err(|_| Error::format(line_no, format!("invalid point id `{}`", parts[0])))?;
                if id == 0 {
                    return Err(Error::format(line_no, "point ids must be positive"));
                }
                if !seen_ids.insert(id) {
                    return Err(Error::format(line_no, format!("duplicate point id {}", id)));
                }
                let x = parse_coordinate(parts[1], line_no, "x")?;
                let y = parse_coordinate(parts[2], line_no, "y")?;

                points.push(Point::new(id, x, y));
                continue;
            }

            let (key, value) = line
                .split_once(':')
                .ok_or_else(|| Error::format(line_no, format!("expected `KEY : value`, found `{}`", line)))?;
            let value = value.trim();

            match key.trim() {
                "NAME" => name = value.to_string(),
                "COMMENT" => comment = value.to_string(),
                "TYPE" => {}
                "DIMENSION" => {
                    let dimension = value
                        .parse()
                        .map_err(|_| Error::format(line_no, format!("invalid dimension `{}`", value)))?;
                    declared_dimension = Some(dimension);
                }
                "EDGE_WEIGHT_TYPE" => metric = Metric::from_edge_weight_type(value),
                other => warn!("Ignoring unknown header field `{}` at line {}", other, line_no),
            }
        }

        if !found_section {
            warn!("Dataset has no NODE_COORD_SECTION; loaded zero points");
        }
        if let Some(dimension) = declared_dimension {
            if dimension != points.len() {
                warn!(
                    "DIMENSION declares {} points but the section lists {}",
                    dimension,
                    points.len()
                );
            }
        }

        debug!("Parsed {} points ({} metric)", points.len(), metric);

        let mut instance = Self::from_points(name, points, metric);
        instance.comment = comment;
        instance.declared_dimension = declared_dimension;
        Ok(instance)
    }

    /// Replace the metric and rebuild the cost matrix.
    pub fn with_metric(mut self, metric: Metric) -> Self {
        if metric != self.metric {
            self.metric = metric;
            self.matrix = CostMatrix::build(&self.points, metric);
        }
        self
    }

    /// Number of points
    pub fn dimension(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn point(&self, index: usize) -> &Point {
        &self.points[index]
    }

    pub fn metric(&self) -> Metric {
        self.metric
    }

    pub fn cost_matrix(&self) -> &CostMatrix {
        &self.matrix
    }

    /// Get the distance between two points
    #[inline]
    pub fn distance(&self, i: usize, j: usize) -> f64 {
        self.matrix.get(i, j)
    }

    /// Calculate total closed tour length
    pub fn tour_length(&self, tour: &[usize]) -> f64 {
        self.matrix.tour_length(tour)
    }

    /// Index of the point with the given dataset id
    pub fn index_of(&self, id: usize) -> Option<usize> {
        self.points.iter().position(|p| p.id == id)
    }

    /// Get statistics about the instance
    pub fn statistics(&self) -> InstanceStatistics {
        let n = self.dimension();
        let mut total = 0.0;
        let mut count = 0usize;
        let mut max_distance: f64 = 0.0;
        for i in 0..n {
            for j in i + 1..n {
                let d = self.distance(i, j);
                total += d;
                count += 1;
                max_distance = max_distance.max(d);
            }
        }
        let avg_distance = if count > 0 { total / count as f64 } else { 0.0 };

        let (min_x, max_x, min_y, max_y) = self.points.iter().fold(
            (f64::INFINITY, f64::NEG_INFINITY, f64::INFINITY, f64::NEG_INFINITY),
            |(min_x, max_x, min_y, max_y), p| {
                (min_x.min(p.x), max_x.max(p.x), min_y.min(p.y), max_y.max(p.y))
            },
        );
        let bounds = if n > 0 {
            Some((min_x, min_y, max_x, max_y))
        } else {
            None
        };

        InstanceStatistics {
            name: self.name.clone(),
            dimension: n,
            declared_dimension: self.declared_dimension,
            metric: self.metric,
            avg_distance,
            max_distance,
            bounds,
        }
    }
}

fn parse_coordinate(token: &str, line_no: usize, axis: &str) -> Result<f64> {
    let value: f64 = token
        .parse()
        .map_err(|_| Error::format(line_no, format!("invalid {} coordinate `{}`", axis, token)))?;
    if !value.is_finite() {
        return Err(Error::format(line_no, format!("non-finite {} coordinate `{}`", axis, token)));
    }
    Ok(value)
}

/// Statistics about a TSP instance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstanceStatistics {
    pub name: String,
    pub dimension: usize,
    pub declared_dimension: Option<usize>,
    pub metric: Metric,
    pub avg_distance: f64,
    pub max_distance: f64,
    /// `(min_x, min_y, max_x, max_y)`
    pub bounds: Option<(f64, f64, f64, f64)>,
}

impl std::fmt::Display for InstanceStatistics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Instance: {}", self.name)?;
        writeln!(f, "  Points: {}", self.dimension)?;
        if let Some(declared) = self.declared_dimension {
            writeln!(f, "  Declared dimension: {}", declared)?;
        }
        writeln!(f, "  Metric: {}", self.metric)?;
        if let Some((min_x, min_y, max_x, max_y)) = self.bounds {
            writeln!(f, "  Bounds: ({:.2}, {:.2}) - ({:.2}, {:.2})", min_x, min_y, max_x, max_y)?;
        }
        writeln!(f, "  Avg distance: {:.2}", self.avg_distance)?;
        writeln!(f, "  Max distance: {:.2}", self.max_distance)
    }
}
