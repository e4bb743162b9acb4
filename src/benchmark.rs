//! Benchmarking and experimentation module for the TSP solvers.
//!
//! Runs every solver on a set of instances, collects one row per run and
//! aggregates them into per-algorithm statistics.

use crate::config::SolverSettings;
use crate::error::Result;
use crate::exact::BruteForce;
use crate::heuristics::annealing::SimulatedAnnealing;
use crate::heuristics::construction::{MultiStartNearestNeighbor, NearestNeighbor};
use crate::heuristics::genetic::GeneticAlgorithm;
use crate::instance::TspInstance;
use crate::solution::Solution;
use crate::solver::TourSolver;

use log::{info, warn};
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;
use std::collections::HashMap;
use std::fs::File;
use std::path::Path;

/// Best known tour lengths of the reference datasets
pub const KNOWN_OPTIMA: &[(&str, f64)] = &[
    ("tiny", 4.0),
    ("att48", 33523.71),
    ("kroD100", 21294.29),
    ("a280", 2586.77),
];

/// Known optimum for a dataset name, if any
pub fn known_optimum(name: &str) -> Option<f64> {
    KNOWN_OPTIMA
        .iter()
        .find(|(known, _)| *known == name)
        .map(|&(_, cost)| cost)
}

/// Relative gap of `cost` above `optimal`, in percent
pub fn gap_percent(cost: f64, optimal: f64) -> f64 {
    if optimal == 0.0 {
        return 0.0;
    }
    (cost - optimal) / optimal * 100.0
}

/// Result of running a single algorithm on an instance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlgorithmResult {
    /// Algorithm name
    pub algorithm: String,
    /// Instance name
    pub instance: String,
    /// Instance dimension
    pub dimension: usize,
    /// Run index for seeded solvers
    pub run: usize,
    pub seed: Option<u64>,
    /// Tour length
    pub cost: f64,
    /// Computation time in seconds
    pub time: f64,
    /// Number of iterations (if applicable)
    pub iterations: Option<usize>,
    /// Gap to the known optimum in percent (if available)
    pub gap_to_optimal: Option<f64>,
    /// RFC 3339 time the run finished
    pub timestamp: String,
}

/// Aggregated statistics for an algorithm
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlgorithmStatistics {
    pub algorithm: String,
    /// Number of recorded runs
    pub runs: usize,
    pub avg_cost: f64,
    pub best_cost: f64,
    pub worst_cost: f64,
    /// Sample standard deviation of the cost (0 for a single run)
    pub std_cost: f64,
    pub avg_time: f64,
    pub total_time: f64,
    /// Average gap to the known optimum
    pub avg_gap: Option<f64>,
}

/// Benchmark configuration
#[derive(Debug, Clone)]
pub struct BenchmarkConfig {
    /// Number of runs per seeded algorithm
    pub num_runs: usize,
    /// Seed of the first run; run `k` uses `base_seed + k`
    pub base_seed: u64,
    /// Solver parameters
    pub settings: SolverSettings,
}

impl Default for BenchmarkConfig {
    fn default() -> Self {
        BenchmarkConfig {
            num_runs: 5,
            base_seed: 0,
            settings: SolverSettings::default(),
        }
    }
}

/// Benchmarking engine
pub struct Benchmark {
    config: BenchmarkConfig,
    results: Vec<AlgorithmResult>,
    best_known: HashMap<String, f64>,
}

impl Benchmark {
    pub fn new(config: BenchmarkConfig) -> Self {
        let best_known = KNOWN_OPTIMA
            .iter()
            .map(|&(name, cost)| (name.to_string(), cost))
            .collect();
        Benchmark {
            config,
            results: Vec::new(),
            best_known,
        }
    }

    /// Set best known solution for an instance
    pub fn set_best_known(&mut self, instance_name: &str, cost: f64) {
        self.best_known.insert(instance_name.to_string(), cost);
    }

    /// Run the deterministic solvers once each
    pub fn run_deterministic(&mut self, instance: &TspInstance) -> Result<()> {
        let mut solvers: Vec<Box<dyn TourSolver>> = vec![
            Box::new(NearestNeighbor::new()),
            Box::new(MultiStartNearestNeighbor::new()),
            Box::new(MultiStartNearestNeighbor::with_two_opt()),
        ];

        if BruteForce::check_size(instance.dimension(), self.config.settings.brute_force_limit).is_ok() {
            solvers.push(Box::new(BruteForce::new()));
        } else {
            info!(
                "Skipping brute force on {} ({} points > limit {})",
                instance.name,
                instance.dimension(),
                self.config.settings.brute_force_limit
            );
        }

        for solver in solvers.iter_mut() {
            let solution = solver.solve(instance)?;
            self.record_result(instance, &solution, 0, None);
        }
        Ok(())
    }

    /// Run the genetic algorithm and simulated annealing once per seed
    pub fn run_metaheuristics(&mut self, instance: &TspInstance) -> Result<()> {
        for run in 0..self.config.num_runs {
            let seed = self.config.base_seed + run as u64;

            let mut ga_config = self.config.settings.genetic.clone();
            ga_config.seed = seed;
            let solution = GeneticAlgorithm::new(ga_config)?.run(instance)?;
            self.record_result(instance, &solution, run, Some(seed));

            let mut sa_config = self.config.settings.annealing.clone();
            sa_config.seed = seed;
            let solution = SimulatedAnnealing::new(sa_config)?.run(instance)?;
            self.record_result(instance, &solution, run, Some(seed));
        }
        Ok(())
    }

    /// Run full benchmark on an instance
    pub fn run_full_benchmark(&mut self, instance: &TspInstance) -> Result<()> {
        info!("Running benchmark on instance: {}", instance.name);
        self.run_deterministic(instance)?;
        self.run_metaheuristics(instance)
    }

    /// Record a result
    fn record_result(&mut self, instance: &TspInstance, solution: &Solution, run: usize, seed: Option<u64>) {
        let gap_to_optimal = self
            .best_known
            .get(&instance.name)
            .map(|&best| gap_percent(solution.cost, best));

        self.results.push(AlgorithmResult {
            algorithm: solution.algorithm.clone(),
            instance: instance.name.clone(),
            dimension: instance.dimension(),
            run,
            seed,
            cost: solution.cost,
            time: solution.computation_time,
            iterations: solution.iterations,
            gap_to_optimal,
            timestamp: chrono::Utc::now().to_rfc3339(),
        });
    }

    /// Compute statistics for each algorithm, best average cost first
    pub fn compute_statistics(&self) -> Vec<AlgorithmStatistics> {
        let mut grouped: HashMap<&str, Vec<&AlgorithmResult>> = HashMap::new();
        for result in &self.results {
            grouped.entry(result.algorithm.as_str()).or_default().push(result);
        }

        let mut statistics: Vec<AlgorithmStatistics> = grouped
            .into_iter()
            .map(|(algorithm, results)| {
                let costs: Vec<f64> = results.iter().map(|r| r.cost).collect();
                let times: Vec<f64> = results.iter().map(|r| r.time).collect();
                let gaps: Vec<f64> = results.iter().filter_map(|r| r.gap_to_optimal).collect();

                let std_cost = if costs.len() > 1 { costs.iter().std_dev() } else { 0.0 };

                AlgorithmStatistics {
                    algorithm: algorithm.to_string(),
                    runs: results.len(),
                    avg_cost: costs.iter().mean(),
                    best_cost: costs.iter().copied().fold(f64::INFINITY, f64::min),
                    worst_cost: costs.iter().copied().fold(f64::NEG_INFINITY, f64::max),
                    std_cost,
                    avg_time: times.iter().mean(),
                    total_time: times.iter().sum(),
                    avg_gap: if gaps.is_empty() { None } else { Some(gaps.iter().mean()) },
                }
            })
            .collect();

        statistics.sort_by(|a, b| a.avg_cost.total_cmp(&b.avg_cost).then_with(|| a.algorithm.cmp(&b.algorithm)));
        statistics
    }

    /// Export results to CSV
    pub fn export_to_csv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let mut writer = csv::Writer::from_writer(File::create(path)?);
        for result in &self.results {
            writer.serialize(result)?;
        }
        writer.flush()?;
        Ok(())
    }

    /// Generate summary report
    pub fn generate_report(&self) -> String {
        let mut report = String::new();

        report.push_str("========================================\n");
        report.push_str("         TSP Benchmark Report\n");
        report.push_str("========================================\n\n");

        report.push_str("Algorithm Performance Summary:\n");
        report.push_str(&"-".repeat(96));
        report.push('\n');
        report.push_str(&format!(
            "{:<32} {:>6} {:>12} {:>12} {:>10} {:>10} {:>10}\n",
            "Algorithm", "Runs", "Avg Cost", "Best Cost", "Std Dev", "Avg Gap%", "Avg Time"
        ));
        report.push_str(&"-".repeat(96));
        report.push('\n');

        for stat in &self.compute_statistics() {
            let gap_str = stat
                .avg_gap
                .map(|g| format!("{:.2}%", g))
                .unwrap_or_else(|| "-".to_string());

            report.push_str(&format!(
                "{:<32} {:>6} {:>12.2} {:>12.2} {:>10.2} {:>10} {:>10.4}\n",
                stat.algorithm, stat.runs, stat.avg_cost, stat.best_cost, stat.std_cost, gap_str, stat.avg_time
            ));
        }

        report.push_str(&"-".repeat(96));
        report.push('\n');

        report.push_str("\nBest Solutions per Instance:\n");
        let mut instance_best: HashMap<&str, &AlgorithmResult> = HashMap::new();
        for result in &self.results {
            let entry = instance_best.entry(result.instance.as_str()).or_insert(result);
            if result.cost < entry.cost {
                *entry = result;
            }
        }

        let mut names: Vec<&str> = instance_best.keys().copied().collect();
        names.sort_unstable();
        for name in names {
            let best = instance_best[name];
            report.push_str(&format!("  {}: {:.2} ({})\n", name, best.cost, best.algorithm));
        }

        report
    }

    /// Get all results
    pub fn results(&self) -> &[AlgorithmResult] {
        &self.results
    }

    /// Get best known values
    pub fn best_known(&self) -> &HashMap<String, f64> {
        &self.best_known
    }
}

/// Load every `.tsp` file of a directory, smallest instance first.
///
/// Files that fail to parse are skipped with a warning.
pub fn load_instances_from_dir<P: AsRef<Path>>(dir: P) -> Result<Vec<TspInstance>> {
    let mut instances = Vec::new();

    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.extension().map_or(false, |e| e == "tsp") {
            match TspInstance::from_file(&path) {
                Ok(instance) => instances.push(instance),
                Err(e) => warn!("Skipping {}: {}", path.display(), e),
            }
        }
    }

    instances.sort_by(|a, b| a.dimension().cmp(&b.dimension()).then_with(|| a.name.cmp(&b.name)));
    Ok(instances)
}
