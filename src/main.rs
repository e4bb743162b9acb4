//! TSP Optimizer - Command Line Interface

use clap::{Parser, Subcommand, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use log::error;
use tsp_optimizer::benchmark::{gap_percent, known_optimum, Benchmark, BenchmarkConfig};
use tsp_optimizer::config::SolverSettings;
use tsp_optimizer::engine::TspEngine;
use tsp_optimizer::heuristics::construction::MultiStartNearestNeighbor;
use tsp_optimizer::instance::TspInstance;
use tsp_optimizer::notifier;
use tsp_optimizer::solution::{SolutionRecord, VERIFY_TOLERANCE};
use tsp_optimizer::Result;

use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Parser)]
#[command(name = "tsp-optimizer")]
#[command(version = "1.0")]
#[command(about = "Solve Traveling Salesman Problem instances")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Solve an instance with one algorithm
    Solve {
        #[arg(short, long)]
        instance: PathBuf,

        /// Algorithm to use
        #[arg(short, long, value_enum, default_value = "nn")]
        algorithm: Algorithm,

        /// JSON settings file
        #[arg(long)]
        settings: Option<PathBuf>,

        /// Random seed for the genetic algorithm and simulated annealing
        #[arg(short, long)]
        seed: Option<u64>,

        #[command(flatten)]
        genetic: GeneticArgs,

        #[command(flatten)]
        annealing: AnnealingArgs,

        /// Largest instance accepted by the brute force solver
        #[arg(long)]
        max_brute_force: Option<usize>,

        /// Write the solution file here
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Decimals of the written distance (0 writes an integer)
        #[arg(long)]
        precision: Option<usize>,

        /// Print the solution as JSON
        #[arg(long)]
        json: bool,

        /// Print the tour
        #[arg(short, long)]
        verbose: bool,
    },

    /// Check a solution file against the instance coordinates
    Verify {
        #[arg(short, long)]
        instance: PathBuf,

        /// Solution file to check
        #[arg(short, long)]
        solution: PathBuf,
    },

    /// Analyze an instance
    Analyze {
        /// Path to the instance file
        #[arg(short, long)]
        instance: PathBuf,
    },

    /// Compare algorithms on an instance
    Compare {
        /// Path to the instance file
        #[arg(short, long)]
        instance: PathBuf,

        /// Number of runs of the seeded algorithms
        #[arg(short, long, default_value = "5")]
        runs: usize,

        /// Known optimal tour length
        #[arg(long)]
        optimal: Option<f64>,

        /// JSON settings file
        #[arg(long)]
        settings: Option<PathBuf>,

        /// Seed of the first run
        #[arg(short, long, default_value = "0")]
        seed: u64,

        /// Output CSV file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(clap::Args)]
struct GeneticArgs {
    /// GA population size
    #[arg(long)]
    population: Option<usize>,

    /// GA generations
    #[arg(long)]
    generations: Option<usize>,

    /// GA crossover probability
    #[arg(long)]
    crossover_rate: Option<f64>,

    /// GA mutation probability
    #[arg(long)]
    mutation_rate: Option<f64>,
}

#[derive(clap::Args)]
struct AnnealingArgs {
    /// SA starting temperature (derived from the dataset when omitted)
    #[arg(long)]
    initial_temperature: Option<f64>,

    /// SA stopping temperature
    #[arg(long)]
    stopping_temperature: Option<f64>,

    /// SA geometric cooling factor
    #[arg(long)]
    cooling_rate: Option<f64>,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum, Debug)]
enum Algorithm {
    /// Nearest Neighbor construction
    Nn,
    /// Nearest Neighbor from every start point
    MultiStart,
    /// Multi-start Nearest Neighbor polished with 2-opt
    TwoOpt,
    /// Exhaustive search
    BruteForce,
    /// Genetic Algorithm
    Ga,
    /// Simulated Annealing
    Sa,
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    let outcome = match cli.command {
        Commands::Solve {
            instance,
            algorithm,
            settings,
            seed,
            genetic,
            annealing,
            max_brute_force,
            output,
            precision,
            json,
            verbose,
        } => load_settings(settings.as_deref()).and_then(|mut settings| {
            apply_overrides(&mut settings, seed, &genetic, &annealing, max_brute_force, precision);
            solve_instance(&instance, algorithm, settings, output, json, verbose)
        }),

        Commands::Verify { instance, solution } => verify_solution(&instance, &solution),

        Commands::Analyze { instance } => analyze_instance(&instance),

        Commands::Compare {
            instance,
            runs,
            optimal,
            settings,
            seed,
            output,
        } => load_settings(settings.as_deref())
            .and_then(|settings| compare_algorithms(&instance, runs, optimal, settings, seed, output)),
    };

    match outcome {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            error!("{}", e);
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

fn load_settings(path: Option<&Path>) -> Result<SolverSettings> {
    match path {
        Some(path) => SolverSettings::from_file(path),
        None => Ok(SolverSettings::default()),
    }
}

fn apply_overrides(
    settings: &mut SolverSettings,
    seed: Option<u64>,
    genetic: &GeneticArgs,
    annealing: &AnnealingArgs,
    max_brute_force: Option<usize>,
    precision: Option<usize>,
) {
    if seed.is_some() {
        settings.seed = seed;
    }
    if let Some(population) = genetic.population {
        settings.genetic.population_size = population;
    }
    if let Some(generations) = genetic.generations {
        settings.genetic.generations = generations;
    }
    if let Some(rate) = genetic.crossover_rate {
        settings.genetic.crossover_rate = rate;
    }
    if let Some(rate) = genetic.mutation_rate {
        settings.genetic.mutation_rate = rate;
    }
    if let Some(t) = annealing.initial_temperature {
        settings.annealing.initial_temperature = Some(t);
    }
    if let Some(t) = annealing.stopping_temperature {
        settings.annealing.stopping_temperature = t;
    }
    if let Some(rate) = annealing.cooling_rate {
        settings.annealing.cooling_rate = rate;
    }
    if let Some(limit) = max_brute_force {
        settings.brute_force_limit = limit;
    }
    if let Some(precision) = precision {
        settings.solution_precision = precision;
    }
}

/// Spinner showing the best distance reported by the running solver
fn progress_spinner(label: &str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::with_template("{spinner} [{elapsed_precise}] {prefix}: {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_prefix(label.to_string());
    spinner.enable_steady_tick(Duration::from_millis(120));

    let handle = spinner.clone();
    notifier::register(move |distance, view| {
        handle.set_message(format!("best {:.2} over {} points", distance, view.len()));
    });
    spinner
}

fn solve_instance(
    path: &Path,
    algorithm: Algorithm,
    settings: SolverSettings,
    output: Option<PathBuf>,
    json: bool,
    verbose: bool,
) -> Result<i32> {
    settings.validate()?;
    println!("Loading instance from {:?}...", path);
    let instance = TspInstance::from_file(path)?;
    let mut engine = TspEngine::with_settings(instance, settings.clone());

    println!("Solving with {:?} algorithm...", algorithm);
    let spinner = progress_spinner(&format!("{:?}", algorithm));

    let solved = match algorithm {
        Algorithm::Nn => engine.solve_nearest_neighbor().map(|_| ()),
        Algorithm::MultiStart => engine.solve_with(&mut MultiStartNearestNeighbor::new()).map(|_| ()),
        Algorithm::TwoOpt => engine
            .solve_with(&mut MultiStartNearestNeighbor::with_two_opt())
            .map(|_| ()),
        Algorithm::BruteForce => engine.solve_brute_force().map(|_| ()),
        Algorithm::Ga => engine.solve_genetic(settings.genetic_config()).map(|_| ()),
        Algorithm::Sa => engine.solve_annealing(settings.annealing_config()).map(|_| ()),
    };

    notifier::clear();
    spinner.finish_and_clear();
    solved?;

    let Some(solution) = engine.solution() else {
        return Ok(1);
    };

    if json {
        println!("{}", serde_json::to_string_pretty(solution)?);
    } else {
        println!("\n========== Results ==========");
        println!("Instance: {} ({} points, {})", engine.instance().name, engine.point_count(), engine.instance().metric());
        println!("Algorithm: {}", solution.algorithm);
        println!("Distance: {:.2}", solution.cost);
        println!("Time: {:.4}s", solution.computation_time);
        if let Some(iter) = solution.iterations {
            println!("Iterations: {}", iter);
        }
        if let Some(optimal) = known_optimum(&engine.instance().name) {
            println!("Gap to optimum {:.2}: {:.2}%", optimal, gap_percent(solution.cost, optimal));
        }
        if verbose {
            println!("\nTour: {:?}", solution.ids(engine.instance()));
        }
    }

    if let Some(out_path) = output {
        engine.write_solution(&out_path, None)?;
        println!("\nSolution saved to {:?}", out_path);
    }

    Ok(0)
}

fn verify_solution(instance_path: &Path, solution_path: &Path) -> Result<i32> {
    let instance = TspInstance::from_file(instance_path)?;
    let record = SolutionRecord::from_file(solution_path)?;
    let verification = record.verify(&instance)?;

    println!("Stored distance:     {:.2}", verification.stored);
    println!("Recomputed distance: {:.2}", verification.recomputed);
    println!("Relative gap:        {:.4}%", verification.relative_gap * 100.0);

    if verification.within_tolerance {
        println!("OK: within {:.0}% tolerance", VERIFY_TOLERANCE * 100.0);
        Ok(0)
    } else {
        println!("FAILED: outside {:.0}% tolerance", VERIFY_TOLERANCE * 100.0);
        Ok(1)
    }
}

fn analyze_instance(path: &Path) -> Result<i32> {
    let instance = TspInstance::from_file(path)?;

    println!("========== Instance Analysis ==========\n");
    println!("{}", instance.statistics());

    let mut engine = TspEngine::new(instance);
    if engine.point_count() == 0 {
        return Ok(0);
    }

    let nn_cost = engine.solve_nearest_neighbor()?.cost;
    let polished_cost = engine
        .solve_with(&mut MultiStartNearestNeighbor::with_two_opt())?
        .cost;

    println!("\nQuick Solution Estimates:");
    println!("  Nearest Neighbor: {:.2}", nn_cost);
    println!("  Multi-Start + 2-opt: {:.2}", polished_cost);
    if let Some(optimal) = known_optimum(&engine.instance().name) {
        println!("  Known optimum: {:.2}", optimal);
    }

    Ok(0)
}

fn compare_algorithms(
    path: &Path,
    runs: usize,
    optimal: Option<f64>,
    settings: SolverSettings,
    seed: u64,
    output: Option<PathBuf>,
) -> Result<i32> {
    settings.validate()?;
    let instance = TspInstance::from_file(path)?;

    println!("Comparing algorithms on {} (n={})...\n", instance.name, instance.dimension());

    let config = BenchmarkConfig {
        num_runs: runs,
        base_seed: seed,
        settings,
    };
    let mut benchmark = Benchmark::new(config);
    if let Some(optimal) = optimal {
        benchmark.set_best_known(&instance.name, optimal);
    }

    let spinner = progress_spinner("compare");
    let outcome = benchmark.run_full_benchmark(&instance);
    notifier::clear();
    spinner.finish_and_clear();
    outcome?;

    println!("{}", benchmark.generate_report());

    if let Some(out_path) = output {
        benchmark.export_to_csv(&out_path)?;
        println!("\nResults exported to {:?}", out_path);
    }

    Ok(0)
}
