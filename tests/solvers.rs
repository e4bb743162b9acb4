//! End-to-end solver checks on the datasets under tests/data.

use std::path::PathBuf;

use tsp_optimizer::benchmark::load_instances_from_dir;
use tsp_optimizer::distance::Metric;
use tsp_optimizer::exact::BruteForce;
use tsp_optimizer::heuristics::annealing::{SaConfig, SaInit, SimulatedAnnealing};
use tsp_optimizer::heuristics::construction::{MultiStartNearestNeighbor, NearestNeighbor};
use tsp_optimizer::heuristics::genetic::{GaConfig, GeneticAlgorithm, MutationType};
use tsp_optimizer::solution::SolutionRecord;
use tsp_optimizer::{Error, Point, Route, TourSolver, TspEngine, TspInstance};

const CIRCLE100_OPTIMUM: f64 = 6282.151815150129;
const RANDOM10_OPTIMUM: f64 = 2789.240798121472;
const GEO5_OPTIMUM_KM: f64 = 4874.7350640747345;
/// 100 unit edges of length 100 close the 10x10 grid
const GRID100_OPTIMUM: f64 = 10_000.0;
/// Absolute allowance on top of the 5% bound for 100-point runs
const GRID100_SLACK: f64 = 250.0;

fn within_grid_bound(cost: f64) -> bool {
    cost <= GRID100_OPTIMUM * 1.05 + GRID100_SLACK
}

fn data_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests").join("data")
}

fn dataset(name: &str) -> PathBuf {
    data_dir().join(name)
}

fn load(name: &str) -> TspInstance {
    TspInstance::from_file(dataset(name)).unwrap()
}

fn is_permutation(tour: &[usize], n: usize) -> bool {
    Route::new(tour.to_vec(), n).is_ok()
}

fn quick_ga(seed: u64) -> GaConfig {
    GaConfig {
        population_size: 100,
        generations: 300,
        mutation_rate: 0.3,
        mutation: MutationType::Inversion,
        seed,
        ..Default::default()
    }
}

#[test]
fn test_unit_square_nearest_neighbor() {
    let mut engine = TspEngine::from_file(dataset("tiny.tsp")).unwrap();
    assert_eq!(engine.point_count(), 4);

    engine.solve_nearest_neighbor().unwrap();
    assert!((engine.solution_distance() - 4.0).abs() < 1e-12);
}

#[test]
fn test_every_solver_returns_a_permutation() {
    let instance = load("random10.tsp");
    let n = instance.dimension();

    let mut solvers: Vec<Box<dyn TourSolver>> = vec![
        Box::new(NearestNeighbor::new()),
        Box::new(MultiStartNearestNeighbor::with_two_opt()),
        Box::new(BruteForce::new()),
        Box::new(GeneticAlgorithm::new(quick_ga(1)).unwrap()),
        Box::new(SimulatedAnnealing::new(SaConfig::default()).unwrap()),
    ];

    for solver in solvers.iter_mut() {
        let solution = solver.solve(&instance).unwrap();
        assert!(is_permutation(solution.tour(), n), "{} broke the tour", solver.name());
        assert!((solution.cost - instance.tour_length(solution.tour())).abs() < 1e-6);
    }
}

#[test]
fn test_brute_force_bounds_every_heuristic() {
    let instance = load("random10.tsp");
    let exact = BruteForce::new().solve(&instance).unwrap();
    assert!((exact.cost - RANDOM10_OPTIMUM).abs() < 1e-6);

    let nn = NearestNeighbor::new().solve(&instance).unwrap();
    let ga = GeneticAlgorithm::new(quick_ga(5)).unwrap().solve(&instance).unwrap();
    let sa = SimulatedAnnealing::new(SaConfig::default()).unwrap().solve(&instance).unwrap();

    for cost in [nn.cost, ga.cost, sa.cost] {
        assert!(exact.cost <= cost + 1e-9);
    }
}

#[test]
fn test_metaheuristics_near_optimum_on_reference_data() {
    let instance = load("random10.tsp");

    let ga = GeneticAlgorithm::new(quick_ga(42)).unwrap().solve(&instance).unwrap();
    assert!(ga.cost <= RANDOM10_OPTIMUM * 1.05, "GA {}", ga.cost);

    for init in [SaInit::NearestNeighbor, SaInit::Identity] {
        let config = SaConfig::default().with_initial_route(init);
        let sa = SimulatedAnnealing::new(config).unwrap().solve(&instance).unwrap();
        assert!(sa.cost <= RANDOM10_OPTIMUM * 1.05, "SA from {:?}: {}", init, sa.cost);
    }
}

#[test]
fn test_grid_is_out_of_reach_for_nearest_neighbor() {
    let instance = load("grid100.tsp");
    let nn = NearestNeighbor::new().solve(&instance).unwrap();
    assert!(!within_grid_bound(nn.cost), "NN {}", nn.cost);
}

#[test]
fn test_genetic_algorithm_on_grid() {
    let instance = load("grid100.tsp");
    let config = GaConfig {
        population_size: 50,
        generations: 150,
        ..Default::default()
    };

    let solution = GeneticAlgorithm::new(config).unwrap().solve(&instance).unwrap();
    assert!(solution.cost >= GRID100_OPTIMUM - 1e-6);
    assert!(within_grid_bound(solution.cost), "GA {}", solution.cost);
}

#[test]
fn test_annealing_on_grid() {
    let instance = load("grid100.tsp");

    for init in [SaInit::NearestNeighbor, SaInit::Identity] {
        let config = SaConfig::default().with_initial_route(init);
        let solution = SimulatedAnnealing::new(config).unwrap().solve(&instance).unwrap();
        assert!(solution.cost >= GRID100_OPTIMUM - 1e-6);
        assert!(within_grid_bound(solution.cost), "SA from {:?}: {}", init, solution.cost);
    }
}

#[test]
fn test_nearest_neighbor_reproducible_across_engines() {
    let mut first = TspEngine::from_file(dataset("random10.tsp")).unwrap();
    let mut second = TspEngine::from_file(dataset("random10.tsp")).unwrap();

    let a = first.solve_nearest_neighbor().unwrap().clone();
    let again = first.solve_nearest_neighbor().unwrap().clone();
    let b = second.solve_nearest_neighbor().unwrap().clone();

    assert_eq!(a.tour(), again.tour());
    assert_eq!(a.tour(), b.tour());
    assert_eq!(a.cost.to_bits(), b.cost.to_bits());
}

#[test]
fn test_seeded_metaheuristics_reproducible() {
    let instance = load("random10.tsp");

    let ga_a = GeneticAlgorithm::new(quick_ga(9)).unwrap().solve(&instance).unwrap();
    let ga_b = GeneticAlgorithm::new(quick_ga(9)).unwrap().solve(&instance).unwrap();
    assert_eq!(ga_a.tour(), ga_b.tour());

    let config = SaConfig::default().with_seed(9);
    let sa_a = SimulatedAnnealing::new(config.clone()).unwrap().solve(&instance).unwrap();
    let sa_b = SimulatedAnnealing::new(config).unwrap().solve(&instance).unwrap();
    assert_eq!(sa_a.tour(), sa_b.tour());
}

#[test]
fn test_empty_dataset_for_every_solver() {
    let mut engine = TspEngine::from_file(dataset("empty.tsp")).unwrap();
    assert_eq!(engine.point_count(), 0);

    engine.solve_nearest_neighbor().unwrap();
    assert_eq!(engine.solution_distance(), 0.0);
    engine.solve_brute_force().unwrap();
    assert_eq!(engine.solution_distance(), 0.0);
    engine.solve_genetic(quick_ga(1)).unwrap();
    assert!(engine.solution().unwrap().tour().is_empty());
    engine.solve_annealing(SaConfig::default()).unwrap();
    assert!(engine.solution().unwrap().tour().is_empty());
}

#[test]
fn test_geographic_dataset_uses_great_circle() {
    let instance = load("geo5.tsp");
    assert_eq!(instance.metric(), Metric::Haversine);

    let exact = BruteForce::new().solve(&instance).unwrap();
    assert!((exact.cost - GEO5_OPTIMUM_KM).abs() < 1e-3);
}

#[test]
fn test_written_solution_verifies() {
    let dir = tempfile::tempdir().unwrap();
    let mut engine = TspEngine::from_file(dataset("random10.tsp")).unwrap();
    engine.solve_with(&mut MultiStartNearestNeighbor::with_two_opt()).unwrap();

    for (precision, name) in [(0, "integer.sol"), (3, "decimal.sol")] {
        let path = dir.path().join(name);
        engine.write_solution(&path, Some(precision)).unwrap();

        let record = SolutionRecord::from_file(&path).unwrap();
        let expected_ids = engine.solution().unwrap().ids(engine.instance());
        assert_eq!(record.ids, expected_ids);

        let verification = record.verify(engine.instance()).unwrap();
        assert!(verification.within_tolerance);
        assert!(verification.relative_gap < 0.01);
    }
}

#[test]
fn test_tampered_solution_fails_verification() {
    let instance = load("tiny.tsp");
    let record = SolutionRecord {
        distance: 3.0,
        ids: vec![1, 3, 2, 4],
    };
    // The listed order walks the square's perimeter, 4.0
    let verification = record.verify(&instance).unwrap();
    assert!(!verification.within_tolerance);

    let unknown = SolutionRecord {
        distance: 4.0,
        ids: vec![1, 2, 3, 9],
    };
    assert!(matches!(unknown.verify(&instance), Err(Error::InvalidRoute(_))));
}

#[test]
fn test_missing_dataset() {
    let err = TspInstance::from_file(dataset("does_not_exist.tsp")).unwrap_err();
    assert!(matches!(err, Error::DatasetNotFound { .. }));
}

#[test]
fn test_invalid_parameters_rejected_before_solving() {
    let mut engine = TspEngine::from_file(dataset("tiny.tsp")).unwrap();

    let ga = GaConfig {
        mutation_rate: -0.5,
        ..Default::default()
    };
    assert!(matches!(engine.solve_genetic(ga), Err(Error::Validation { .. })));

    let sa = SaConfig::default().with_cooling_rate(1.5);
    assert!(matches!(engine.solve_annealing(sa), Err(Error::Validation { .. })));
    assert!(engine.solution().is_none());
}

#[test]
fn test_point_state_accessors() {
    let point = Point::with_state(1, 10.0, 20.0, Some(0), false);
    assert_eq!(point.id(), 1);
    assert_eq!(point.x(), 10.0);
    assert_eq!(point.y(), 20.0);
    assert_eq!(point.position(), Some(0));
    assert!(!point.is_visited());
}

#[test]
fn test_load_instances_from_dir_sorted_by_size() {
    let instances = load_instances_from_dir(data_dir()).unwrap();
    let names: Vec<&str> = instances.iter().map(|i| i.name.as_str()).collect();
    assert_eq!(names, ["empty", "tiny", "geo5", "random10", "circle100", "grid100"]);
}

#[test]
fn test_two_opt_solves_circle() {
    let instance = load("circle100.tsp");
    let solution = MultiStartNearestNeighbor::with_two_opt().solve(&instance).unwrap();
    assert!((solution.cost - CIRCLE100_OPTIMUM).abs() < 1e-3);
}

#[test]
#[ignore = "long-running: 9000 generations on 100 points"]
fn test_genetic_algorithm_on_100_points() {
    let instance = load("grid100.tsp");
    let config = GaConfig {
        population_size: 300,
        generations: 9000,
        crossover_rate: 0.7,
        mutation_rate: 0.07,
        ..Default::default()
    };

    let solution = GeneticAlgorithm::new(config).unwrap().solve(&instance).unwrap();
    assert!(within_grid_bound(solution.cost), "GA {}", solution.cost);
}
