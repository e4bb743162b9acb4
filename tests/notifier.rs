//! Behaviour of the process-wide notification slot.
//!
//! The slot is global, so every test here holds `SLOT_GUARD` for its whole
//! body and leaves the slot empty.

use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tsp_optimizer::distance::Metric;
use tsp_optimizer::exact::BruteForce;
use tsp_optimizer::heuristics::annealing::{SaConfig, SaInit, SimulatedAnnealing};
use tsp_optimizer::heuristics::genetic::{GaConfig, GeneticAlgorithm};
use tsp_optimizer::notifier::{self, EngineView, FrameRecorder};
use tsp_optimizer::{Point, TourSolver, TspEngine, TspInstance};

static SLOT_GUARD: Mutex<()> = Mutex::new(());

fn exclusive() -> MutexGuard<'static, ()> {
    let guard = SLOT_GUARD.lock().unwrap_or_else(PoisonError::into_inner);
    notifier::clear();
    guard
}

fn random10() -> TspInstance {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/data/random10.tsp");
    TspInstance::from_file(path).unwrap()
}

fn pentagon() -> TspInstance {
    let points = [(0.0, 0.0), (4.0, 0.0), (5.0, 3.0), (2.0, 5.0), (-1.0, 3.0)]
        .iter()
        .enumerate()
        .map(|(i, &(x, y))| Point::new(i + 1, x, y))
        .collect();
    TspInstance::from_points("pentagon", points, Metric::Euclidean)
}

#[test]
fn test_empty_slot_is_a_no_op() {
    let _guard = exclusive();
    assert!(!notifier::is_registered());

    let instance = pentagon();
    notifier::notify(1.0, &EngineView::new(&instance, &[0, 1, 2, 3, 4]));

    let mut engine = TspEngine::new(instance);
    engine.solve_nearest_neighbor().unwrap();
    assert!(engine.solution_distance() > 0.0);
}

#[test]
fn test_register_replaces_and_clear_empties() {
    let _guard = exclusive();
    let instance = pentagon();
    let tour = [0, 1, 2, 3, 4];
    let calls = Arc::new(Mutex::new(Vec::new()));

    let first = Arc::clone(&calls);
    notifier::register(move |_, _| first.lock().unwrap().push("first"));
    let second = Arc::clone(&calls);
    notifier::register(move |_, _| second.lock().unwrap().push("second"));

    notifier::notify(1.0, &EngineView::new(&instance, &tour));
    notifier::set(None);
    notifier::notify(2.0, &EngineView::new(&instance, &tour));

    assert_eq!(*calls.lock().unwrap(), vec!["second"]);
    assert!(!notifier::is_registered());
}

#[test]
fn test_nearest_neighbor_notifies_once() {
    let _guard = exclusive();
    let recorder = FrameRecorder::new();
    recorder.install();

    let mut engine = TspEngine::new(pentagon());
    engine.solve_nearest_neighbor().unwrap();
    notifier::clear();

    let frames = recorder.take();
    assert_eq!(frames.len(), 1);
    assert_eq!(frames[0].distance, engine.solution_distance());
    assert_eq!(frames[0].ids, engine.solution().unwrap().ids(engine.instance()));
    assert!(recorder.is_empty());
}

#[test]
fn test_brute_force_improvements_decrease() {
    let _guard = exclusive();
    let recorder = FrameRecorder::new();
    recorder.install();

    let solution = BruteForce::new().solve(&pentagon()).unwrap();
    notifier::clear();

    let frames = recorder.frames();
    assert!(!frames.is_empty());
    for pair in frames.windows(2) {
        assert!(pair[1].distance < pair[0].distance);
    }
    let last = frames.last().unwrap();
    assert!((last.distance - solution.cost).abs() < 1e-9);
    assert_eq!(last.coords.len(), 5);
}

#[test]
fn test_genetic_algorithm_notifies_every_generation() {
    let _guard = exclusive();
    let recorder = FrameRecorder::new();
    recorder.install();

    let config = GaConfig {
        population_size: 30,
        generations: 25,
        ..Default::default()
    };
    let solution = GeneticAlgorithm::new(config).unwrap().solve(&random10()).unwrap();
    notifier::clear();

    let frames = recorder.take();
    assert_eq!(frames.len(), 25);
    for pair in frames.windows(2) {
        assert!(pair[1].distance <= pair[0].distance);
    }
    assert!((frames[24].distance - solution.cost).abs() < 1e-6);
}

#[test]
fn test_annealing_reports_each_new_best() {
    let _guard = exclusive();
    let recorder = FrameRecorder::new();
    recorder.install();

    let instance = random10();
    let config = SaConfig::default().with_initial_route(SaInit::Identity);
    let solution = SimulatedAnnealing::new(config).unwrap().solve(&instance).unwrap();
    notifier::clear();

    let frames = recorder.take();
    assert!(frames.len() >= 2);
    let identity: Vec<usize> = (0..10).collect();
    assert!((frames[0].distance - instance.tour_length(&identity)).abs() < 1e-9);
    assert!((frames.last().unwrap().distance - solution.cost).abs() < 1e-6);
}

#[test]
fn test_callback_sees_point_coordinates() {
    let _guard = exclusive();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    notifier::register(move |_, view| {
        let coords: Vec<(f64, f64)> = (0..view.len()).map(|i| (view.x(i), view.y(i))).collect();
        sink.lock().unwrap().push(coords);
    });

    let mut engine = TspEngine::new(pentagon());
    engine.solve_nearest_neighbor().unwrap();
    notifier::clear();

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0][0], (0.0, 0.0));
}
