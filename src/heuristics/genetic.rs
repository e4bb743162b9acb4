//! Genetic Algorithm for the TSP.
//!
//! Individuals are permutations of the point indices. The algorithm offers:
//! - Permutation-preserving crossover operators (OX, PMX, Cycle)
//! - Swap, inversion and insertion mutation
//! - Tournament, roulette wheel and rank-based selection
//! - Elitism, so the best tour never gets worse from one generation to the next
//! - Optional 2-opt polishing of offspring (memetic search)
//! - Adaptive mutation, doubled while the best tour stagnates
//!
//! Every child goes through [`Route::new`], so a broken operator surfaces as
//! [`Error::InvalidRoute`](crate::error::Error::InvalidRoute) instead of a
//! silently corrupted tour.

use crate::distance::CostMatrix;
use crate::error::{Error, Result};
use crate::heuristics::local_search::TwoOpt;
use crate::instance::TspInstance;
use crate::route::Route;
use crate::solution::Solution;
use crate::solver::{report, TourSolver};
use log::{debug, info};
use ordered_float::OrderedFloat;
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// Generations between two progress log lines
const LOG_INTERVAL: usize = 100;

/// Generations without a new best before adaptive mutation kicks in
const STAGNATION_THRESHOLD: usize = 10;

/// Upper bound of the adapted mutation rate
const MAX_ADAPTED_MUTATION_RATE: f64 = 0.5;

/// Individual in the genetic algorithm population
#[derive(Debug, Clone)]
pub struct Individual {
    pub route: Route,
    /// Closed tour length
    pub cost: f64,
    /// `1 / (1 + cost)`, higher is better
    pub fitness: f64,
}

impl Individual {
    pub fn new(route: Route, matrix: &CostMatrix) -> Self {
        let cost = route.cost(matrix);
        Individual {
            route,
            cost,
            fitness: 1.0 / (1.0 + cost),
        }
    }
}

/// Crossover operator types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CrossoverType {
    /// Order Crossover (OX)
    OrderCrossover,
    /// Partially Mapped Crossover (PMX)
    PMX,
    /// Cycle Crossover
    CycleCrossover,
}

/// Mutation operator types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MutationType {
    /// Swap two random positions
    Swap,
    /// Reverse a random segment
    Inversion,
    /// Move a random point to a random position
    Insertion,
}

/// Selection method types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SelectionType {
    Tournament,
    RouletteWheel,
    RankBased,
}

/// Genetic Algorithm configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GaConfig {
    /// Population size
    pub population_size: usize,
    /// Number of generations
    pub generations: usize,
    /// Crossover probability, in [0, 1]
    pub crossover_rate: f64,
    /// Mutation probability, in [0, 1]
    pub mutation_rate: f64,
    /// Best individuals copied unchanged into the next generation
    pub elite_count: usize,
    /// Tournament size for selection
    pub tournament_size: usize,
    pub crossover: CrossoverType,
    pub mutation: MutationType,
    pub selection: SelectionType,
    /// Polish offspring with 2-opt (memetic algorithm)
    pub use_local_search: bool,
    /// Probability that an offspring is polished, in [0, 1]
    pub local_search_prob: f64,
    /// Double the mutation rate while the best tour stagnates
    pub adaptive_mutation: bool,
    /// Random seed
    pub seed: u64,
}

impl Default for GaConfig {
    fn default() -> Self {
        GaConfig {
            population_size: 300,
            generations: 1000,
            crossover_rate: 0.7,
            mutation_rate: 0.07,
            elite_count: 1,
            tournament_size: 5,
            crossover: CrossoverType::OrderCrossover,
            mutation: MutationType::Inversion,
            selection: SelectionType::Tournament,
            use_local_search: true,
            local_search_prob: 0.2,
            adaptive_mutation: true,
            seed: 42,
        }
    }
}

impl GaConfig {
    pub fn validate(&self) -> Result<()> {
        if self.population_size == 0 {
            return Err(Error::validation("population_size", "must be a positive integer"));
        }
        if self.generations == 0 {
            return Err(Error::validation("generations", "must be a positive integer"));
        }
        check_rate("crossover_rate", self.crossover_rate)?;
        check_rate("mutation_rate", self.mutation_rate)?;
        check_rate("local_search_prob", self.local_search_prob)?;
        if self.elite_count > self.population_size {
            return Err(Error::validation(
                "elite_count",
                format!(
                    "{} exceeds the population size {}",
                    self.elite_count, self.population_size
                ),
            ));
        }
        if self.tournament_size == 0 {
            return Err(Error::validation("tournament_size", "must be a positive integer"));
        }
        Ok(())
    }
}

fn check_rate(parameter: &'static str, rate: f64) -> Result<()> {
    if !(0.0..=1.0).contains(&rate) {
        return Err(Error::validation(
            parameter,
            format!("must be within [0, 1], got {}", rate),
        ));
    }
    Ok(())
}

/// Genetic Algorithm implementation
pub struct GeneticAlgorithm<R: Rng = ChaCha8Rng> {
    config: GaConfig,
    rng: R,
    population: Vec<Individual>,
    best_individual: Option<Individual>,
    generation: usize,
    stagnation: usize,
    mutation_rate: f64,
}

impl GeneticAlgorithm<ChaCha8Rng> {
    /// Validate `config` and seed the generator from `config.seed`.
    pub fn new(config: GaConfig) -> Result<Self> {
        let rng = ChaCha8Rng::seed_from_u64(config.seed);
        Self::with_rng(config, rng)
    }
}

impl<R: Rng> GeneticAlgorithm<R> {
    /// Validate `config` and draw all randomness from `rng`.
    pub fn with_rng(config: GaConfig, rng: R) -> Result<Self> {
        config.validate()?;
        let mutation_rate = config.mutation_rate;
        Ok(GeneticAlgorithm {
            config,
            rng,
            population: Vec::new(),
            best_individual: None,
            generation: 0,
            stagnation: 0,
            mutation_rate,
        })
    }

    pub fn config(&self) -> &GaConfig {
        &self.config
    }

    /// Initialize population with random permutations
    fn initialize_population(&mut self, instance: &TspInstance) -> Result<()> {
        let n = instance.dimension();
        self.population.clear();

        for _ in 0..self.config.population_size {
            let mut order: Vec<usize> = (0..n).collect();
            order.shuffle(&mut self.rng);
            let route = Route::new(order, n)?;
            self.population.push(Individual::new(route, instance.cost_matrix()));
        }

        self.sort_population();
        self.best_individual = self.population.first().cloned();
        Ok(())
    }

    fn sort_population(&mut self) {
        self.population.sort_by_key(|ind| OrderedFloat(ind.cost));
    }

    /// Tournament selection
    fn tournament_select(&mut self) -> usize {
        let size = self.population.len();
        let mut best_idx = self.rng.gen_range(0..size);

        for _ in 1..self.config.tournament_size {
            let idx = self.rng.gen_range(0..size);
            if self.population[idx].fitness > self.population[best_idx].fitness {
                best_idx = idx;
            }
        }

        best_idx
    }

    /// Roulette wheel selection
    fn roulette_select(&mut self) -> usize {
        let total: f64 = self.population.iter().map(|i| i.fitness).sum();
        let mut pick = self.rng.gen::<f64>() * total;

        for (i, individual) in self.population.iter().enumerate() {
            pick -= individual.fitness;
            if pick <= 0.0 {
                return i;
            }
        }

        self.population.len() - 1
    }

    /// Rank-based selection; relies on the population being sorted best first
    fn rank_select(&mut self) -> usize {
        let n = self.population.len();
        let total_rank: usize = (n * (n + 1)) / 2;
        let pick = self.rng.gen_range(0..total_rank);

        let mut cumulative = 0;
        for rank in 0..n {
            cumulative += n - rank;
            if cumulative > pick {
                return rank;
            }
        }

        n - 1
    }

    /// Select a parent index using the configured method
    fn select_parent(&mut self) -> usize {
        match self.config.selection {
            SelectionType::Tournament => self.tournament_select(),
            SelectionType::RouletteWheel => self.roulette_select(),
            SelectionType::RankBased => self.rank_select(),
        }
    }

    /// Perform crossover using configured method
    fn crossover(&mut self, first: usize, second: usize) -> Vec<usize> {
        let parent1 = self.population[first].route.as_slice();
        let parent2 = self.population[second].route.as_slice();

        if self.rng.gen::<f64>() >= self.config.crossover_rate {
            return parent1.to_vec();
        }

        match self.config.crossover {
            CrossoverType::OrderCrossover => order_crossover(&mut self.rng, parent1, parent2),
            CrossoverType::PMX => pmx_crossover(&mut self.rng, parent1, parent2),
            CrossoverType::CycleCrossover => cycle_crossover(parent1, parent2),
        }
    }

    /// Perform mutation using configured method
    fn mutate(&mut self, route: &mut Route) -> Result<()> {
        if self.rng.gen::<f64>() >= self.mutation_rate {
            return Ok(());
        }
        mutate(&mut self.rng, self.config.mutation, route)
    }

    /// Create new generation
    fn evolve(&mut self, instance: &TspInstance) -> Result<()> {
        let n = instance.dimension();
        let size = self.config.population_size;
        let mut new_population = Vec::with_capacity(size);

        new_population.extend(self.population.iter().take(self.config.elite_count).cloned());

        while new_population.len() < size {
            let parent1 = self.select_parent();
            let parent2 = self.select_parent();

            let child = self.crossover(parent1, parent2);
            let mut route = Route::new(child, n)?;
            self.mutate(&mut route)?;
            if self.config.use_local_search && self.rng.gen::<f64>() < self.config.local_search_prob {
                TwoOpt::new().optimize(instance.cost_matrix(), &mut route)?;
            }
            route.validate()?;

            new_population.push(Individual::new(route, instance.cost_matrix()));
        }

        self.population = new_population;
        self.sort_population();

        if let Some(best) = self.population.first() {
            let improved = self
                .best_individual
                .as_ref()
                .map_or(true, |current| best.cost < current.cost);
            if improved {
                self.best_individual = Some(best.clone());
                self.stagnation = 0;
            } else {
                self.stagnation += 1;
            }
        }

        if self.config.adaptive_mutation {
            self.mutation_rate = if self.stagnation > STAGNATION_THRESHOLD {
                (self.config.mutation_rate * 2.0).min(MAX_ADAPTED_MUTATION_RATE)
            } else {
                self.config.mutation_rate
            };
        }

        self.generation += 1;
        Ok(())
    }

    /// Run the genetic algorithm
    pub fn run(&mut self, instance: &TspInstance) -> Result<Solution> {
        let start = std::time::Instant::now();
        self.generation = 0;
        self.best_individual = None;
        self.stagnation = 0;
        self.mutation_rate = self.config.mutation_rate;

        if instance.is_empty() {
            return Ok(Solution::empty("GeneticAlgorithm"));
        }

        info!(
            "[GA] {} points, population {}, {} generations",
            instance.dimension(),
            self.config.population_size,
            self.config.generations
        );

        self.initialize_population(instance)?;

        while self.generation < self.config.generations {
            self.evolve(instance)?;

            if let Some(best) = &self.best_individual {
                report(instance, best.cost, best.route.as_slice());

                if self.generation % LOG_INTERVAL == 0 {
                    debug!(
                        "[GA] Gen {}  Best cost {:.3}  Diversity {:.2}  Mutation {:.3}  Elapsed {:.2}s",
                        self.generation,
                        best.cost,
                        self.population_diversity(),
                        self.mutation_rate,
                        start.elapsed().as_secs_f64()
                    );
                }
            }
        }

        let mut route = self
            .best_individual
            .as_ref()
            .map(|best| best.route.clone())
            .ok_or_else(|| Error::InvalidRoute("population produced no individual".to_string()))?;
        route.rotate_to(0);

        let mut solution = Solution::from_route(instance, route, "GeneticAlgorithm");
        solution.computation_time = start.elapsed().as_secs_f64();
        solution.iterations = Some(self.generation);

        info!(
            "[GA] best cost {:.3} after {} generations ({:.2}s)",
            solution.cost, self.generation, solution.computation_time
        );
        Ok(solution)
    }

    pub fn population(&self) -> &[Individual] {
        &self.population
    }

    /// Get population diversity (average number of differing positions
    /// between the first individuals)
    pub fn population_diversity(&self) -> f64 {
        let sample = self.population.len().min(20);
        if sample < 2 {
            return 0.0;
        }

        let mut total_diff = 0.0;
        let mut count = 0;

        for i in 0..sample {
            for j in i + 1..sample {
                let diff = self.population[i]
                    .route
                    .as_slice()
                    .iter()
                    .zip(self.population[j].route.as_slice())
                    .filter(|(a, b)| a != b)
                    .count();
                total_diff += diff as f64;
                count += 1;
            }
        }

        total_diff / count as f64
    }
}

impl<R: Rng> TourSolver for GeneticAlgorithm<R> {
    fn solve(&mut self, instance: &TspInstance) -> Result<Solution> {
        self.run(instance)
    }

    fn name(&self) -> &str {
        "GeneticAlgorithm"
    }
}

/// Pick `start <= end` uniformly for a segment of a tour of `n >= 1` points.
fn random_segment<R: Rng + ?Sized>(rng: &mut R, n: usize) -> (usize, usize) {
    let start = rng.gen_range(0..n);
    let end = rng.gen_range(start..n);
    (start, end)
}

/// Order Crossover (OX)
///
/// Copies a random segment of `parent1` and fills the remaining slots, left to
/// right, with the missing points in `parent2` order.
pub fn order_crossover<R: Rng + ?Sized>(rng: &mut R, parent1: &[usize], parent2: &[usize]) -> Vec<usize> {
    let n = parent1.len();
    if n < 2 {
        return parent1.to_vec();
    }

    let (start, end) = random_segment(rng, n);
    let mut child = vec![usize::MAX; n];
    let mut taken = vec![false; n];

    for i in start..=end {
        child[i] = parent1[i];
        taken[parent1[i]] = true;
    }

    let mut remaining = parent2.iter().copied().filter(|&p| !taken[p]);
    for slot in child.iter_mut().filter(|slot| **slot == usize::MAX) {
        if let Some(p) = remaining.next() {
            *slot = p;
        }
    }

    child
}

/// Partially Mapped Crossover (PMX)
///
/// Starts from `parent2` and moves each point of a `parent1` segment into
/// place by swapping, so the child stays a permutation throughout.
pub fn pmx_crossover<R: Rng + ?Sized>(rng: &mut R, parent1: &[usize], parent2: &[usize]) -> Vec<usize> {
    let n = parent1.len();
    if n < 2 {
        return parent1.to_vec();
    }

    let (start, end) = random_segment(rng, n);
    let mut child = parent2.to_vec();
    let mut position = vec![0; n];
    for (i, &p) in child.iter().enumerate() {
        position[p] = i;
    }

    for i in start..=end {
        let wanted = parent1[i];
        let j = position[wanted];
        if j != i {
            let displaced = child[i];
            child.swap(i, j);
            position[displaced] = j;
            position[wanted] = i;
        }
    }

    child
}

/// Cycle Crossover
///
/// Alternates whole position cycles between the parents, so every point keeps
/// the position it has in one of them.
pub fn cycle_crossover(parent1: &[usize], parent2: &[usize]) -> Vec<usize> {
    let n = parent1.len();
    let mut position_in_p1 = vec![0; n];
    for (i, &p) in parent1.iter().enumerate() {
        position_in_p1[p] = i;
    }

    let mut child = vec![usize::MAX; n];
    let mut filled = vec![false; n];
    let mut cycle = 0;

    for start in 0..n {
        if filled[start] {
            continue;
        }

        let mut pos = start;
        loop {
            filled[pos] = true;
            child[pos] = if cycle % 2 == 0 { parent1[pos] } else { parent2[pos] };
            pos = position_in_p1[parent2[pos]];
            if pos == start {
                break;
            }
        }
        cycle += 1;
    }

    child
}

/// Apply one mutation of kind `kind` to `route`.
pub fn mutate<R: Rng + ?Sized>(rng: &mut R, kind: MutationType, route: &mut Route) -> Result<()> {
    let n = route.len();
    if n < 2 {
        return Ok(());
    }

    match kind {
        MutationType::Swap => {
            let i = rng.gen_range(0..n);
            let j = rng.gen_range(0..n);
            route.swap(i, j)
        }
        MutationType::Inversion => {
            let i = rng.gen_range(0..n - 1);
            let j = rng.gen_range(i + 1..n);
            route.reverse(i, j)
        }
        MutationType::Insertion => {
            let from = rng.gen_range(0..n);
            let to = rng.gen_range(0..n);
            route.relocate(from, to)
        }
    }
}
