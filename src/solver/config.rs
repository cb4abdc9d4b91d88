//! Search parameters.

use std::time::Duration;

/// Parameters of the construct-then-anneal search.
#[derive(Debug, Clone, PartialEq)]
pub struct SolverConfig {
    /// Wall-clock budget for the whole search.
    pub time_limit: Duration,
    /// Optional cap on annealing iterations.
    pub max_iterations: Option<u64>,
    /// Seed for the random number generator.
    pub seed: u64,
    pub initial_temperature: f64,
    /// Geometric cooling factor applied every iteration.
    pub cooling_rate: f64,
    /// Temperature floor; reaching it reheats from the best state.
    pub min_temperature: f64,
    /// Energy per unit of hard excess. Raised to one more than the
    /// problem's point swing when smaller.
    pub hard_weight: i64,
    /// Progress is logged every this many iterations; 0 disables it.
    pub log_every: u64,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            time_limit: Duration::from_secs(600),
            max_iterations: None,
            seed: 42,
            initial_temperature: 40.0,
            cooling_rate: 0.999_95,
            min_temperature: 0.05,
            hard_weight: 10_000,
            log_every: 50_000,
        }
    }
}

impl SolverConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_time_limit(mut self, time_limit: Duration) -> Self {
        self.time_limit = time_limit;
        self
    }

    pub fn with_max_iterations(mut self, max_iterations: u64) -> Self {
        self.max_iterations = Some(max_iterations);
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Sets the starting temperature and floor.
    pub fn with_temperature(mut self, initial: f64, min: f64) -> Self {
        self.initial_temperature = initial;
        self.min_temperature = min;
        self
    }

    pub fn with_cooling_rate(mut self, cooling_rate: f64) -> Self {
        self.cooling_rate = cooling_rate;
        self
    }

    pub fn with_hard_weight(mut self, hard_weight: i64) -> Self {
        self.hard_weight = hard_weight;
        self
    }

    pub fn with_log_every(mut self, log_every: u64) -> Self {
        self.log_every = log_every;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SolverConfig::default();
        assert_eq!(config.time_limit, Duration::from_secs(600));
        assert_eq!(config.max_iterations, None);
        assert_eq!(config.seed, 42);
        assert!(config.cooling_rate < 1.0);
        assert!(config.min_temperature < config.initial_temperature);
    }

    #[test]
    fn test_builders() {
        let config = SolverConfig::new()
            .with_time_limit(Duration::from_secs(5))
            .with_max_iterations(1_000)
            .with_seed(7)
            .with_temperature(10.0, 0.1)
            .with_log_every(0);
        assert_eq!(config.time_limit, Duration::from_secs(5));
        assert_eq!(config.max_iterations, Some(1_000));
        assert_eq!(config.seed, 7);
        assert_eq!(config.initial_temperature, 10.0);
        // Zero turns progress logging off.
        assert_eq!(config.log_every, 0);
    }
}
