use crate::util::{Bench, MemorySpace};
use anyhow::Result;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

/// Parameters of a randomized malloc/free workload.
#[derive(Debug, Clone)]
pub struct StressConfig {
    pub space_size: usize,
    pub initial_allocations: usize,
    pub iterations: usize,
    pub min_alloc_size: usize,
    pub max_alloc_size: usize,
    /// Upper bound of frees per round; each round frees between 1 and this many.
    pub max_frees_per_round: usize,
    /// Unconditional defrag every this many rounds, 0 disables it.
    pub defrag_interval: usize,
    pub seed: u64,
}

impl Default for StressConfig {
    fn default() -> Self {
        Self {
            space_size: 1 << 20,
            initial_allocations: 256,
            iterations: 10_000,
            min_alloc_size: 64,
            max_alloc_size: 4096,
            max_frees_per_round: 8,
            defrag_interval: 500,
            seed: 0xf1257f17,
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct StressReport {
    pub mallocs: usize,
    pub frees: usize,
    pub defrags: usize,
    /// Requests that failed on the first try.
    pub failures: usize,
    /// Failed requests that succeeded after an explicit defrag.
    pub recovered: usize,
    pub final_free_blocks: usize,
    pub final_largest_free: usize,
}

struct Driver {
    space: MemorySpace,
    live: Vec<usize>,
    bench: Bench,
    report: StressReport,
}

impl Driver {
    fn malloc(&mut self, len: usize) {
        let space = &mut self.space;
        let mut addr = self.bench.time("malloc", || space.malloc(len));
        if addr.is_none() {
            self.report.failures += 1;
            self.defrag();
            let space = &mut self.space;
            addr = self.bench.time("malloc", || space.malloc(len));
            if addr.is_some() {
                self.report.recovered += 1;
            }
        }
        if let Some(addr) = addr {
            self.report.mallocs += 1;
            self.live.push(addr);
        }
    }

    fn free(&mut self, addr: usize) -> Result<()> {
        let space = &mut self.space;
        self.bench.time("free", || space.free(addr))?;
        self.report.frees += 1;
        Ok(())
    }

    fn defrag(&mut self) {
        let space = &mut self.space;
        self.bench.time("defrag", || space.defrag());
        self.report.defrags += 1;
    }
}

/// Runs the workload described by `config` and checks the space invariants
/// after every round.
pub fn run_stress(config: &StressConfig) -> Result<StressReport> {
    if config.min_alloc_size == 0 || config.min_alloc_size > config.max_alloc_size {
        return Err(anyhow::anyhow!(
            "invalid request size range {}..={}",
            config.min_alloc_size,
            config.max_alloc_size
        ));
    }
    if config.max_frees_per_round == 0 {
        return Err(anyhow::anyhow!("max_frees_per_round must be positive"));
    }

    let mut rng = StdRng::seed_from_u64(config.seed);
    let mut driver = Driver {
        space: MemorySpace::new(config.space_size),
        live: Vec::with_capacity(config.initial_allocations),
        bench: Bench::new(),
        report: StressReport::default(),
    };

    for _ in 0..config.initial_allocations {
        let len = rng.random_range(config.min_alloc_size..=config.max_alloc_size);
        driver.malloc(len);
    }

    for round in 1..=config.iterations {
        let num_to_remove = rng.random_range(1..=config.max_frees_per_round);
        driver.live.shuffle(&mut rng);
        for _ in 0..num_to_remove.min(driver.live.len()) {
            if let Some(addr) = driver.live.pop() {
                driver.free(addr)?;
            }
        }

        for _ in 0..num_to_remove {
            let len = rng.random_range(config.min_alloc_size..=config.max_alloc_size);
            driver.malloc(len);
        }

        if config.defrag_interval != 0 && round % config.defrag_interval == 0 {
            driver.defrag();
        }

        driver
            .space
            .check_invariants()
            .map_err(|e| anyhow::anyhow!("round {round}: {e}"))?;
    }

    driver.report.final_free_blocks = driver.space.free_blocks().len();
    driver.report.final_largest_free = driver
        .space
        .largest_free_block()
        .map_or(0, |block| block.length);

    log::info!("{:?}", driver.space);
    log::info!("\n{}", driver.bench.summary());
    Ok(driver.report)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_config() -> StressConfig {
        StressConfig {
            space_size: 8192,
            initial_allocations: 32,
            iterations: 500,
            min_alloc_size: 16,
            max_alloc_size: 256,
            max_frees_per_round: 4,
            defrag_interval: 50,
            seed: 7,
        }
    }

    #[test]
    fn test_stress_run_is_deterministic() {
        let config = small_config();
        let first = run_stress(&config).unwrap();
        let second = run_stress(&config).unwrap();
        assert_eq!(first, second);
        assert!(first.mallocs > 0);
        assert!(first.frees > 0);
        assert!(first.recovered <= first.failures);
        assert!(first.defrags >= config.iterations / config.defrag_interval);
    }

    #[test]
    fn test_tight_space_recovers_through_defrag() {
        let config = StressConfig {
            space_size: 1024,
            initial_allocations: 16,
            min_alloc_size: 32,
            max_alloc_size: 64,
            defrag_interval: 0,
            ..small_config()
        };
        let report = run_stress(&config).unwrap();
        assert!(report.failures > 0);
        assert!(report.recovered > 0);
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let config = StressConfig {
            min_alloc_size: 0,
            ..small_config()
        };
        assert!(run_stress(&config).is_err());

        let config = StressConfig {
            max_frees_per_round: 0,
            ..small_config()
        };
        assert!(run_stress(&config).is_err());
    }
}
