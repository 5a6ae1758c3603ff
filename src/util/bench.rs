use comfy_table::{Cell, Table};
use indexmap::IndexMap;
use std::time::{Duration, Instant};

#[derive(Debug)]
struct Stat {
    count: u32,
    total: Duration,
    min: Duration,
    min_idx: u32,
    max: Duration,
    max_idx: u32,
}

impl Stat {
    fn new() -> Self {
        Stat {
            count: 0,
            total: Duration::ZERO,
            min: Duration::MAX,
            min_idx: 0,
            max: Duration::ZERO,
            max_idx: 0,
        }
    }

    fn record(&mut self, d: Duration) {
        self.count += 1;
        self.total += d;

        if d < self.min {
            self.min = d;
            self.min_idx = self.count;
        }
        if d > self.max {
            self.max = d;
            self.max_idx = self.count;
        }
    }

    fn avg(&self) -> Duration {
        if self.count == 0 {
            Duration::ZERO
        } else {
            self.total / self.count
        }
    }
}

/// Per-operation timing samples, keyed by operation name.
#[derive(Debug, Default)]
pub struct Bench {
    // IndexMap keeps insertion order
    stats: IndexMap<&'static str, Stat>,
}

impl Bench {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one sample of duration `d` under the key `name`.
    pub fn record(&mut self, name: &'static str, d: Duration) {
        self.stats.entry(name).or_insert_with(Stat::new).record(d);
    }

    /// Runs `f` and records how long it took under `name`.
    pub fn time<R>(&mut self, name: &'static str, f: impl FnOnce() -> R) -> R {
        let start = Instant::now();
        let result = f();
        self.record(name, start.elapsed());
        result
    }

    pub fn count(&self, name: &str) -> u32 {
        self.stats.get(name).map_or(0, |st| st.count)
    }

    /// Table of avg / min@idx / max@idx / count per key, in the order each key
    /// was first recorded.
    pub fn summary(&self) -> Table {
        let mut table = Table::new();
        table.set_header(vec![
            Cell::new("Op"),
            Cell::new("Avg"),
            Cell::new("Min@Idx"),
            Cell::new("Max@Idx"),
            Cell::new("Count"),
        ]);

        for (&name, st) in &self.stats {
            table.add_row(vec![
                Cell::new(name),
                Cell::new(format!("{:?}", st.avg())),
                Cell::new(format!("{:?}@{}", st.min, st.min_idx)),
                Cell::new(format!("{:?}@{}", st.max, st.max_idx)),
                Cell::new(st.count),
            ]);
        }
        table
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bench_keeps_first_seen_order() {
        let mut bench = Bench::new();
        bench.record("malloc", Duration::from_micros(3));
        bench.record("free", Duration::from_micros(1));
        bench.record("malloc", Duration::from_micros(5));

        assert_eq!(bench.count("malloc"), 2);
        assert_eq!(bench.count("free"), 1);
        assert_eq!(bench.count("defrag"), 0);

        let rendered = bench.summary().to_string();
        let malloc_at = rendered.find("malloc").unwrap();
        let free_at = rendered.find("free").unwrap();
        assert!(malloc_at < free_at);
    }

    #[test]
    fn test_time_returns_closure_result() {
        let mut bench = Bench::new();
        let v = bench.time("op", || 41 + 1);
        assert_eq!(v, 42);
        assert_eq!(bench.count("op"), 1);
    }
}
