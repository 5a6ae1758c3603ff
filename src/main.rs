use anyhow::Result;
use mem_space::stress::{run_stress, StressConfig};
use mem_space::MemorySpace;

/// Walks through a small malloc/free/defrag session and logs the lists after
/// each step.
fn walkthrough() -> Result<()> {
    let mut space = MemorySpace::new(100);
    log::info!("initial:\n{}", space);

    let a = space.malloc(20);
    let b = space.malloc(30);
    log::info!("malloc(20) = {:?}, malloc(30) = {:?}:\n{}", a, b, space);

    space.free(0)?;
    log::info!("free(0):\n{}", space);

    let c = space.malloc(15);
    log::info!("malloc(15) = {:?}:\n{}", c, space);

    space.defrag();
    log::info!("defrag:\n{}", space);

    space.check_invariants()?;
    Ok(())
}

pub fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    walkthrough()?;

    // optional positional overrides: <iterations> <seed>
    let mut config = StressConfig::default();
    let mut args = std::env::args().skip(1);
    if let Some(iterations) = args.next() {
        config.iterations = iterations.parse()?;
    }
    if let Some(seed) = args.next() {
        config.seed = seed.parse()?;
    }

    let report = run_stress(&config)?;
    log::info!("{:#?}", report);
    Ok(())
}
