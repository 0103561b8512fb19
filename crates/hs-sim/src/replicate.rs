//! Independent replications of one configuration under different seeds.
//!
//! Replications share no mutable state: each builds its own network, fleet,
//! and RNG streams from its seed.  With the `parallel` feature they run on
//! Rayon's thread pool; results always come back in seed order.

use hs_core::SimConfig;

use crate::{NoopObserver, RunSummary, Sim, SimResult};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Replication {
    pub seed:    u64,
    pub summary: RunSummary,
}

/// Run `base` once per seed.  `build` turns a seeded config into a
/// ready-to-run engine, usually `|c| SimBuilder::new(c).build()`.
///
/// Stops at the first failing replication (in seed order when sequential;
/// an arbitrary failing one when parallel).
pub fn run_replications<F>(base: &SimConfig, seeds: &[u64], build: F) -> SimResult<Vec<Replication>>
where
    F: Fn(SimConfig) -> SimResult<Sim> + Sync,
{
    let run_one = |&seed: &u64| -> SimResult<Replication> {
        let mut config = base.clone();
        config.seed = seed;
        let mut sim = build(config)?;
        let summary = sim.run(&mut NoopObserver)?;
        Ok(Replication { seed, summary })
    };

    #[cfg(not(feature = "parallel"))]
    {
        seeds.iter().map(run_one).collect()
    }

    #[cfg(feature = "parallel")]
    {
        use rayon::prelude::*;
        seeds.par_iter().map(run_one).collect()
    }
}
