use rand::prelude::*;
use serde::Deserialize;
use std::path::{Path, PathBuf};

use super::job::Job;
use crate::core::state::{Priority, Ticks};

pub const DEFAULT_BURST: Ticks = 8;
pub const DEFAULT_ARRIVAL: Ticks = 0;
pub const DEFAULT_PRIORITY: Priority = 1;

#[derive(Debug, thiserror::Error)]
pub enum WorkloadError {
    #[error("failed to read dataset {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("malformed dataset: {0}")]
    Parse(#[from] serde_json::Error),
}

// Every field is optional in a dataset file
#[derive(Debug, Default, Deserialize)]
struct DatasetEntry {
    pid: Option<String>,
    arrival: Option<Ticks>,
    burst: Option<Ticks>,
    priority: Option<Priority>,
}

// Parse a JSON array of processes. Missing, empty or zero fields fall back
// to `P{n}`, `DEFAULT_ARRIVAL`, `DEFAULT_BURST` and `DEFAULT_PRIORITY`
pub fn parse_dataset(json: &str) -> Result<Vec<Job>, WorkloadError> {
    let entries: Vec<DatasetEntry> = serde_json::from_str(json)?;
    Ok(entries
        .into_iter()
        .enumerate()
        .map(|(index, entry)| Job {
            pid: entry
                .pid
                .filter(|pid| !pid.is_empty())
                .unwrap_or_else(|| format!("P{}", index + 1)),
            arrival: entry.arrival.unwrap_or(DEFAULT_ARRIVAL),
            burst: entry.burst.filter(|&b| b != 0).unwrap_or(DEFAULT_BURST),
            priority: entry
                .priority
                .filter(|&p| p != 0)
                .unwrap_or(DEFAULT_PRIORITY),
        })
        .collect())
}

pub fn load_dataset(path: &Path) -> Result<Vec<Job>, WorkloadError> {
    let json = std::fs::read_to_string(path).map_err(|source| WorkloadError::Io {
        path: path.to_owned(),
        source,
    })?;
    parse_dataset(&json)
}

pub fn builtin_dataset() -> Vec<Job> {
    [
        ("P1", 0, 8, 3),
        ("P2", 1, 4, 1),
        ("P3", 2, 9, 4),
        ("P4", 3, 5, 2),
        ("P5", 4, 2, 1),
        ("P6", 6, 6, 3),
        ("P7", 8, 3, 2),
        ("P8", 10, 7, 5),
    ]
    .into_iter()
    .map(|(pid, arrival, burst, priority)| Job::new(pid, arrival, burst, priority))
    .collect()
}

// Each tick in `0..ticks` spawns a job with probability `p_arrival`; a job
// is short with probability `p_short`. Priorities are uniform in
// `1..=max_priority`
pub fn bernoulli_jobs(
    ticks: Ticks,
    p_arrival: f64,
    p_short: f64,
    short_ticks: Ticks,
    long_ticks: Ticks,
    max_priority: Priority,
    seed: u64,
) -> Vec<Job> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut jobs = Vec::new();

    for t in 0..ticks {
        if rng.random::<f64>() < p_arrival {
            let burst = if rng.random::<f64>() < p_short {
                short_ticks
            } else {
                long_ticks
            };
            let priority = rng.random_range(1..=max_priority.max(1));

            jobs.push(Job::new(format!("P{}", jobs.len() + 1), t, burst, priority));
        }
    }

    jobs
}

// The first `count` jobs (at least one)
pub fn take_first(mut jobs: Vec<Job>, count: usize) -> Vec<Job> {
    jobs.truncate(count.max(1));
    jobs
}
