use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::{
    core::state::Ticks,
    error::SimError,
    scheduler::TimelineMode,
    sim::Policy,
};

pub const DEFAULT_MLFQ_LEVELS: usize = 3;
pub const DEFAULT_PROCESS_COUNT: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Algorithm {
    #[serde(alias = "rr")]
    RoundRobin,
    Priority,
    Mlfq,
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Algorithm::RoundRobin => write!(f, "Round Robin"),
            Algorithm::Priority => write!(f, "Priority"),
            Algorithm::Mlfq => write!(f, "MLFQ"),
        }
    }
}

impl FromStr for Algorithm {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "rr" | "round-robin" | "round robin" => Ok(Algorithm::RoundRobin),
            "priority" | "prio" => Ok(Algorithm::Priority),
            "mlfq" => Ok(Algorithm::Mlfq),
            _ => Err(format!(
                "unknown algorithm '{s}' (expected rr, priority or mlfq)"
            )),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("no scheduling algorithm selected")]
    NoAlgorithm,

    #[error(transparent)]
    Sim(#[from] SimError),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimConfig {
    pub algorithm: Option<Algorithm>,
    // User-facing quantum; may be fractional or non-positive, see `clamp_quantum`
    pub quantum: f64,
    pub mlfq_levels: Option<usize>,
    // Explicit per-level quanta. Without it levels get `q, 2q, 4q, ...`
    pub mlfq_quanta: Option<Vec<Ticks>>,
    pub timeline_mode: TimelineMode,
    pub count: usize,
    pub dataset: Option<PathBuf>,
    pub sweep_start: Ticks,
    pub sweep_end: Ticks,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            algorithm: None,
            quantum: 1.0,
            mlfq_levels: None,
            mlfq_quanta: None,
            timeline_mode: TimelineMode::default(),
            count: DEFAULT_PROCESS_COUNT,
            dataset: None,
            sweep_start: 1,
            sweep_end: 10,
        }
    }
}

impl SimConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_owned(),
            source,
        })?;
        Self::from_toml(&text)
    }

    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    pub fn quantum_ticks(&self) -> Ticks {
        clamp_quantum(self.quantum)
    }

    // NoAlgorithm lets callers prompt instead of running
    pub fn policy(&self) -> Result<Policy, ConfigError> {
        let algorithm = self.algorithm.ok_or(ConfigError::NoAlgorithm)?;
        let quantum = self.quantum_ticks();

        let policy = match algorithm {
            Algorithm::RoundRobin => Policy::RoundRobin { quantum },
            Algorithm::Priority => Policy::Priority {
                mode: self.timeline_mode,
            },
            Algorithm::Mlfq => match (&self.mlfq_quanta, self.mlfq_levels) {
                (Some(quanta), Some(levels)) if quanta.len() != levels => {
                    return Err(SimError::QueueLevelMismatch {
                        levels,
                        quanta: quanta.len(),
                    }
                    .into());
                }
                (Some(quanta), _) => Policy::Mlfq {
                    quanta: quanta.clone(),
                },
                (None, levels) => {
                    Policy::mlfq_doubling(quantum, levels.unwrap_or(DEFAULT_MLFQ_LEVELS))
                }
            },
        };
        Ok(policy)
    }

    pub fn sweep_range(&self) -> RangeInclusive<Ticks> {
        self.sweep_start..=self.sweep_end
    }
}

// Turn a user-entered quantum into whole ticks: non-positive or NaN
// becomes 1, fractions round up
pub fn clamp_quantum(quantum: f64) -> Ticks {
    if quantum.is_nan() || quantum <= 0.0 {
        return 1;
    }
    // `as` saturates at u64::MAX
    (quantum.ceil() as Ticks).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn quantum_is_clamped_and_rounded_up() {
        assert_eq!(clamp_quantum(0.0), 1);
        assert_eq!(clamp_quantum(-3.0), 1);
        assert_eq!(clamp_quantum(f64::NAN), 1);
        assert_eq!(clamp_quantum(0.5), 1);
        assert_eq!(clamp_quantum(2.5), 3);
        assert_eq!(clamp_quantum(4.0), 4);
    }

    #[test]
    fn missing_algorithm_is_reported() {
        let config = SimConfig::default();
        assert!(matches!(config.policy(), Err(ConfigError::NoAlgorithm)));
    }

    #[test]
    fn mlfq_levels_from_quantum() {
        let config = SimConfig::from_toml("algorithm = \"mlfq\"\nquantum = 1.5").unwrap();
        assert_eq!(
            config.policy().unwrap(),
            Policy::Mlfq {
                quanta: vec![2, 4, 8]
            }
        );
    }

    #[test]
    fn mlfq_explicit_quanta_must_match_levels() {
        let config =
            SimConfig::from_toml("algorithm = \"mlfq\"\nmlfq_levels = 2\nmlfq_quanta = [3, 1, 9]")
                .unwrap();
        assert!(matches!(
            config.policy(),
            Err(ConfigError::Sim(SimError::QueueLevelMismatch {
                levels: 2,
                quanta: 3
            }))
        ));

        let config =
            SimConfig::from_toml("algorithm = \"mlfq\"\nmlfq_quanta = [3, 1, 9]").unwrap();
        assert_eq!(
            config.policy().unwrap(),
            Policy::Mlfq {
                quanta: vec![3, 1, 9]
            }
        );
    }

    #[test]
    fn load_full_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
algorithm = "priority"
timeline_mode = "per-tick"
count = 3
dataset = "jobs.json"
sweep_end = 4
"#
        )
        .unwrap();

        let config = SimConfig::load(file.path()).unwrap();
        assert_eq!(config.algorithm, Some(Algorithm::Priority));
        assert_eq!(config.count, 3);
        assert_eq!(config.dataset, Some(PathBuf::from("jobs.json")));
        assert_eq!(config.sweep_range(), 1..=4);
        assert_eq!(
            config.policy().unwrap(),
            Policy::Priority {
                mode: TimelineMode::PerTick
            }
        );
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(matches!(
            SimConfig::from_toml("quantom = 2"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn algorithm_names() {
        assert_eq!("RR".parse::<Algorithm>(), Ok(Algorithm::RoundRobin));
        assert_eq!("mlfq".parse::<Algorithm>(), Ok(Algorithm::Mlfq));
        assert!("fcfs".parse::<Algorithm>().is_err());
        assert_eq!(
            SimConfig::from_toml("algorithm = \"rr\"").unwrap().algorithm,
            Some(Algorithm::RoundRobin)
        );
    }
}
