use average::{Estimate, Mean};
use rustc_hash::FxHashSet;
use std::ops::RangeInclusive;

use super::{
    job::Job,
    report::{SimReport, SweepPoint, SweepReport},
};
use crate::{
    core::{SchedCore, SchedEvent, metrics::round2, state::Ticks},
    error::SimError,
    scheduler::{Mlfq, PreemptivePriority, RoundRobin, Scheduler, TimelineMode, check_quanta},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Policy {
    RoundRobin { quantum: Ticks },
    Priority { mode: TimelineMode },
    Mlfq { quanta: Vec<Ticks> },
}

impl Policy {
    // Level i gets base * 2^i ticks
    pub fn mlfq_doubling(base: Ticks, levels: usize) -> Self {
        let quanta = (0..levels)
            .map(|level| base.saturating_mul(1u64 << level.min(63)))
            .collect();
        Self::Mlfq { quanta }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::RoundRobin { .. } => "Round Robin",
            Self::Priority { .. } => "Priority",
            Self::Mlfq { .. } => "MLFQ",
        }
    }

    pub fn validate(&self) -> Result<(), SimError> {
        match self {
            Self::RoundRobin { quantum } => check_quanta(&[*quantum]),
            Self::Priority { .. } => Ok(()),
            Self::Mlfq { quanta } => check_quanta(quanta),
        }
    }
}

// Runs never share state; each one starts from fresh copies of the jobs
#[derive(Debug, Clone)]
pub struct Sim {
    jobs: Vec<Job>,
}

impl Sim {
    pub fn new(jobs: Vec<Job>) -> Result<Self, SimError> {
        validate_jobs(&jobs)?;
        Ok(Self { jobs })
    }

    pub fn jobs(&self) -> &[Job] {
        &self.jobs
    }

    pub fn run(&self, policy: &Policy) -> Result<SimReport, SimError> {
        self.execute(policy, false).map(|(report, _)| report)
    }

    pub fn run_traced(&self, policy: &Policy) -> Result<(SimReport, Vec<SchedEvent>), SimError> {
        self.execute(policy, true)
    }

    // Round Robin once per quantum in `quanta`
    pub fn quantum_sweep(&self, quanta: RangeInclusive<Ticks>) -> Result<SweepReport, SimError> {
        let (start, end) = (*quanta.start(), *quanta.end());
        if start == 0 || start > end {
            return Err(SimError::InvalidSweepRange { start, end });
        }

        let mut points = Vec::new();
        for quantum in quanta {
            let report = self.run(&Policy::RoundRobin { quantum })?;
            let raw = report.raw_metrics.avg_response_time;
            log::debug!("sweep: quantum={quantum} avg response={raw}");
            points.push(SweepPoint {
                quantum,
                response_time: report.metrics.avg_response_time,
                raw_response_time: raw,
            });
        }

        let mut best = &points[0];
        for point in &points[1..] {
            if point.raw_response_time < best.raw_response_time {
                best = point;
            }
        }
        let best_quantum = best.quantum;
        let mean: Mean = points.iter().map(|p| p.raw_response_time).collect();

        Ok(SweepReport {
            best_quantum,
            mean_response_time: round2(mean.estimate()),
            points,
        })
    }

    fn execute(
        &self,
        policy: &Policy,
        record: bool,
    ) -> Result<(SimReport, Vec<SchedEvent>), SimError> {
        policy.validate()?;
        log::debug!("running {} over {} jobs", policy.name(), self.jobs.len());
        let result = match policy {
            Policy::RoundRobin { quantum } => simulate::<RoundRobin>(&self.jobs, *quantum, record),
            Policy::Priority { mode } => simulate::<PreemptivePriority>(&self.jobs, *mode, record),
            Policy::Mlfq { quanta } => simulate::<Mlfq>(&self.jobs, quanta.clone(), record),
        };
        Ok(result)
    }
}

pub fn round_robin(jobs: &[Job], quantum: Ticks) -> Result<SimReport, SimError> {
    run_once(jobs, &Policy::RoundRobin { quantum })
}

pub fn preemptive_priority(jobs: &[Job], mode: TimelineMode) -> Result<SimReport, SimError> {
    run_once(jobs, &Policy::Priority { mode })
}

// One quantum per level, highest level first
pub fn mlfq(jobs: &[Job], quanta: &[Ticks]) -> Result<SimReport, SimError> {
    let quanta = quanta.to_vec();
    run_once(jobs, &Policy::Mlfq { quanta })
}

fn run_once(jobs: &[Job], policy: &Policy) -> Result<SimReport, SimError> {
    Sim::new(jobs.to_vec())?.run(policy)
}

fn simulate<S: Scheduler>(
    jobs: &[Job],
    config: S::Config,
    record: bool,
) -> (SimReport, Vec<SchedEvent>) {
    let outcome = SchedCore::<S>::new(jobs, config).record_events(record).run();
    let report = SimReport::build(outcome.algorithm, jobs, &outcome);
    (report, outcome.events)
}

fn validate_jobs(jobs: &[Job]) -> Result<(), SimError> {
    if jobs.is_empty() {
        return Err(SimError::EmptyWorkload);
    }

    let mut seen = FxHashSet::default();
    let mut total_burst: Ticks = 0;
    let mut last_arrival: Ticks = 0;
    for job in jobs {
        if job.burst == 0 {
            return Err(SimError::ZeroBurst {
                pid: job.pid.clone(),
            });
        }
        if !seen.insert(job.pid.as_str()) {
            return Err(SimError::DuplicatePid {
                pid: job.pid.clone(),
            });
        }
        total_burst = total_burst
            .checked_add(job.burst)
            .ok_or(SimError::HorizonOverflow)?;
        last_arrival = last_arrival.max(job.arrival);
    }

    // The clock never passes the last arrival plus all the work
    last_arrival
        .checked_add(total_burst)
        .ok_or(SimError::HorizonOverflow)?;
    Ok(())
}
