use serde::Serialize;

use super::job::Job;
use crate::core::{
    Metrics, RawMetrics, RunOutcome, TaskTimes,
    state::{Priority, Ticks},
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimelineEntry {
    pub pid: String,
    pub start: Ticks,
    pub end: Ticks,
}

// A completed process with its raw (unrounded) times
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessReport {
    pub pid: String,
    pub arrival: Ticks,
    pub burst: Ticks,
    pub priority: Priority,
    pub remaining_burst: Ticks,
    pub first_response: Ticks,
    pub completion_time: Ticks,
    pub turnaround_time: Ticks,
    pub waiting_time: Ticks,
    pub response_time: Ticks,
}

// Result of one policy run. `metrics` is rounded for display; compare runs
// with `raw_metrics`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SimReport {
    pub algorithm: String,
    pub timeline: Vec<TimelineEntry>,
    pub metrics: Metrics,
    pub processes: Vec<ProcessReport>,
    #[serde(skip)]
    pub raw_metrics: RawMetrics,
}

impl SimReport {
    pub(crate) fn build(algorithm: &str, jobs: &[Job], outcome: &RunOutcome) -> Self {
        let processes: Vec<ProcessReport> = outcome
            .tasks
            .iter()
            .zip(jobs)
            .map(|(task, job)| {
                let times = TaskTimes::of(task).expect("Run finished with an incomplete task");
                ProcessReport {
                    pid: job.pid.clone(),
                    arrival: task.arrival,
                    burst: task.burst,
                    priority: task.priority,
                    remaining_burst: task.remaining,
                    first_response: task.first_response.unwrap_or_default(),
                    completion_time: task.completion_time.unwrap_or_default(),
                    turnaround_time: times.turnaround,
                    waiting_time: times.waiting,
                    response_time: times.response,
                }
            })
            .collect();

        let timeline = outcome
            .timeline
            .iter()
            .map(|slice| TimelineEntry {
                pid: jobs[slice.task].pid.clone(),
                start: slice.start,
                end: slice.end,
            })
            .collect::<Vec<_>>();

        let raw_metrics = RawMetrics::reduce(
            outcome.tasks.iter().filter_map(TaskTimes::of),
            outcome.end,
            timeline.len(),
        );

        Self {
            algorithm: algorithm.to_owned(),
            timeline,
            metrics: raw_metrics.rounded(),
            processes,
            raw_metrics,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SweepPoint {
    pub quantum: Ticks,
    pub response_time: f64,
    #[serde(skip)]
    pub raw_response_time: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SweepReport {
    pub points: Vec<SweepPoint>,
    // Lowest unrounded response time; ties go to the smaller quantum
    pub best_quantum: Ticks,
    pub mean_response_time: f64,
}
