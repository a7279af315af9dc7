use serde::Serialize;

use super::state::{Task, Ticks};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskTimes {
    pub turnaround: Ticks,
    pub waiting: Ticks,
    pub response: Ticks,
}

impl TaskTimes {
    // `None` until the task has both run and completed
    pub fn of(task: &Task) -> Option<Self> {
        let completion = task.completion_time?;
        let first_response = task.first_response?;
        let turnaround = completion - task.arrival;
        debug_assert!(turnaround >= task.burst, "Task {} finished too early", task.id);

        Some(Self {
            turnaround,
            waiting: turnaround.saturating_sub(task.burst),
            response: first_response - task.arrival,
        })
    }
}

// Unrounded averages; use these for comparisons between runs
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RawMetrics {
    pub avg_waiting_time: f64,
    pub avg_turnaround_time: f64,
    pub avg_response_time: f64,
    pub throughput: f64,
    pub context_switches: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Metrics {
    pub avg_waiting_time: f64,
    pub avg_turnaround_time: f64,
    pub avg_response_time: f64,
    pub throughput: f64,
    pub context_switches: usize,
}

impl RawMetrics {
    pub fn reduce(
        times: impl IntoIterator<Item = TaskTimes>,
        end: Ticks,
        context_switches: usize,
    ) -> Self {
        let mut count: u64 = 0;
        let (mut waiting, mut turnaround, mut response) = (0u128, 0u128, 0u128);
        for t in times {
            count += 1;
            waiting += u128::from(t.waiting);
            turnaround += u128::from(t.turnaround);
            response += u128::from(t.response);
        }

        Self {
            avg_waiting_time: ratio(waiting, u128::from(count)),
            avg_turnaround_time: ratio(turnaround, u128::from(count)),
            avg_response_time: ratio(response, u128::from(count)),
            throughput: ratio(u128::from(count), u128::from(end)),
            context_switches,
        }
    }

    pub fn rounded(&self) -> Metrics {
        Metrics {
            avg_waiting_time: round2(self.avg_waiting_time),
            avg_turnaround_time: round2(self.avg_turnaround_time),
            avg_response_time: round2(self.avg_response_time),
            throughput: round2(self.throughput),
            context_switches: self.context_switches,
        }
    }
}

// Zero denominators report 0 rather than NaN/inf
fn ratio(num: u128, den: u128) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
