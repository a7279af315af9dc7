use super::{DispatchError, EnqueueFlags, Scheduler, SimCtx, TaskId, Ticks};
use crate::core::{DsqId, Timeslice};

pub struct RoundRobin {
    quantum: Ticks,
    ready: DsqId,
}

impl Scheduler for RoundRobin {
    type Config = Ticks;

    fn init(ctx: &mut SimCtx, quantum: Ticks) -> Self {
        debug_assert!(quantum > 0, "Round Robin quantum must be positive");
        Self {
            quantum,
            ready: ctx.create_dsq_fifo(),
        }
    }

    fn name(&self) -> &'static str {
        "Round Robin"
    }

    fn enqueue(&mut self, ctx: &mut SimCtx, task: TaskId, _flags: EnqueueFlags) {
        ctx.dsq_push_back(self.ready, task, Timeslice::Ticks(self.quantum));
    }

    fn dispatch(&mut self, ctx: &mut SimCtx) -> Result<TaskId, DispatchError> {
        ctx.dsq_pop(self.ready).ok_or(DispatchError::NoRunnableTask)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        core::{SchedCore, SchedEvent},
        sim::Job,
    };

    fn slices(jobs: &[Job], quantum: Ticks) -> Vec<(&str, Ticks, Ticks)> {
        let outcome = SchedCore::<RoundRobin>::new(jobs, quantum).run();
        outcome
            .timeline
            .iter()
            .map(|s| (jobs[s.task].pid.as_str(), s.start, s.end))
            .collect()
    }

    #[test]
    fn arrival_during_slice_runs_before_preempted_task() {
        let jobs = vec![Job::new("P1", 0, 5, 1), Job::new("P2", 1, 3, 1)];
        assert_eq!(
            slices(&jobs, 2),
            vec![
                ("P1", 0, 2),
                ("P2", 2, 4),
                ("P1", 4, 6),
                ("P2", 6, 7),
                ("P1", 7, 8),
            ]
        );
    }

    #[test]
    fn arrivals_within_one_slice_queue_in_input_order() {
        let jobs = vec![
            Job::new("A", 0, 4, 1),
            Job::new("C", 3, 1, 1),
            Job::new("B", 2, 1, 1),
        ];
        assert_eq!(
            slices(&jobs, 4),
            vec![("A", 0, 4), ("C", 4, 5), ("B", 5, 6)]
        );
    }

    #[test]
    fn lone_task_is_sliced_by_quantum() {
        let jobs = vec![Job::new("P1", 0, 5, 1)];
        assert_eq!(
            slices(&jobs, 2),
            vec![("P1", 0, 2), ("P1", 2, 4), ("P1", 4, 5)]
        );
    }

    #[test]
    fn idle_gap_jumps_to_next_arrival() {
        let jobs = vec![Job::new("P1", 3, 2, 1), Job::new("P2", 1_000_000_000, 1, 1)];
        let outcome = SchedCore::<RoundRobin>::new(&jobs, 4)
            .record_events(true)
            .run();

        assert_eq!(outcome.end, 1_000_000_001);
        let idles = outcome
            .events
            .iter()
            .filter(|e| matches!(e, SchedEvent::CpuIdle { .. }))
            .count();
        assert_eq!(idles, 2);
    }
}
