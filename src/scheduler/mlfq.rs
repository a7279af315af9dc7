use super::{DispatchError, ENQ_REENQ, EnqueueFlags, Scheduler, SimCtx, TaskId, Ticks};
use crate::core::{DsqId, Timeslice};

#[derive(Clone, Copy)]
struct Level {
    quantum: Ticks,
    dsq: DsqId,
}

// New arrivals enter level 0, a task that uses its whole quantum drops one
// level, nothing is ever promoted. Quanta need not be increasing.
pub struct Mlfq {
    levels: Vec<Level>,
    // Current level of every task, indexed by TaskId
    task_level: Vec<usize>,
    // Task used its full quantum in the slice that just ended
    demote_pending: Vec<bool>,
}

impl Scheduler for Mlfq {
    type Config = Vec<Ticks>;

    fn init(ctx: &mut SimCtx, quanta: Vec<Ticks>) -> Self {
        debug_assert!(!quanta.is_empty(), "MLFQ needs at least one level");
        Self {
            levels: quanta
                .into_iter()
                .map(|quantum| Level {
                    quantum,
                    dsq: ctx.create_dsq_fifo(),
                })
                .collect(),
            task_level: vec![0; ctx.tasks.len()],
            demote_pending: vec![false; ctx.tasks.len()],
        }
    }

    fn name(&self) -> &'static str {
        "MLFQ"
    }

    fn enqueue(&mut self, ctx: &mut SimCtx, task: TaskId, flags: EnqueueFlags) {
        let level = if flags & ENQ_REENQ == 0 {
            0
        } else if std::mem::take(&mut self.demote_pending[task]) {
            let lowest = self.levels.len() - 1;
            let from = self.task_level[task];
            let to = (from + 1).min(lowest);
            if to != from {
                log::trace!("MLFQ: task {task} demoted {from} -> {to} at t={}", ctx.now);
            }
            to
        } else {
            self.task_level[task]
        };

        self.task_level[task] = level;
        let Level { quantum, dsq } = self.levels[level];
        ctx.dsq_push_back(dsq, task, Timeslice::Ticks(quantum));
    }

    fn dispatch(&mut self, ctx: &mut SimCtx) -> Result<TaskId, DispatchError> {
        self.levels
            .iter()
            .find(|level| !ctx.dsq_is_empty(level.dsq))
            .and_then(|level| ctx.dsq_pop(level.dsq))
            .ok_or(DispatchError::NoRunnableTask)
    }

    fn stopping(&mut self, _ctx: &mut SimCtx, task: TaskId, ran: Ticks, runnable: bool) {
        let quantum = self.levels[self.task_level[task]].quantum;
        self.demote_pending[task] = runnable && ran >= quantum;
    }
}
