use serde::{Deserialize, Serialize};

use super::{DispatchError, EnqueueFlags, Scheduler, SimCtx, TaskId};
use crate::core::{DsqId, Timeslice};

// Both modes give the same per-process times; they differ in the number of
// timeline entries, and therefore in contextSwitches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TimelineMode {
    // One entry per uninterrupted stretch of a process
    #[default]
    Coalesced,
    // One 1-tick entry for every executed tick
    PerTick,
}

// Lowest priority value runs, re-evaluated on every arrival; ties go to the
// task admitted first.
pub struct PreemptivePriority {
    mode: TimelineMode,
    ready: DsqId,
}

impl PreemptivePriority {
    fn slice(&self) -> Timeslice {
        match self.mode {
            TimelineMode::Coalesced => Timeslice::UntilArrival,
            TimelineMode::PerTick => Timeslice::Ticks(1),
        }
    }
}

impl Scheduler for PreemptivePriority {
    type Config = TimelineMode;

    fn init(ctx: &mut SimCtx, mode: TimelineMode) -> Self {
        Self {
            mode,
            ready: ctx.create_dsq_priq(),
        }
    }

    fn name(&self) -> &'static str {
        "Priority"
    }

    fn enqueue(&mut self, ctx: &mut SimCtx, task: TaskId, _flags: EnqueueFlags) {
        ctx.dsq_push_back(self.ready, task, self.slice());
    }

    fn dispatch(&mut self, ctx: &mut SimCtx) -> Result<TaskId, DispatchError> {
        ctx.dsq_pop(self.ready).ok_or(DispatchError::NoRunnableTask)
    }

    fn coalesce_timeline(&self) -> bool {
        self.mode == TimelineMode::Coalesced
    }
}
