pub mod mlfq;
pub mod priority;
pub mod round_robin;

use crate::core::{
    Ticks,
    state::{SimCtx, TaskId},
};
use crate::error::SimError;
pub use mlfq::Mlfq;
pub use priority::{PreemptivePriority, TimelineMode};
pub use round_robin::RoundRobin;

pub type EnqueueFlags = u64;

// Newly arrived task
pub const ENQ_WAKEUP: EnqueueFlags = 1 << 0;
// Task lost the CPU with work remaining
pub const ENQ_PREEMPT: EnqueueFlags = 1 << 32;
pub const ENQ_REENQ: EnqueueFlags = 1 << 40;

#[derive(Debug)]
pub enum DispatchError {
    NoRunnableTask,
}

// The driver owns the clock, admissions and the timeline; a policy only
// decides where a ready task is queued and which one runs next.
pub trait Scheduler {
    // Policy parameters, checked with check_quanta() before init()
    type Config;

    fn init(ctx: &mut SimCtx, config: Self::Config) -> Self;

    fn name(&self) -> &'static str;

    // ENQ_WAKEUP for a new arrival, ENQ_PREEMPT | ENQ_REENQ after a slice
    fn enqueue(&mut self, ctx: &mut SimCtx, task: TaskId, flags: EnqueueFlags);

    fn dispatch(&mut self, ctx: &mut SimCtx) -> Result<TaskId, DispatchError>;

    // After each slice, before the task is completed or re-enqueued
    fn stopping(&mut self, _ctx: &mut SimCtx, _task: TaskId, _ran: Ticks, _runnable: bool) {}

    // Merge back-to-back slices of the same task into one timeline entry
    fn coalesce_timeline(&self) -> bool {
        false
    }
}

pub fn check_quanta(quanta: &[Ticks]) -> Result<(), SimError> {
    if quanta.is_empty() {
        return Err(SimError::NoQueueLevels);
    }
    if quanta.contains(&0) {
        return Err(SimError::ZeroQuantum);
    }
    Ok(())
}
