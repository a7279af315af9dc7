use crate::core::{TaskId, Ticks};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchedEvent {
    // Task became eligible and was handed to the policy for the first time
    Admitted {
        task: TaskId,
        at: Ticks,
    },
    Dispatched {
        task: TaskId,
        at: Ticks,
        ran: Ticks,
    },
    // Slice used up with work remaining; task went back to the policy
    Preempted {
        task: TaskId,
        at: Ticks,
        remaining: Ticks,
    },
    Completed {
        task: TaskId,
        at: Ticks,
    },
    // Nothing runnable; clock jumped to the next arrival
    CpuIdle {
        from: Ticks,
        to: Ticks,
    },
}
