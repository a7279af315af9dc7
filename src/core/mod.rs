pub mod driver;
pub mod event;
pub mod metrics;
pub mod observer;
pub mod state;

pub use driver::{RunOutcome, SchedCore};
pub use event::SchedEvent;
pub use metrics::{Metrics, RawMetrics, TaskTimes};
pub use state::{
    Dsq, DsqId, PrioKey, Priority, SimCtx, Slice, Task, TaskId, TaskState, Ticks, Timeslice,
};
