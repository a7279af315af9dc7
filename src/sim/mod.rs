pub mod driver;
pub mod job;
pub mod report;
pub mod workload;

pub use driver::{Policy, Sim, mlfq, preemptive_priority, round_robin};
pub use job::Job;
pub use report::{ProcessReport, SimReport, SweepPoint, SweepReport, TimelineEntry};
