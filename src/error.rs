use crate::core::Ticks;

// Nothing is simulated when one of these is returned
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SimError {
    #[error("no processes to schedule")]
    EmptyWorkload,

    #[error("process {pid} has a burst of 0 ticks")]
    ZeroBurst { pid: String },

    #[error("process id {pid} is used more than once")]
    DuplicatePid { pid: String },

    #[error("latest arrival plus total burst does not fit in {} ticks", Ticks::MAX)]
    HorizonOverflow,

    #[error("time quantum must be at least 1 tick")]
    ZeroQuantum,

    #[error("MLFQ needs at least one queue level")]
    NoQueueLevels,

    #[error("MLFQ declares {levels} levels but {quanta} quanta were given")]
    QueueLevelMismatch { levels: usize, quanta: usize },

    #[error("invalid quantum sweep range {start}..={end}")]
    InvalidSweepRange { start: Ticks, end: Ticks },
}
