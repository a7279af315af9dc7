pub mod config;
pub mod core;
pub mod error;
pub mod scheduler;
pub mod sim;

pub use config::{Algorithm, SimConfig};
pub use error::SimError;
pub use scheduler::{Scheduler, TimelineMode};
pub use sim::{Job, Policy, Sim, SimReport, SweepReport};
