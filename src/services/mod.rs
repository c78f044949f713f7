pub mod rollover;
pub mod task_service;
pub mod tree;

pub use rollover::{Clock, ManualClock, RolloverHandle, RolloverScheduler, SystemClock, TickOutcome};
pub use task_service::{Overview, TaskService};
pub use tree::TaskArena;
