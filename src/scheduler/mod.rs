//! Scheduling pipeline: input monitor, output monitor, and the supervisor
//! that owns both alongside the worker pool.

pub mod input_monitor;
pub mod output_monitor;
pub mod supervisor;

pub use supervisor::SchedulerSupervisor;
