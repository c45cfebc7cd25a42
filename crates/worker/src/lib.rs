//! Runtime plumbing shared by the analysis pipeline: where tasks run, how they are
//! classified in traces, and how they are cancelled.

mod class;
mod spawn;
mod token;

pub use class::TaskClass;
pub use spawn::{spawn, spawn_blocking};
pub use token::{TaskClock, TaskId, TaskToken};
