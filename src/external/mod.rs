//! Capabilities the checks use to reach outside the process
//!
//! Checks never spawn processes or touch the disk directly. They go through
//! [`CommandRunner`] and [`FileSystem`], so the orchestrator can be driven by
//! the local implementations here or by in-memory fakes.

pub mod fs;
pub mod process;

pub use fs::{FileSystem, LocalFs};
pub use process::{CommandOutput, CommandRunner, ExecError, ProcessRunner};
