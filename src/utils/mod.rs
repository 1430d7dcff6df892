//! Utilities shared by the pipeline and the binary: Arrow column access,
//! file I/O adapters and logging/console output.

pub mod arrow;
pub mod io;
pub mod logging;
