//! llama-server process handling.
//!
//! [`command`] turns form values into a command line, [`supervisor`] owns the
//! running child, and [`external`] starts the helper programs around it.

pub mod command;
pub mod external;
pub mod supervisor;

pub use command::{BuiltCommand, CommandBuilder, OffloadMode, ShellStyle};
pub use supervisor::{AlreadyRunning, ServerExit, ServerSupervisor};
