// src/exec/mod.rs

//! Process execution layer.
//!
//! - [`sanitize`] turns a caller's env/args/cwd into host-safe values.
//! - [`resolve`] picks the binary to launch.
//! - [`supervisor`] owns the session table and launches processes.
//! - [`session_runner`] forwards a process's output and reports its exit.

pub mod resolve;
pub mod sanitize;
pub mod session;
pub mod session_runner;
pub mod supervisor;

pub use resolve::{resolve_executable, Resolution};
pub use sanitize::{is_sandbox_path, join_under, PreparedLaunch, Sanitizer};
pub use session::{Session, SessionId};
pub use session_runner::Utf8Chunker;
pub use supervisor::{ProcessSupervisor, EXIT_COMMAND_NOT_FOUND};
