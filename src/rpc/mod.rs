// src/rpc/mod.rs

//! Request handling: the dispatcher and the handlers that do not belong to
//! the lifecycle manager or the process supervisor.

pub mod credentials;
pub mod dispatcher;
pub mod host_files;

pub use credentials::CredentialStore;
pub use dispatcher::{Caller, Dispatcher};
pub use host_files::HostFiles;
