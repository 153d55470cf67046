//! Command implementations

pub mod deploy;
pub mod init;
