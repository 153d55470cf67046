//! Infrastructure layer — concrete implementations of application port traits.
//!
//! This module contains all I/O-performing code: process execution, the SSH
//! transport, local build and packaging, and config file access.
//!
//! Imports from `crate::domain` and `crate::application::ports` are allowed.
//! Imports from `crate::commands` or `crate::output` are forbidden.

pub mod cleanup;
pub mod command_runner;
pub mod config;
pub mod packager;
pub mod ssh;
