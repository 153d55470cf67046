//! Integration tests for deploy-cli
//!
//! These tests spawn the actual binary and test end-to-end behavior.
//! None of them reach the network: every case stops at a config error,
//! a declined prompt, or a local command.

mod cli_tests;
