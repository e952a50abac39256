//! CLI integration tests against temporary projects.
//!
//! Projects compile through a `/bin/sh` command, so these only run on Unix.

#![cfg(unix)]

mod build_tests;
mod clean_tests;
mod common;
mod publish_tests;
