//! Library integration tests: full pipelines through the public API.

mod common;
mod pipeline_tests;
