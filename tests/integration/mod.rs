//! Integration tests for lodgen.

mod batch_runner;
mod test_utils;
