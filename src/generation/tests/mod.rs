//! Unit tests for the generation context.

mod client_tests;
