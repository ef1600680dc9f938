//! Unit tests for the generation task queue.

mod domain_tests;
