//! Unit tests for the artifact context.

mod materializer_tests;
