//! Unit tests for instruction composition.
