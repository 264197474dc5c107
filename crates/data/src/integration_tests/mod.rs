//! End-to-end tests over the headless [`TestDashboard`](crate::test_harness)
//! harness: level transitions, the filter pipeline, level-scoped
//! aggregation, and the lazy travel-time fetch.

mod aggregation_tests;
mod level_transition_tests;
