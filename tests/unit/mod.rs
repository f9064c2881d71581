//! Integration test suite.

mod pipeline_tests;
mod pool_tests;
mod proptest_invariants;
mod queue_tests;
mod risk_tests;
mod scenario_tests;
mod strategy_tests;
