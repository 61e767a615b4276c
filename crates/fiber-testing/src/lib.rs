//! Testing utilities and harness for Fiber-RS

pub mod deadline;
pub mod harness;

pub use deadline::{CountingScheduler, TestDeadline};
pub use harness::{run_test_harness, TestHarness};

pub mod prelude {
    pub use crate::deadline::*;
    pub use crate::harness::*;
}
