//! Testing utilities for plugin developers
//!
//! This module provides a recording middleware and a scriptable loader to
//! make lifecycle tests easier to write.

pub mod mocks;
pub mod recorder;

pub use mocks::MockLoader;
pub use recorder::ActionRecorder;
