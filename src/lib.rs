#![deny(missing_docs)]
//! A tiny multi-threaded test runner with a differential stress tester
pub use config::Config;
pub use err::{Result, StressError};
pub use rand::rngs::StdRng;
pub use stress::StressOutcome;
pub use tester::{Summary, Tester, BAR_WIDTH};

mod stress;
mod tester;

pub mod color;
pub mod config;
pub mod err;
pub mod thread_pool;
