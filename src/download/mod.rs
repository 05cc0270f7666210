//! Segment download system for embedgrab

pub mod retry;
pub mod scratch;
pub mod segments;

pub use retry::*;
pub use scratch::*;
pub use segments::*;
