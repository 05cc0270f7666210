//! Utility functions for embedgrab

pub mod filename;
pub mod url;

pub use filename::*;
pub use url::*;
