//! Command line interface

pub mod args;
pub mod logging;
pub mod output;

pub use args::*;
pub use logging::*;
pub use output::*;
