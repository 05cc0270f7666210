//! Page fetching, media resolution and playlist handling

pub mod client;
pub mod playlist;
pub mod renderer;
pub mod resolver;
pub mod strategies;

pub use client::*;
pub use playlist::*;
pub use renderer::*;
pub use resolver::*;
pub use strategies::*;
