//! Data models for manifest representation

mod classifier;
mod manifest;
mod requirement;

pub use classifier::*;
pub use manifest::*;
pub use requirement::*;
