//! Output generation

mod pyproject;

pub use pyproject::*;
