//! Manifest parsers

pub mod sdist;
pub mod setup_py;

pub use sdist::SdistParser;
pub use setup_py::SetupPyParser;
