pub mod codes;
pub mod compiler;
pub mod config;
pub mod constants;
pub mod domain;
pub mod error;
pub mod geometry;
pub mod package;
pub mod sections;
pub mod source;
pub mod taxonomy;
pub mod xml;

pub use compiler::EmlCompiler;
pub use error::EmlError;
