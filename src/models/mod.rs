//! Model oracle and score combination components

pub mod combiner;
pub mod inference;
pub mod loader;
pub mod oracle;

pub use combiner::RiskCombiner;
pub use inference::OnnxOracle;
pub use loader::ModelLoader;
pub use oracle::{ModelOracle, StaticOracle};
