//! Query-time retrieval and answer generation

mod engine;

pub use engine::{QueryEngine, QueryOutcome};
