//! In-memory vector index and its on-disk persistence

pub mod persistence;
pub mod vector;

pub use vector::{IndexEntry, SearchHit, VectorIndex};
