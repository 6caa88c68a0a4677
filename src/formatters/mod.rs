//! Formatters turning processed structures into model-ready tensors

pub mod graph;

pub use graph::*;
