//! Structure file retrieval

pub mod fetching;

pub use fetching::*;
