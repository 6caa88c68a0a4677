//! Structure processing module
//!
//! Residue feature extraction, multi-relational adjacency construction and
//! coordinate augmentation.

pub mod adjacency;
pub mod augmentation;
pub mod residues;

pub use adjacency::*;
pub use augmentation::*;
pub use residues::*;
