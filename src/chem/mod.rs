//! Chemistry module for protein structures

pub mod residues;

pub use residues::*;
