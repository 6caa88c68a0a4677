//! Geometry operations for protein structures
//!
//! Provides cell-list proximity search and coordinate transforms.

pub mod cell_list;
pub mod transforms;

pub use cell_list::*;
pub use transforms::*;
