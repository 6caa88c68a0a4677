//! File format parsers

pub mod pdb;

pub use pdb::PdbError;
