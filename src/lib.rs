//! Protein graph construction
//!
//! Turns PDB protein chains into multi-relational residue graphs for
//! equivariant models: one node per standard residue, covalent and
//! distance-cutoff edges, optional random-rotation augmentation, and
//! multiclass / one-vs-rest datasets with batch collation.
//!
//! Python bindings are available behind the `python` feature.

pub mod chem;
pub mod dataset;
pub mod formats;
pub mod formatters;
pub mod geometry;
pub mod io;
pub mod processing;
pub mod spec;
pub mod structure;

#[cfg(feature = "python")]
mod py_dataset;

pub use dataset::{
    BinaryDataset, GraphPipeline, MulticlassDataset, Sample, SampleError, SamplePair,
};
pub use formatters::{BatchedGraph, ProteinGraph};
pub use spec::{ConfigError, DatasetConfig, ErrorMode, GraphSpec, Split};

#[cfg(feature = "python")]
use pyo3::prelude::*;

/// Python module
#[cfg(feature = "python")]
#[pymodule]
fn _protein_graph(m: &Bound<'_, PyModule>) -> PyResult<()> {
    pyo3_log::init();

    m.add_function(wrap_pyfunction!(py_dataset::build_graph, m)?)?;
    m.add_function(wrap_pyfunction!(py_dataset::bond_names, m)?)?;

    m.add_class::<py_dataset::ProteinDataset>()?;
    m.add_class::<py_dataset::BinaryProteinDataset>()?;

    Ok(())
}
