//! Datasets of protein graphs
//!
//! A dataset owns one split's `(identifier, label)` records and turns an
//! index into a graph sample: fetch the PDB file, parse the requested chain,
//! extract residue features, build the adjacency and assemble the graph.
//!
//! Per-sample failures come back as `SampleError` and never as a placeholder
//! graph. Datasets take `&mut self` in `get` because augmentation and
//! negative sampling draw from owned random state; give each worker its own
//! dataset (with its own seed) rather than sharing one.

pub mod binary;
pub mod collate;
pub mod index;
pub mod multiclass;
pub mod pipeline;

pub use binary::{BinaryDataset, NegativeCursor};
pub use collate::{
    collate, collate_pair_results, collate_pairs, collate_results, drop_failures, Batch,
    CollateError,
};
pub use index::SplitIndex;
pub use multiclass::MulticlassDataset;
pub use pipeline::GraphPipeline;

use crate::formatters::{GraphError, ProteinGraph};
use crate::io::FetchError;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::fmt;
use thiserror::Error;

/// Recoverable failure building one sample
#[derive(Error, Debug)]
pub enum SampleError {
    #[error("Failed to fetch {id}: {source}")]
    Fetch {
        id: String,
        #[source]
        source: FetchError,
    },
    #[error("Failed to parse {id}: {reason}")]
    Parse { id: String, reason: String },
    #[error("No residues retained for {id}")]
    EmptyChain { id: String },
    #[error("Failed to assemble graph for {id}: {source}")]
    Graph {
        id: String,
        #[source]
        source: GraphError,
    },
    #[error("Invalid structure identifier '{0}', expected '<PDBID>.<CHAIN>'")]
    InvalidIdentifier(String),
    #[error("Index {index} out of range for dataset of length {len}")]
    IndexOutOfRange { index: usize, len: usize },
}

impl SampleError {
    /// Structure identifier the failure belongs to, if any
    pub fn id(&self) -> Option<&str> {
        match self {
            Self::Fetch { id, .. }
            | Self::Parse { id, .. }
            | Self::EmptyChain { id }
            | Self::Graph { id, .. } => Some(id),
            Self::InvalidIdentifier(id) => Some(id),
            Self::IndexOutOfRange { .. } => None,
        }
    }
}

/// `<PDBID>.<CHAIN>` structure identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StructureId {
    pub pdb_id: String,
    pub chain_id: String,
}

impl StructureId {
    pub fn parse(identifier: &str) -> Result<Self, SampleError> {
        match identifier.split_once('.') {
            Some((pdb_id, chain_id)) if !pdb_id.is_empty() && !chain_id.is_empty() => Ok(Self {
                pdb_id: pdb_id.to_string(),
                chain_id: chain_id.to_string(),
            }),
            _ => Err(SampleError::InvalidIdentifier(identifier.to_string())),
        }
    }
}

impl fmt::Display for StructureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.pdb_id, self.chain_id)
    }
}

/// One labelled graph
#[derive(Debug, Clone)]
pub struct Sample {
    pub graph: ProteinGraph,
    pub label: i64,
    pub id: String,
}

/// A positive sample (label 1) with a drawn negative sample (label 0)
#[derive(Debug, Clone)]
pub struct SamplePair {
    pub positive: Sample,
    pub negative: Sample,
}

pub(crate) fn make_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    //! In-memory structures for dataset tests

    use crate::io::{FetchError, StructureProvider};
    use std::collections::HashMap;

    const RESNAMES: [&str; 6] = ["ALA", "GLY", "SER", "LEU", "VAL", "LYS"];

    /// PDB text for chain A with one CA atom per residue at the given positions
    pub fn ca_chain_pdb(coords: &[[f32; 3]]) -> String {
        let mut text = String::new();
        for (i, c) in coords.iter().enumerate() {
            text.push_str(&format!(
                "ATOM  {:>5}  CA  {} A{:>4}    {:>8.3}{:>8.3}{:>8.3}  1.00  0.00           C\n",
                i + 1,
                RESNAMES[i % RESNAMES.len()],
                i + 1,
                c[0],
                c[1],
                c[2]
            ));
        }
        text.push_str("END\n");
        text
    }

    /// Residues spaced 10 A apart along x
    pub fn linear_pdb(n: usize) -> String {
        let coords: Vec<[f32; 3]> = (0..n).map(|i| [10.0 * i as f32, 0.0, 0.0]).collect();
        ca_chain_pdb(&coords)
    }

    #[derive(Debug, Default)]
    pub struct MemoryProvider {
        pub files: HashMap<String, String>,
    }

    impl MemoryProvider {
        pub fn with(mut self, pdb_id: &str, text: String) -> Self {
            self.files.insert(pdb_id.to_string(), text);
            self
        }
    }

    impl StructureProvider for MemoryProvider {
        fn fetch(&self, pdb_id: &str) -> Result<String, FetchError> {
            self.files
                .get(pdb_id)
                .cloned()
                .ok_or_else(|| FetchError::NotFound(pdb_id.to_string()))
        }
    }
}
