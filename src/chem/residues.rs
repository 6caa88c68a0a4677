//! Residue vocabulary for protein structures
//!
//! Maps residue names to dense categorical indices. The vocabulary is the
//! single source of truth for node identity: a residue whose name is not in
//! the vocabulary contributes no node to the graph.

use crate::spec::ConfigError;
use std::collections::HashMap;
use std::path::Path;

/// 1-letter to 3-letter code mapping
pub const RESTYPE_1TO3: [(&str, &str); 20] = [
    ("A", "ALA"),
    ("R", "ARG"),
    ("N", "ASN"),
    ("D", "ASP"),
    ("C", "CYS"),
    ("Q", "GLN"),
    ("E", "GLU"),
    ("G", "GLY"),
    ("H", "HIS"),
    ("I", "ILE"),
    ("L", "LEU"),
    ("K", "LYS"),
    ("M", "MET"),
    ("F", "PHE"),
    ("P", "PRO"),
    ("S", "SER"),
    ("T", "THR"),
    ("W", "TRP"),
    ("Y", "TYR"),
    ("V", "VAL"),
];

/// Number of standard residue types (20 amino acids)
pub const RESTYPE_NUM: usize = 20;

/// Water residue name; always dropped before vocabulary lookup
pub const WATER_RESNAME: &str = "HOH";

/// Build 3-letter to index mapping for the standard amino acids
pub fn build_resname_to_idx() -> HashMap<String, usize> {
    RESTYPE_1TO3
        .iter()
        .enumerate()
        .map(|(i, (_, three))| (three.to_string(), i))
        .collect()
}

/// Immutable residue-name to index mapping
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResidueVocabulary {
    index: HashMap<String, usize>,
}

impl ResidueVocabulary {
    /// Vocabulary of the 20 standard amino acids
    pub fn standard() -> Self {
        Self {
            index: build_resname_to_idx(),
        }
    }

    /// Build from an explicit mapping.
    ///
    /// Indices must be unique and cover `0..len` without gaps, otherwise
    /// the one-hot node features would not line up with the vocabulary size.
    pub fn from_map(index: HashMap<String, usize>) -> Result<Self, ConfigError> {
        if index.is_empty() {
            return Err(ConfigError::Vocabulary("vocabulary is empty".to_string()));
        }

        let n = index.len();
        let mut seen = vec![false; n];
        for (name, &idx) in &index {
            if idx >= n {
                return Err(ConfigError::Vocabulary(format!(
                    "index {} for residue '{}' is out of range for {} entries",
                    idx, name, n
                )));
            }
            if seen[idx] {
                return Err(ConfigError::Vocabulary(format!(
                    "index {} is assigned to more than one residue",
                    idx
                )));
            }
            seen[idx] = true;
        }

        Ok(Self { index })
    }

    /// Load a JSON object `{ "ALA": 0, "ARG": 1, ... }`
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let index: HashMap<String, usize> = serde_json::from_str(&text)?;
        let vocab = Self::from_map(index)?;
        log::info!(
            "Loaded residue vocabulary with {} entries from {}",
            vocab.len(),
            path.as_ref().display()
        );
        Ok(vocab)
    }

    /// Index of a residue name, or `None` when the residue is not modelled
    pub fn lookup(&self, res_name: &str) -> Option<usize> {
        self.index.get(res_name).copied()
    }

    /// Vocabulary size, i.e. the width of the one-hot node feature
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }
}

impl Default for ResidueVocabulary {
    fn default() -> Self {
        Self::standard()
    }
}
