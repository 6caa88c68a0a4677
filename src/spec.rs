//! Pipeline configuration
//!
//! Defines the GraphSpec struct that controls how structures are turned into
//! graphs, and the DatasetConfig that binds a split file, a structure cache
//! and a vocabulary together. Everything here is validated once, at dataset
//! construction; invalid settings never surface per sample.

use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

/// Default distance cutoffs (Angstroms) for the non-covalent bond classes
pub const DEFAULT_CUTOFFS: [f32; 2] = [3.0, 3.5];

/// Fatal configuration errors, raised at construction time
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid cutoff list {cutoffs:?}: {reason}")]
    Cutoffs { cutoffs: Vec<f32>, reason: String },

    #[error("Invalid residue vocabulary: {0}")]
    Vocabulary(String),

    #[error("Invalid split file {path}: {reason}")]
    SplitFile { path: PathBuf, reason: String },

    #[error("Unknown split '{0}'. Must be 'train', 'valid' or 'test'")]
    UnknownSplit(String),

    #[error("Empty sample pool: {0}")]
    EmptyPool(String),

    #[error("Failed to set up structure provider: {0}")]
    Provider(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Dataset split
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Split {
    #[default]
    Train,
    Valid,
    Test,
}

impl Split {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Train => "train",
            Self::Valid => "valid",
            Self::Test => "test",
        }
    }
}

impl FromStr for Split {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "train" => Ok(Self::Train),
            "valid" | "validation" => Ok(Self::Valid),
            "test" => Ok(Self::Test),
            _ => Err(ConfigError::UnknownSplit(s.to_string())),
        }
    }
}

impl fmt::Display for Split {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What to do with samples that fail to build when collating a batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorMode {
    /// Log a warning and drop the sample
    #[default]
    Warn,
    /// Drop the sample silently
    Skip,
    /// Fail the whole batch on the first failed sample
    Fail,
}

/// Graph construction settings
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct GraphSpec {
    /// Strictly increasing distance cutoffs, one bond class each
    pub cutoffs: Vec<f32>,
    /// Apply a random rotation to residue coordinates
    pub augment: bool,
    /// Seed for augmentation and negative-sample shuffling
    pub seed: Option<u64>,
}

impl Default for GraphSpec {
    fn default() -> Self {
        Self {
            cutoffs: DEFAULT_CUTOFFS.to_vec(),
            augment: true,
            seed: None,
        }
    }
}

impl GraphSpec {
    pub fn new(cutoffs: Vec<f32>) -> Self {
        Self {
            cutoffs,
            ..Self::default()
        }
    }

    pub fn with_augment(mut self, augment: bool) -> Self {
        self.augment = augment;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Check that the cutoffs are non-empty, positive, finite and strictly increasing
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_cutoffs(&self.cutoffs)
    }

    /// Number of bond classes: covalent plus one per cutoff
    pub fn num_bonds(&self) -> usize {
        self.cutoffs.len() + 1
    }

    /// Human-readable bond class names, indexed by bond label
    pub fn bond_names(&self) -> Vec<String> {
        let mut names = Vec::with_capacity(self.num_bonds());
        names.push("covalent".to_string());
        names.extend(self.cutoffs.iter().map(|c| format!("neighbor<{:.1}", c)));
        names
    }
}

pub(crate) fn validate_cutoffs(cutoffs: &[f32]) -> Result<(), ConfigError> {
    let fail = |reason: &str| ConfigError::Cutoffs {
        cutoffs: cutoffs.to_vec(),
        reason: reason.to_string(),
    };

    if cutoffs.is_empty() {
        return Err(fail("at least one cutoff is required"));
    }
    if cutoffs.iter().any(|c| !c.is_finite() || *c <= 0.0) {
        return Err(fail("cutoffs must be finite and positive"));
    }
    if cutoffs.windows(2).any(|w| w[1] <= w[0]) {
        return Err(fail("cutoffs must be strictly increasing"));
    }
    Ok(())
}

/// Dataset configuration, usually read from a JSON file
#[derive(Debug, Clone, Deserialize)]
pub struct DatasetConfig {
    /// JSON split file with `input_list` / `target_list` per split
    pub split_file: PathBuf,
    #[serde(default)]
    pub split: Split,
    /// Root of the structure cache; PDB files live under `<data_dir>/pdb/`
    pub data_dir: PathBuf,
    /// Residue vocabulary file; the 20 standard amino acids when absent
    #[serde(default)]
    pub vocabulary: Option<PathBuf>,
    #[serde(default)]
    pub graph: GraphSpec,
    /// Keep only samples whose label is in this list
    #[serde(default)]
    pub use_classes: Option<Vec<i64>>,
    #[serde(default)]
    pub error_mode: ErrorMode,
}

impl DatasetConfig {
    pub fn new<P: Into<PathBuf>, Q: Into<PathBuf>>(
        split_file: P,
        split: Split,
        data_dir: Q,
    ) -> Self {
        Self {
            split_file: split_file.into(),
            split,
            data_dir: data_dir.into(),
            vocabulary: None,
            graph: GraphSpec::default(),
            use_classes: None,
            error_mode: ErrorMode::default(),
        }
    }

    /// Load and validate a configuration file
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&text)?;
        config.graph.validate()?;
        Ok(config)
    }

    /// Directory holding cached `.pdb` files
    pub fn pdb_dir(&self) -> PathBuf {
        self.data_dir.join("pdb")
    }
}
