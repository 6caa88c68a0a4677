//! Residue feature extraction
//!
//! Walks a chain in sequence order and keeps the residues the vocabulary
//! knows. Every retained residue becomes one graph node, numbered 0..N in
//! retained order; that numbering (not the file's residue numbers) is what
//! adjacency indices refer to.

use crate::chem::{ResidueVocabulary, WATER_RESNAME};
use crate::geometry::compute_centroid;
use crate::structure::Chain;
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum FeatureError {
    #[error("Residue {name} {res_seq} has no atoms")]
    EmptyResidue { name: String, res_seq: i32 },
    #[error("Residue {name} {res_seq} atom {atom} has a non-finite coordinate")]
    NonFiniteCoordinate {
        name: String,
        res_seq: i32,
        atom: String,
    },
}

/// An atom tagged with the node index of its retained residue
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResidueAtom {
    pub residue: usize,
    pub coord: [f32; 3],
}

/// Per-residue features for the retained residues of one chain
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResidueRecord {
    /// Vocabulary index per retained residue
    pub residue_index: Vec<usize>,
    /// Mean atom position per retained residue
    pub coordinates: Vec<[f32; 3]>,
    /// Atoms of the retained residues, for proximity search
    pub atoms: Vec<ResidueAtom>,
}

impl ResidueRecord {
    pub fn num_residues(&self) -> usize {
        self.residue_index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.residue_index.is_empty()
    }
}

/// Extract residue indices and representative coordinates from a chain.
///
/// Water is skipped before lookup; residues missing from the vocabulary are
/// skipped without consuming a node index.
pub fn extract_residue_features(
    chain: &Chain,
    vocab: &ResidueVocabulary,
) -> Result<ResidueRecord, FeatureError> {
    let mut record = ResidueRecord::default();

    for residue in &chain.residues {
        if residue.name == WATER_RESNAME {
            continue;
        }

        let Some(res_type) = vocab.lookup(&residue.name) else {
            continue;
        };

        if let Some(bad) = residue
            .atoms
            .iter()
            .find(|a| a.coord.iter().any(|c| !c.is_finite()))
        {
            return Err(FeatureError::NonFiniteCoordinate {
                name: residue.name.clone(),
                res_seq: residue.res_seq,
                atom: bad.name.clone(),
            });
        }

        let centroid = compute_centroid(residue.atoms.iter().map(|a| &a.coord)).ok_or_else(|| {
            FeatureError::EmptyResidue {
                name: residue.name.clone(),
                res_seq: residue.res_seq,
            }
        })?;

        let node = record.residue_index.len();
        record.residue_index.push(res_type);
        record.coordinates.push(centroid);
        record.atoms.extend(residue.atoms.iter().map(|a| ResidueAtom {
            residue: node,
            coord: a.coord,
        }));
    }

    log::debug!(
        "Chain {}: {} residues -> {} retained, {} atoms",
        chain.id,
        chain.num_residues(),
        record.num_residues(),
        record.atoms.len()
    );

    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::structure::Residue;

    #[test]
    fn test_skips_water_and_unknown_residues() {
        let chain = Chain::new(
            "A",
            vec![
                Residue::new("ALA", 1).with_atom("CA", [0.0, 0.0, 0.0]),
                Residue::new("HOH", 2).with_atom("O", [9.0, 9.0, 9.0]),
                Residue::new("MSE", 3).with_atom("CA", [5.0, 5.0, 5.0]),
                Residue::new("GLY", 4).with_atom("CA", [1.0, 0.0, 0.0]),
            ],
        );

        let record = extract_residue_features(&chain, &ResidueVocabulary::standard()).unwrap();
        assert_eq!(record.residue_index, vec![0, 7]);
        assert_eq!(record.coordinates, vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0]]);
        // GLY is node 1 even though it is the fourth residue in the file
        assert_eq!(record.atoms.len(), 2);
        assert_eq!(record.atoms[1].residue, 1);
    }

    #[test]
    fn test_mean_atom_position() {
        let chain = Chain::new(
            "A",
            vec![Residue::new("SER", 1)
                .with_atom("N", [0.0, 0.0, 0.0])
                .with_atom("CA", [2.0, 0.0, 0.0])
                .with_atom("C", [1.0, 3.0, 0.0])
                .with_atom("O", [1.0, 1.0, 4.0])],
        );

        let record = extract_residue_features(&chain, &ResidueVocabulary::standard()).unwrap();
        let c = record.coordinates[0];
        assert!((c[0] - 1.0).abs() < 1e-6);
        assert!((c[1] - 1.0).abs() < 1e-6);
        assert!((c[2] - 1.0).abs() < 1e-6);
        assert!(record.atoms.iter().all(|a| a.residue == 0));
    }

    #[test]
    fn test_all_residues_filtered() {
        let chain = Chain::new(
            "A",
            vec![Residue::new("HOH", 1).with_atom("O", [0.0, 0.0, 0.0])],
        );
        let record = extract_residue_features(&chain, &ResidueVocabulary::standard()).unwrap();
        assert!(record.is_empty());
        assert!(record.atoms.is_empty());
    }

    #[test]
    fn test_malformed_residues_are_errors() {
        let empty = Chain::new("A", vec![Residue::new("LYS", 7)]);
        assert_eq!(
            extract_residue_features(&empty, &ResidueVocabulary::standard()),
            Err(FeatureError::EmptyResidue {
                name: "LYS".to_string(),
                res_seq: 7
            })
        );

        let nan = Chain::new(
            "A",
            vec![Residue::new("LYS", 7).with_atom("CA", [f32::NAN, 0.0, 0.0])],
        );
        assert!(matches!(
            extract_residue_features(&nan, &ResidueVocabulary::standard()),
            Err(FeatureError::NonFiniteCoordinate { .. })
        ));
    }
}
