//! Hierarchical chain view over parsed atoms
//!
//! Residues appear in file storage order, which is taken as the sequence
//! order. Consecutive atoms sharing residue number and insertion code form one
//! residue. At a microheterogeneity site (alternate locations carrying
//! different residue names) the first conformer's name is kept and atoms of
//! the other conformers are dropped.

use super::RawAtomData;

/// A single atom of a residue
#[derive(Debug, Clone, PartialEq)]
pub struct Atom {
    pub name: String,
    pub coord: [f32; 3],
}

/// A residue: a name plus its atoms in file order
#[derive(Debug, Clone, PartialEq)]
pub struct Residue {
    pub name: String,
    pub res_seq: i32,
    pub insertion_code: char,
    pub atoms: Vec<Atom>,
}

impl Residue {
    pub fn new(name: &str, res_seq: i32) -> Self {
        Self {
            name: name.to_string(),
            res_seq,
            insertion_code: ' ',
            atoms: Vec::new(),
        }
    }

    /// Builder-style atom push, mostly for synthetic chains
    pub fn with_atom(mut self, name: &str, coord: [f32; 3]) -> Self {
        self.atoms.push(Atom {
            name: name.to_string(),
            coord,
        });
        self
    }
}

/// One chain of one model
#[derive(Debug, Clone, PartialEq)]
pub struct Chain {
    pub id: String,
    pub residues: Vec<Residue>,
}

impl Chain {
    pub fn new(id: &str, residues: Vec<Residue>) -> Self {
        Self {
            id: id.to_string(),
            residues,
        }
    }

    /// Extract chain `chain_id` from the first model of a parsed file.
    ///
    /// Returns `None` when the first model has no atoms for that chain.
    /// Alternate locations are collapsed by keeping the first occurrence of
    /// each atom name within a residue. A name change at the same residue
    /// number without an alternate location starts a new residue.
    pub fn from_raw(raw: &RawAtomData, model_ids: &[usize], chain_id: &str) -> Option<Self> {
        let first_model = model_ids.first().copied()?;
        let mut residues: Vec<Residue> = Vec::new();

        for i in 0..raw.len() {
            if model_ids[i] != first_model || raw.chain_ids[i] != chain_id {
                continue;
            }

            let res_seq = raw.res_ids[i];
            let i_code = raw.insertion_codes[i];
            let res_name = &raw.res_names[i];
            let alt_loc = raw.alt_locs[i];

            let same_site = residues
                .last()
                .is_some_and(|last| last.res_seq == res_seq && last.insertion_code == i_code);
            let same_name = residues.last().is_some_and(|last| &last.name == res_name);

            if same_site && !same_name && alt_loc != ' ' {
                // Conformer of a point mutation at an already open residue
                continue;
            }
            if !(same_site && same_name) {
                residues.push(Residue {
                    name: res_name.clone(),
                    res_seq,
                    insertion_code: i_code,
                    atoms: Vec::new(),
                });
            }

            if let Some(residue) = residues.last_mut() {
                let atom_name = &raw.atom_names[i];
                if residue.atoms.iter().any(|a| &a.name == atom_name) {
                    continue;
                }
                residue.atoms.push(Atom {
                    name: atom_name.clone(),
                    coord: raw.coords[i],
                });
            }
        }

        if residues.is_empty() {
            return None;
        }

        Some(Self {
            id: chain_id.to_string(),
            residues,
        })
    }

    pub fn num_residues(&self) -> usize {
        self.residues.len()
    }

    /// Total atoms over all residues
    pub fn num_atoms(&self) -> usize {
        self.residues.iter().map(|r| r.atoms.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::structure::AtomRecord;

    fn record(
        chain: &str,
        res_name: &str,
        res_seq: i32,
        atom: &str,
        alt: char,
        x: f32,
    ) -> AtomRecord {
        AtomRecord {
            atom_name: atom.to_string(),
            alt_loc: alt,
            res_name: res_name.to_string(),
            chain_id: chain.to_string(),
            res_seq,
            coord: [x, 0.0, 0.0],
            ..Default::default()
        }
    }

    #[test]
    fn test_groups_residues_in_storage_order() {
        let mut raw = RawAtomData::new();
        raw.push(record("A", "MET", 5, "N", ' ', 0.0));
        raw.push(record("A", "MET", 5, "CA", ' ', 1.0));
        raw.push(record("A", "GLY", 2, "N", ' ', 2.0));
        raw.push(record("B", "ALA", 1, "N", ' ', 3.0));
        raw.push(record("A", "HOH", 301, "O", ' ', 4.0));
        let model_ids = vec![1; raw.len()];

        let chain = Chain::from_raw(&raw, &model_ids, "A").unwrap();
        let names: Vec<&str> = chain.residues.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["MET", "GLY", "HOH"]);
        assert_eq!(chain.residues[0].atoms.len(), 2);
        assert_eq!(chain.num_atoms(), 4);
    }

    #[test]
    fn test_first_model_only() {
        let mut raw = RawAtomData::new();
        raw.push(record("A", "ALA", 1, "CA", ' ', 0.0));
        raw.push(record("A", "ALA", 1, "CA", ' ', 9.0));
        let model_ids = vec![1, 2];

        let chain = Chain::from_raw(&raw, &model_ids, "A").unwrap();
        assert_eq!(chain.num_atoms(), 1);
        assert_eq!(chain.residues[0].atoms[0].coord[0], 0.0);
    }

    #[test]
    fn test_alt_locs_collapsed() {
        let mut raw = RawAtomData::new();
        raw.push(record("A", "SER", 1, "CA", ' ', 0.0));
        raw.push(record("A", "SER", 1, "OG", 'A', 1.0));
        raw.push(record("A", "SER", 1, "OG", 'B', 5.0));
        let model_ids = vec![1; 3];

        let chain = Chain::from_raw(&raw, &model_ids, "A").unwrap();
        assert_eq!(chain.residues[0].atoms.len(), 2);
        assert_eq!(chain.residues[0].atoms[1].coord[0], 1.0);
    }

    #[test]
    fn test_microheterogeneity_is_one_residue() {
        let mut raw = RawAtomData::new();
        raw.push(record("A", "ALA", 1, "CA", ' ', 0.0));
        raw.push(record("A", "SER", 2, "N", 'A', 3.0));
        raw.push(record("A", "SER", 2, "CA", 'A', 4.0));
        raw.push(record("A", "SER", 2, "OG", 'A', 5.0));
        raw.push(record("A", "THR", 2, "N", 'B', 3.1));
        raw.push(record("A", "THR", 2, "CA", 'B', 4.1));
        raw.push(record("A", "THR", 2, "OG1", 'B', 5.1));
        raw.push(record("A", "GLY", 3, "CA", ' ', 8.0));
        let model_ids = vec![1; raw.len()];

        let chain = Chain::from_raw(&raw, &model_ids, "A").unwrap();
        let names: Vec<&str> = chain.residues.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["ALA", "SER", "GLY"]);

        let ser = &chain.residues[1];
        let atoms: Vec<&str> = ser.atoms.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(atoms, vec!["N", "CA", "OG"]);
        assert_eq!(ser.atoms[1].coord[0], 4.0);
    }

    #[test]
    fn test_missing_chain() {
        let mut raw = RawAtomData::new();
        raw.push(record("A", "ALA", 1, "CA", ' ', 0.0));
        assert!(Chain::from_raw(&raw, &[1], "Z").is_none());
        assert!(Chain::from_raw(&RawAtomData::new(), &[], "A").is_none());
    }
}
