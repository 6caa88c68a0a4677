//! Core data structures for protein parsing
//!
//! `RawAtomData` is the flat, column-oriented result of parsing a file (all
//! atoms of all models). `Chain` is the hierarchical view of one chain of one
//! model that the graph pipeline walks.

pub mod chain;

pub use chain::{Atom, Chain, Residue};

/// One parsed ATOM/HETATM record
#[derive(Clone, Debug, PartialEq)]
pub struct AtomRecord {
    pub atom_name: String,
    pub alt_loc: char,
    pub res_name: String,
    pub chain_id: String,
    pub res_seq: i32,
    pub i_code: char,
    pub coord: [f32; 3],
}

impl Default for AtomRecord {
    fn default() -> Self {
        Self {
            atom_name: String::new(),
            alt_loc: ' ',
            res_name: String::new(),
            chain_id: String::new(),
            res_seq: 0,
            i_code: ' ',
            coord: [0.0; 3],
        }
    }
}

/// Column store of parsed atoms, in file order
#[derive(Clone, Debug, Default)]
pub struct RawAtomData {
    pub coords: Vec<[f32; 3]>,
    pub atom_names: Vec<String>,
    pub alt_locs: Vec<char>,
    pub res_names: Vec<String>,
    pub res_ids: Vec<i32>,
    pub insertion_codes: Vec<char>,
    pub chain_ids: Vec<String>,
}

impl RawAtomData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, atom: AtomRecord) {
        self.coords.push(atom.coord);
        self.atom_names.push(atom.atom_name);
        self.alt_locs.push(atom.alt_loc);
        self.res_names.push(atom.res_name);
        self.res_ids.push(atom.res_seq);
        self.insertion_codes.push(atom.i_code);
        self.chain_ids.push(atom.chain_id);
    }

    pub fn len(&self) -> usize {
        self.coords.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coords.is_empty()
    }

    /// Distinct chain ids in order of first appearance
    pub fn chain_ids(&self) -> Vec<&str> {
        let mut seen: Vec<&str> = Vec::new();
        for id in &self.chain_ids {
            if !seen.contains(&id.as_str()) {
                seen.push(id);
            }
        }
        seen
    }
}
