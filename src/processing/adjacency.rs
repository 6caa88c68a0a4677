//! Multi-relational residue adjacency
//!
//! Residue pairs are related either covalently (sequence neighbours) or by
//! proximity: two residues are in contact at cutoff `c` when any atom of one
//! lies within `c` of any atom of the other. Each unordered pair carries a
//! single bond label:
//!
//! - label 0: covalent, every `(r-1, r)`; always wins
//! - label k+1: contact at `cutoffs[k]`, where k is the tightest cutoff the
//!   pair satisfies
//!
//! A contact between nodes `i < j` is only recorded when `i > 0`,
//! `j > i + 1` and `j < num_residues`, so node 0 never has contact edges and
//! sequence neighbours never get a contact label.

use crate::geometry::pairs_within_cutoff;
use crate::processing::residues::ResidueAtom;
use crate::spec::{validate_cutoffs, ConfigError};
use std::collections::BTreeMap;

/// Bond class of a residue pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BondType {
    /// Sequence-adjacent residues
    Covalent,
    /// Proximity contact at the cutoff with this index
    Contact(usize),
}

impl BondType {
    /// Dense label used for the one-hot edge feature
    pub fn label(&self) -> usize {
        match self {
            Self::Covalent => 0,
            Self::Contact(k) => k + 1,
        }
    }
}

/// Directed edge list, both directions of every adjacency pair
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DirectedEdges {
    pub src: Vec<usize>,
    pub dst: Vec<usize>,
    pub bonds: Vec<BondType>,
}

impl DirectedEdges {
    pub fn len(&self) -> usize {
        self.src.len()
    }

    pub fn is_empty(&self) -> bool {
        self.src.is_empty()
    }
}

/// Symmetric residue adjacency with one bond label per unordered pair
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Adjacency {
    num_residues: usize,
    /// Keyed by `(i, j)` with `i < j`
    pairs: BTreeMap<(usize, usize), BondType>,
}

impl Adjacency {
    pub fn num_residues(&self) -> usize {
        self.num_residues
    }

    /// Number of unordered pairs
    pub fn num_pairs(&self) -> usize {
        self.pairs.len()
    }

    /// Number of directed edges (two per pair)
    pub fn num_edges(&self) -> usize {
        2 * self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Bond between two residues, in either order
    pub fn get(&self, i: usize, j: usize) -> Option<BondType> {
        self.pairs.get(&(i.min(j), i.max(j))).copied()
    }

    /// Unordered pairs `(i, j, bond)` with `i < j`, in ascending order
    pub fn pairs(&self) -> impl Iterator<Item = (usize, usize, BondType)> + '_ {
        self.pairs.iter().map(|(&(i, j), &bond)| (i, j, bond))
    }

    /// Materialize both directions of every pair, sorted by `(src, dst)`
    pub fn directed_edges(&self) -> DirectedEdges {
        let mut edges: Vec<(usize, usize, BondType)> = self
            .pairs()
            .flat_map(|(i, j, bond)| [(i, j, bond), (j, i, bond)])
            .collect();
        edges.sort_unstable_by_key(|&(s, d, _)| (s, d));

        let mut out = DirectedEdges {
            src: Vec::with_capacity(edges.len()),
            dst: Vec::with_capacity(edges.len()),
            bonds: Vec::with_capacity(edges.len()),
        };
        for (s, d, bond) in edges {
            out.src.push(s);
            out.dst.push(d);
            out.bonds.push(bond);
        }
        out
    }
}

/// Whether a residue pair may carry a contact label
#[inline]
fn contact_allowed(i: usize, j: usize, num_residues: usize) -> bool {
    i > 0 && i + 1 < j && j < num_residues
}

/// Build the adjacency for `num_residues` nodes from their atoms.
///
/// `cutoffs` must be strictly increasing. A single cell-list pass at the
/// widest cutoff finds every candidate atom pair; each residue pair keeps its
/// closest atom distance, which then selects the tightest matching cutoff.
pub fn build_adjacency(
    atoms: &[ResidueAtom],
    num_residues: usize,
    cutoffs: &[f32],
) -> Result<Adjacency, ConfigError> {
    validate_cutoffs(cutoffs)?;

    let mut adjacency = Adjacency {
        num_residues,
        pairs: BTreeMap::new(),
    };
    if num_residues == 0 {
        return Ok(adjacency);
    }

    let coords: Vec<[f32; 3]> = atoms.iter().map(|a| a.coord).collect();
    let widest = cutoffs[cutoffs.len() - 1];

    // Closest atom-atom squared distance per residue pair
    let mut closest: BTreeMap<(usize, usize), f32> = BTreeMap::new();
    for (a, b, dist_sq) in pairs_within_cutoff(&coords, widest) {
        let (ra, rb) = (atoms[a].residue, atoms[b].residue);
        let (i, j) = (ra.min(rb), ra.max(rb));
        if !contact_allowed(i, j, num_residues) {
            continue;
        }
        closest
            .entry((i, j))
            .and_modify(|d| *d = d.min(dist_sq))
            .or_insert(dist_sq);
    }

    for (pair, dist_sq) in closest {
        if let Some(k) = cutoffs.iter().position(|c| dist_sq <= c * c) {
            adjacency.pairs.insert(pair, BondType::Contact(k));
        }
    }
    let num_contacts = adjacency.pairs.len();

    // Covalent bonds override any contact label
    for r in 1..num_residues {
        adjacency.pairs.insert((r - 1, r), BondType::Covalent);
    }

    log::debug!(
        "Adjacency: {} residues, {} atoms, {} contact pairs, {} covalent pairs",
        num_residues,
        atoms.len(),
        num_contacts,
        num_residues - 1
    );

    Ok(adjacency)
}
