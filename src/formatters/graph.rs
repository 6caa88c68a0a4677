//! Graph assembly and batching
//!
//! Turns residue features plus an adjacency into the tensors the equivariant
//! model consumes:
//!
//! | key                 | shape              |
//! |---------------------|--------------------|
//! | `node_feature`      | (N, vocab_size, 1) |
//! | `node_coordinate`   | (N, 3)             |
//! | `edge_feature`      | (E, num_bonds)     |
//! | `edge_displacement` | (E, 3)             |
//!
//! Edge `e` runs from `src[e]` to `dst[e]`; its displacement is
//! `coordinate[dst] - coordinate[src]` taken after augmentation.

use crate::processing::{Adjacency, CoordinateTransform};
use ndarray::{concatenate, Array2, Array3, ArrayView2, ArrayView3, Axis};
use rand::rngs::StdRng;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GraphError {
    #[error("Graph has no nodes")]
    EmptyGraph,
    #[error("Cannot batch an empty list of graphs")]
    EmptyBatch,
    #[error("Length mismatch: {residues} residue indices vs {coordinates} coordinates")]
    LengthMismatch { residues: usize, coordinates: usize },
    #[error("Residue index {index} out of range for vocabulary of size {vocab_size}")]
    ResidueIndexOutOfRange { index: usize, vocab_size: usize },
    #[error("Bond label {label} out of range for {num_bonds} bond classes")]
    BondLabelOutOfRange { label: usize, num_bonds: usize },
    #[error("Adjacency covers {adjacency} residues but graph has {nodes} nodes")]
    AdjacencyMismatch { adjacency: usize, nodes: usize },
    #[error("Incompatible feature shapes: {0}")]
    Shape(#[from] ndarray::ShapeError),
}

/// Directed multi-relational residue graph
#[derive(Debug, Clone, PartialEq)]
pub struct ProteinGraph {
    /// One-hot residue identity with a trailing singleton axis
    pub node_feature: Array3<f32>,
    /// Residue coordinates (possibly augmented)
    pub node_coordinate: Array2<f32>,
    pub src: Vec<usize>,
    pub dst: Vec<usize>,
    /// One-hot bond class
    pub edge_feature: Array2<f32>,
    /// `coordinate[dst] - coordinate[src]`
    pub edge_displacement: Array2<f32>,
}

impl ProteinGraph {
    pub fn num_nodes(&self) -> usize {
        self.node_coordinate.nrows()
    }

    pub fn num_edges(&self) -> usize {
        self.src.len()
    }

    /// Bond label of every edge, recovered from the one-hot feature
    pub fn edge_labels(&self) -> Vec<usize> {
        self.edge_feature
            .rows()
            .into_iter()
            .map(|row| row.iter().position(|&v| v == 1.0).unwrap_or(0))
            .collect()
    }
}

/// Builds graphs with a fixed vocabulary size, bond class count and optional
/// coordinate transform
#[derive(Debug)]
pub struct GraphAssembler {
    vocab_size: usize,
    num_bonds: usize,
    transform: Option<Box<dyn CoordinateTransform>>,
}

impl GraphAssembler {
    pub fn new(vocab_size: usize, num_bonds: usize) -> Self {
        Self {
            vocab_size,
            num_bonds,
            transform: None,
        }
    }

    pub fn with_transform(mut self, transform: Box<dyn CoordinateTransform>) -> Self {
        self.transform = Some(transform);
        self
    }

    pub fn vocab_size(&self) -> usize {
        self.vocab_size
    }

    pub fn num_bonds(&self) -> usize {
        self.num_bonds
    }

    /// Assemble one graph.
    ///
    /// The transform (if any) is applied to a copy of `coordinates` before
    /// edge displacements are computed.
    pub fn assemble(
        &self,
        residue_index: &[usize],
        coordinates: &[[f32; 3]],
        adjacency: &Adjacency,
        rng: &mut StdRng,
    ) -> Result<ProteinGraph, GraphError> {
        let n = residue_index.len();
        if n == 0 {
            return Err(GraphError::EmptyGraph);
        }
        if coordinates.len() != n {
            return Err(GraphError::LengthMismatch {
                residues: n,
                coordinates: coordinates.len(),
            });
        }
        if adjacency.num_residues() != n {
            return Err(GraphError::AdjacencyMismatch {
                adjacency: adjacency.num_residues(),
                nodes: n,
            });
        }

        let mut coords = coordinates.to_vec();
        if let Some(transform) = &self.transform {
            transform.apply(&mut coords, rng);
        }

        let mut node_feature = Array3::<f32>::zeros((n, self.vocab_size, 1));
        for (i, &idx) in residue_index.iter().enumerate() {
            if idx >= self.vocab_size {
                return Err(GraphError::ResidueIndexOutOfRange {
                    index: idx,
                    vocab_size: self.vocab_size,
                });
            }
            node_feature[[i, idx, 0]] = 1.0;
        }

        let node_coordinate = Array2::from_shape_fn((n, 3), |(i, k)| coords[i][k]);

        let edges = adjacency.directed_edges();
        let num_edges = edges.len();

        let mut edge_feature = Array2::<f32>::zeros((num_edges, self.num_bonds));
        for (e, bond) in edges.bonds.iter().enumerate() {
            let label = bond.label();
            if label >= self.num_bonds {
                return Err(GraphError::BondLabelOutOfRange {
                    label,
                    num_bonds: self.num_bonds,
                });
            }
            edge_feature[[e, label]] = 1.0;
        }

        let edge_displacement = Array2::from_shape_fn((num_edges, 3), |(e, k)| {
            coords[edges.dst[e]][k] - coords[edges.src[e]][k]
        });

        Ok(ProteinGraph {
            node_feature,
            node_coordinate,
            src: edges.src,
            dst: edges.dst,
            edge_feature,
            edge_displacement,
        })
    }
}

/// Several graphs merged into one disjoint graph
#[derive(Debug, Clone, PartialEq)]
pub struct BatchedGraph {
    pub node_feature: Array3<f32>,
    pub node_coordinate: Array2<f32>,
    /// Source node per edge, offset into the batched node numbering
    pub src: Vec<usize>,
    pub dst: Vec<usize>,
    pub edge_feature: Array2<f32>,
    pub edge_displacement: Array2<f32>,
    /// Node count of each member graph, in batch order
    pub batch_num_nodes: Vec<usize>,
    /// Edge count of each member graph, in batch order
    pub batch_num_edges: Vec<usize>,
}

impl BatchedGraph {
    pub fn batch_size(&self) -> usize {
        self.batch_num_nodes.len()
    }

    pub fn num_nodes(&self) -> usize {
        self.node_coordinate.nrows()
    }

    pub fn num_edges(&self) -> usize {
        self.src.len()
    }
}

/// Merge graphs in the given order, renumbering nodes so that graph `g`
/// occupies the node range after all graphs before it
pub fn batch_graphs<'a, I>(graphs: I) -> Result<BatchedGraph, GraphError>
where
    I: IntoIterator<Item = &'a ProteinGraph>,
{
    let graphs: Vec<&ProteinGraph> = graphs.into_iter().collect();
    if graphs.is_empty() {
        return Err(GraphError::EmptyBatch);
    }

    let mut src = Vec::new();
    let mut dst = Vec::new();
    let mut batch_num_nodes = Vec::with_capacity(graphs.len());
    let mut batch_num_edges = Vec::with_capacity(graphs.len());
    let mut offset = 0;

    for g in &graphs {
        src.extend(g.src.iter().map(|s| s + offset));
        dst.extend(g.dst.iter().map(|d| d + offset));
        batch_num_nodes.push(g.num_nodes());
        batch_num_edges.push(g.num_edges());
        offset += g.num_nodes();
    }

    let node_feature_views: Vec<ArrayView3<f32>> =
        graphs.iter().map(|g| g.node_feature.view()).collect();
    let node_coordinate_views: Vec<ArrayView2<f32>> =
        graphs.iter().map(|g| g.node_coordinate.view()).collect();
    let edge_feature_views: Vec<ArrayView2<f32>> =
        graphs.iter().map(|g| g.edge_feature.view()).collect();
    let edge_displacement_views: Vec<ArrayView2<f32>> =
        graphs.iter().map(|g| g.edge_displacement.view()).collect();

    Ok(BatchedGraph {
        node_feature: concatenate(Axis(0), &node_feature_views)?,
        node_coordinate: concatenate(Axis(0), &node_coordinate_views)?,
        src,
        dst,
        edge_feature: concatenate(Axis(0), &edge_feature_views)?,
        edge_displacement: concatenate(Axis(0), &edge_displacement_views)?,
        batch_num_nodes,
        batch_num_edges,
    })
}
