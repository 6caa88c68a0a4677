//! Structure-to-graph pipeline for a single sample

use super::{SampleError, StructureId};
use crate::chem::ResidueVocabulary;
use crate::formats::pdb::parse_pdb_str;
use crate::formatters::{GraphAssembler, GraphError, ProteinGraph};
use crate::io::{FetchError, StructureProvider};
use crate::processing::{build_adjacency, extract_residue_features, RandomRotation};
use crate::spec::{ConfigError, GraphSpec};
use crate::structure::Chain;
use rand::rngs::StdRng;

/// Fetch, parse and assemble graphs for structure identifiers
pub struct GraphPipeline {
    provider: Option<Box<dyn StructureProvider>>,
    vocab: ResidueVocabulary,
    cutoffs: Vec<f32>,
    assembler: GraphAssembler,
}

impl GraphPipeline {
    /// Validates the graph settings; a bad cutoff list fails here, not per sample
    pub fn new(
        provider: Box<dyn StructureProvider>,
        vocab: ResidueVocabulary,
        spec: &GraphSpec,
    ) -> Result<Self, ConfigError> {
        let mut pipeline = Self::offline(vocab, spec)?;
        pipeline.provider = Some(provider);
        Ok(pipeline)
    }

    /// Pipeline without a structure source, for text already in memory.
    /// [`GraphPipeline::build`] fails with `FetchError::NoProvider`.
    pub fn offline(vocab: ResidueVocabulary, spec: &GraphSpec) -> Result<Self, ConfigError> {
        spec.validate()?;
        if vocab.is_empty() {
            return Err(ConfigError::Vocabulary("vocabulary is empty".to_string()));
        }

        let mut assembler = GraphAssembler::new(vocab.len(), spec.num_bonds());
        if spec.augment {
            assembler = assembler.with_transform(Box::new(RandomRotation));
        }

        Ok(Self {
            provider: None,
            vocab,
            cutoffs: spec.cutoffs.clone(),
            assembler,
        })
    }

    pub fn vocab(&self) -> &ResidueVocabulary {
        &self.vocab
    }

    /// Width of the one-hot node feature
    pub fn vocab_size(&self) -> usize {
        self.vocab.len()
    }

    /// Width of the one-hot edge feature
    pub fn num_bonds(&self) -> usize {
        self.assembler.num_bonds()
    }

    /// Build the graph for `<PDBID>.<CHAIN>`
    pub fn build(&self, identifier: &str, rng: &mut StdRng) -> Result<ProteinGraph, SampleError> {
        let sid = StructureId::parse(identifier)?;
        let text = match &self.provider {
            Some(provider) => provider.fetch(&sid.pdb_id),
            None => Err(FetchError::NoProvider(sid.pdb_id.clone())),
        }
        .map_err(|source| SampleError::Fetch {
                id: identifier.to_string(),
                source,
            })?;
        self.build_from_text(identifier, &sid.chain_id, &text, rng)
    }

    /// Build the graph for one chain of PDB text already in memory
    pub fn build_from_text(
        &self,
        identifier: &str,
        chain_id: &str,
        text: &str,
        rng: &mut StdRng,
    ) -> Result<ProteinGraph, SampleError> {
        let parse_error = |reason: String| SampleError::Parse {
            id: identifier.to_string(),
            reason,
        };

        let (raw, model_ids) = parse_pdb_str(text).map_err(|e| parse_error(e.to_string()))?;
        let chain = Chain::from_raw(&raw, &model_ids, chain_id)
            .ok_or_else(|| parse_error(format!("chain '{}' not found", chain_id)))?;

        let record = extract_residue_features(&chain, &self.vocab)
            .map_err(|e| parse_error(e.to_string()))?;
        if record.is_empty() {
            return Err(SampleError::EmptyChain {
                id: identifier.to_string(),
            });
        }

        let num_residues = record.num_residues();
        let adjacency = build_adjacency(&record.atoms, num_residues, &self.cutoffs)
            .map_err(|e| parse_error(e.to_string()))?;

        let graph = self
            .assembler
            .assemble(&record.residue_index, &record.coordinates, &adjacency, rng)
            .map_err(|source| match source {
                GraphError::EmptyGraph => SampleError::EmptyChain {
                    id: identifier.to_string(),
                },
                source => SampleError::Graph {
                    id: identifier.to_string(),
                    source,
                },
            })?;

        log::debug!(
            "Built graph for {}: {} nodes, {} edges",
            identifier,
            graph.num_nodes(),
            graph.num_edges()
        );

        Ok(graph)
    }
}
