//! Multi-class dataset: one graph and one class label per record

use super::{make_rng, GraphPipeline, Sample, SampleError, SplitIndex};
use crate::chem::ResidueVocabulary;
use crate::io::{RcsbProvider, StructureProvider};
use crate::spec::{ConfigError, DatasetConfig};
use rand::rngs::StdRng;

pub struct MulticlassDataset {
    index: SplitIndex,
    pipeline: GraphPipeline,
    rng: StdRng,
}

impl MulticlassDataset {
    /// Build a dataset that reads structures through `provider`
    pub fn new(
        config: &DatasetConfig,
        provider: Box<dyn StructureProvider>,
    ) -> Result<Self, ConfigError> {
        let mut index = SplitIndex::load(&config.split_file, config.split)?;
        if let Some(classes) = &config.use_classes {
            index = index.filter_classes(classes);
        }

        let vocab = match &config.vocabulary {
            Some(path) => ResidueVocabulary::from_json_file(path)?,
            None => ResidueVocabulary::standard(),
        };
        let pipeline = GraphPipeline::new(provider, vocab, &config.graph)?;

        let num_classes = match &config.use_classes {
            Some(classes) => classes.len(),
            None => index.num_classes(),
        };
        log::info!(
            "Data summary -> {} protein classes, and {} protein samples",
            num_classes,
            index.len()
        );

        Ok(Self::from_parts(index, pipeline, config.graph.seed))
    }

    /// Build a dataset that downloads missing structures from RCSB into
    /// `<data_dir>/pdb/`
    pub fn from_config(config: &DatasetConfig) -> Result<Self, ConfigError> {
        let provider =
            RcsbProvider::new(config.pdb_dir()).map_err(|e| ConfigError::Provider(e.to_string()))?;
        Self::new(config, Box::new(provider))
    }

    pub fn from_parts(index: SplitIndex, pipeline: GraphPipeline, seed: Option<u64>) -> Self {
        Self {
            index,
            pipeline,
            rng: make_rng(seed),
        }
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn index(&self) -> &SplitIndex {
        &self.index
    }

    pub fn pipeline(&self) -> &GraphPipeline {
        &self.pipeline
    }

    /// Build the graph for record `index`, labelled with its class
    pub fn get(&mut self, index: usize) -> Result<Sample, SampleError> {
        let (id, label) = self
            .index
            .get(index)
            .ok_or(SampleError::IndexOutOfRange {
                index,
                len: self.index.len(),
            })?;
        let id = id.to_string();

        let graph = self.pipeline.build(&id, &mut self.rng).map_err(|e| {
            log::debug!("Failed to build sample {}: {}", id, e);
            e
        })?;

        Ok(Sample { graph, label, id })
    }
}
