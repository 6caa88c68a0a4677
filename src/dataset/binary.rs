//! One-vs-rest dataset: each positive record is paired with a drawn negative

use super::{make_rng, GraphPipeline, Sample, SampleError, SamplePair, SplitIndex};
use crate::chem::ResidueVocabulary;
use crate::io::{RcsbProvider, StructureProvider};
use crate::spec::{ConfigError, DatasetConfig};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

/// Draws negatives without replacement, reshuffling the full pool whenever
/// the live list runs dry.
#[derive(Debug, Clone)]
pub struct NegativeCursor {
    pool: Vec<String>,
    live: Vec<String>,
    rng: StdRng,
    refills: usize,
}

impl NegativeCursor {
    pub fn new(pool: Vec<String>, seed: Option<u64>) -> Result<Self, ConfigError> {
        if pool.is_empty() {
            return Err(ConfigError::EmptyPool(
                "no negative samples for the selected class".to_string(),
            ));
        }
        let mut rng = make_rng(seed);
        let mut live = pool.clone();
        live.shuffle(&mut rng);
        Ok(Self {
            pool,
            live,
            rng,
            refills: 0,
        })
    }

    /// Next negative identifier
    pub fn next_id(&mut self) -> String {
        loop {
            if let Some(id) = self.live.pop() {
                return id;
            }
            self.live = self.pool.clone();
            self.live.shuffle(&mut self.rng);
            self.refills += 1;
            log::debug!("Negative pool exhausted, reshuffled (refill {})", self.refills);
        }
    }

    /// How many times the pool has been reshuffled after running dry
    pub fn refills(&self) -> usize {
        self.refills
    }

    /// Draws left before the next refill
    pub fn remaining(&self) -> usize {
        self.live.len()
    }

    pub fn pool_size(&self) -> usize {
        self.pool.len()
    }
}

pub struct BinaryDataset {
    positives: Vec<String>,
    cursor: NegativeCursor,
    pipeline: GraphPipeline,
    rng: StdRng,
    class_idx: i64,
}

impl BinaryDataset {
    /// Records labelled `class_idx` are positives; every other record is a
    /// negative. Fails if either side is empty.
    pub fn new(
        config: &DatasetConfig,
        class_idx: i64,
        provider: Box<dyn StructureProvider>,
    ) -> Result<Self, ConfigError> {
        let index = SplitIndex::load(&config.split_file, config.split)?;

        let vocab = match &config.vocabulary {
            Some(path) => ResidueVocabulary::from_json_file(path)?,
            None => ResidueVocabulary::standard(),
        };
        let pipeline = GraphPipeline::new(provider, vocab, &config.graph)?;

        Self::from_parts(&index, class_idx, pipeline, config.graph.seed)
    }

    pub fn from_config(config: &DatasetConfig, class_idx: i64) -> Result<Self, ConfigError> {
        let provider =
            RcsbProvider::new(config.pdb_dir()).map_err(|e| ConfigError::Provider(e.to_string()))?;
        Self::new(config, class_idx, Box::new(provider))
    }

    pub fn from_parts(
        index: &SplitIndex,
        class_idx: i64,
        pipeline: GraphPipeline,
        seed: Option<u64>,
    ) -> Result<Self, ConfigError> {
        let (positives, negatives) = index.partition(class_idx);
        log::info!("Protein function index -> {}", class_idx);
        log::info!(
            "Data summary -> {} positive and {} negative samples",
            positives.len(),
            negatives.len()
        );

        if positives.is_empty() {
            return Err(ConfigError::EmptyPool(format!(
                "no positive samples for class {}",
                class_idx
            )));
        }

        // Separate streams so the negative order does not depend on augmentation draws
        let cursor = NegativeCursor::new(negatives, seed.map(|s| s.wrapping_add(1)))?;

        Ok(Self {
            positives,
            cursor,
            pipeline,
            rng: make_rng(seed),
            class_idx,
        })
    }

    /// Number of positive records
    pub fn len(&self) -> usize {
        self.positives.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positives.is_empty()
    }

    pub fn class_idx(&self) -> i64 {
        self.class_idx
    }

    pub fn cursor(&self) -> &NegativeCursor {
        &self.cursor
    }

    pub fn pipeline(&self) -> &GraphPipeline {
        &self.pipeline
    }

    /// Build positive `index` (label 1) and the next negative (label 0).
    ///
    /// The negative is drawn only after the positive builds, so a failed
    /// positive does not consume a negative.
    pub fn get(&mut self, index: usize) -> Result<SamplePair, SampleError> {
        let id = self
            .positives
            .get(index)
            .cloned()
            .ok_or(SampleError::IndexOutOfRange {
                index,
                len: self.positives.len(),
            })?;
        let positive = self.build(id, 1)?;

        let negative_id = self.cursor.next_id();
        let negative = self.build(negative_id, 0)?;

        Ok(SamplePair { positive, negative })
    }

    fn build(&mut self, id: String, label: i64) -> Result<Sample, SampleError> {
        match self.pipeline.build(&id, &mut self.rng) {
            Ok(graph) => Ok(Sample { graph, label, id }),
            Err(e) => {
                log::debug!("Failed to build sample {}: {}", id, e);
                Err(e)
            }
        }
    }
}
