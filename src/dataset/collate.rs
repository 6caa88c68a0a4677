//! Batch collation for dataset samples

use super::{Sample, SampleError, SamplePair};
use crate::formatters::{batch_graphs, BatchedGraph, GraphError};
use crate::spec::ErrorMode;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CollateError {
    #[error(transparent)]
    Sample(#[from] SampleError),
    #[error(transparent)]
    Graph(#[from] GraphError),
}

/// A batched graph with per-member labels and identifiers
#[derive(Debug, Clone)]
pub struct Batch {
    pub graph: BatchedGraph,
    pub labels: Vec<i64>,
    pub ids: Vec<String>,
}

impl Batch {
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

/// Merge samples into one batch, preserving order
pub fn collate(samples: &[Sample]) -> Result<Batch, GraphError> {
    let graph = batch_graphs(samples.iter().map(|s| &s.graph))?;
    Ok(Batch {
        graph,
        labels: samples.iter().map(|s| s.label).collect(),
        ids: samples.iter().map(|s| s.id.clone()).collect(),
    })
}

/// Merge positive/negative pairs: all positives first, then all negatives,
/// each half in input order
pub fn collate_pairs(pairs: &[SamplePair]) -> Result<Batch, GraphError> {
    let ordered: Vec<&Sample> = pairs
        .iter()
        .map(|p| &p.positive)
        .chain(pairs.iter().map(|p| &p.negative))
        .collect();

    let graph = batch_graphs(ordered.iter().map(|s| &s.graph))?;
    Ok(Batch {
        graph,
        labels: ordered.iter().map(|s| s.label).collect(),
        ids: ordered.iter().map(|s| s.id.clone()).collect(),
    })
}

/// Resolve per-sample results according to `mode`.
///
/// `Warn` and `Skip` drop failures (`Warn` logs each one); `Fail` returns
/// the first failure.
pub fn drop_failures<T>(
    results: Vec<Result<T, SampleError>>,
    mode: ErrorMode,
) -> Result<Vec<T>, SampleError> {
    let mut kept = Vec::with_capacity(results.len());
    let mut dropped = 0usize;

    for result in results {
        match result {
            Ok(sample) => kept.push(sample),
            Err(e) => match mode {
                ErrorMode::Fail => return Err(e),
                ErrorMode::Warn => {
                    log::warn!("Dropping sample from batch: {}", e);
                    dropped += 1;
                }
                ErrorMode::Skip => dropped += 1,
            },
        }
    }

    if dropped > 0 {
        log::debug!("Dropped {} failed samples, kept {}", dropped, kept.len());
    }
    Ok(kept)
}

/// Collate per-sample results, dropping or failing on errors per `mode`
pub fn collate_results(
    results: Vec<Result<Sample, SampleError>>,
    mode: ErrorMode,
) -> Result<Batch, CollateError> {
    let samples = drop_failures(results, mode)?;
    Ok(collate(&samples)?)
}

/// Pair variant of [`collate_results`]
pub fn collate_pair_results(
    results: Vec<Result<SamplePair, SampleError>>,
    mode: ErrorMode,
) -> Result<Batch, CollateError> {
    let pairs = drop_failures(results, mode)?;
    Ok(collate_pairs(&pairs)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::test_support::{linear_pdb, MemoryProvider};
    use crate::dataset::GraphPipeline;
    use crate::chem::ResidueVocabulary;
    use crate::spec::GraphSpec;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn sample(n: usize, label: i64) -> Sample {
        let id = format!("{}res", n);
        let pipeline = GraphPipeline::new(
            Box::new(MemoryProvider::default().with(&id, linear_pdb(n))),
            ResidueVocabulary::standard(),
            &GraphSpec::default().with_augment(false),
        )
        .unwrap();
        let graph = pipeline
            .build(&format!("{}.A", id), &mut StdRng::seed_from_u64(0))
            .unwrap();
        Sample {
            graph,
            label,
            id: format!("{}.A", id),
        }
    }

    #[test]
    fn test_collate_offsets_and_labels() {
        let batch = collate(&[sample(3, 4), sample(5, 9)]).unwrap();
        assert_eq!(batch.len(), 2);
        assert_eq!(batch.labels, vec![4, 9]);
        assert_eq!(batch.graph.batch_num_nodes, vec![3, 5]);
        assert_eq!(batch.graph.num_nodes(), 8);
        assert_eq!(batch.graph.num_edges(), 4 + 8);
        assert!(batch.graph.src[4..].iter().all(|&s| s >= 3));
    }

    #[test]
    fn test_collate_pairs_positives_first() {
        let pairs = vec![
            SamplePair {
                positive: sample(3, 1),
                negative: sample(4, 0),
            },
            SamplePair {
                positive: sample(5, 1),
                negative: sample(6, 0),
            },
        ];
        let batch = collate_pairs(&pairs).unwrap();
        assert_eq!(batch.labels, vec![1, 1, 0, 0]);
        assert_eq!(batch.ids, vec!["3res.A", "5res.A", "4res.A", "6res.A"]);
        assert_eq!(batch.graph.batch_num_nodes, vec![3, 5, 4, 6]);
    }

    #[test]
    fn test_collate_empty() {
        assert!(matches!(collate(&[]), Err(GraphError::EmptyBatch)));
    }

    #[test]
    fn test_drop_failures_modes() {
        let results = || -> Vec<Result<i32, SampleError>> {
            vec![
                Ok(1),
                Err(SampleError::EmptyChain { id: "x.A".into() }),
                Ok(3),
            ]
        };
        assert_eq!(drop_failures(results(), ErrorMode::Warn).unwrap(), vec![1, 3]);
        assert_eq!(drop_failures(results(), ErrorMode::Skip).unwrap(), vec![1, 3]);
        let err = drop_failures(results(), ErrorMode::Fail).unwrap_err();
        assert_eq!(err.id(), Some("x.A"));
    }

    #[test]
    fn test_collate_results() {
        let results = || {
            vec![
                Ok(sample(3, 2)),
                Err(SampleError::EmptyChain { id: "x.A".into() }),
                Ok(sample(4, 5)),
            ]
        };
        let batch = collate_results(results(), ErrorMode::Skip).unwrap();
        assert_eq!(batch.labels, vec![2, 5]);
        assert_eq!(batch.graph.batch_size(), 2);

        assert!(matches!(
            collate_results(results(), ErrorMode::Fail),
            Err(CollateError::Sample(SampleError::EmptyChain { .. }))
        ));
        let all_failed = vec![Err(SampleError::EmptyChain { id: "x.A".into() })];
        assert!(matches!(
            collate_results(all_failed, ErrorMode::Warn),
            Err(CollateError::Graph(GraphError::EmptyBatch))
        ));
    }
}
