use numpy::{PyArray1, ToPyArray};
use pyo3::exceptions::{PyIOError, PyIndexError, PyValueError};
use pyo3::prelude::*;
use pyo3::types::PyDict;

use crate::chem::ResidueVocabulary;
use crate::dataset::{make_rng, BinaryDataset, GraphPipeline, MulticlassDataset, SampleError};
use crate::formatters::ProteinGraph;
use crate::spec::{DatasetConfig, GraphSpec, Split};

fn value_err<E: std::fmt::Display>(e: E) -> PyErr {
    PyValueError::new_err(e.to_string())
}

fn sample_err(e: SampleError) -> PyErr {
    match e {
        SampleError::IndexOutOfRange { .. } => PyIndexError::new_err(e.to_string()),
        SampleError::Fetch { .. } => PyIOError::new_err(e.to_string()),
        _ => PyValueError::new_err(e.to_string()),
    }
}

fn to_i64(indices: &[usize]) -> Vec<i64> {
    indices.iter().map(|&i| i as i64).collect()
}

fn graph_to_dict<'py>(py: Python<'py>, graph: &ProteinGraph) -> PyResult<Bound<'py, PyDict>> {
    let dict = PyDict::new_bound(py);

    dict.set_item("node_feature", graph.node_feature.to_pyarray_bound(py))?;
    dict.set_item("node_coordinate", graph.node_coordinate.to_pyarray_bound(py))?;
    dict.set_item("edge_src", PyArray1::from_vec_bound(py, to_i64(&graph.src)))?;
    dict.set_item("edge_dst", PyArray1::from_vec_bound(py, to_i64(&graph.dst)))?;
    dict.set_item("edge_feature", graph.edge_feature.to_pyarray_bound(py))?;
    dict.set_item(
        "edge_displacement",
        graph.edge_displacement.to_pyarray_bound(py),
    )?;

    Ok(dict)
}

fn load_config(config_path: &str, split: Option<&str>) -> PyResult<DatasetConfig> {
    let mut config = DatasetConfig::from_json_file(config_path).map_err(value_err)?;
    if let Some(split) = split {
        config.split = split.parse::<Split>().map_err(value_err)?;
    }
    Ok(config)
}

/// Build the graph for one chain of a local PDB file
#[pyfunction]
#[pyo3(signature = (path, chain, cutoffs=None, augment=false, seed=None))]
pub fn build_graph(
    py: Python<'_>,
    path: String,
    chain: String,
    cutoffs: Option<Vec<f32>>,
    augment: bool,
    seed: Option<u64>,
) -> PyResult<PyObject> {
    let mut spec = GraphSpec::default().with_augment(augment);
    if let Some(cutoffs) = cutoffs {
        spec.cutoffs = cutoffs;
    }

    let text = std::fs::read_to_string(&path)
        .map_err(|e| PyIOError::new_err(format!("Failed to read {}: {}", path, e)))?;
    let pipeline =
        GraphPipeline::offline(ResidueVocabulary::standard(), &spec).map_err(value_err)?;

    let mut rng = make_rng(seed);
    let graph = pipeline
        .build_from_text(&path, &chain, &text, &mut rng)
        .map_err(sample_err)?;

    graph_to_dict(py, &graph).map(|dict| dict.into_py(py))
}

/// Bond class names for a cutoff list, indexed by bond label
#[pyfunction]
#[pyo3(signature = (cutoffs=None))]
pub fn bond_names(cutoffs: Option<Vec<f32>>) -> PyResult<Vec<String>> {
    let spec = match cutoffs {
        Some(cutoffs) => GraphSpec::new(cutoffs),
        None => GraphSpec::default(),
    };
    spec.validate().map_err(value_err)?;
    Ok(spec.bond_names())
}

/// Multiclass protein dataset; items are graph dicts with `label` and `id`
#[pyclass]
pub struct ProteinDataset {
    inner: MulticlassDataset,
}

#[pymethods]
impl ProteinDataset {
    #[new]
    #[pyo3(signature = (config_path, split=None))]
    fn new(config_path: String, split: Option<String>) -> PyResult<Self> {
        let config = load_config(&config_path, split.as_deref())?;
        let inner = MulticlassDataset::from_config(&config).map_err(value_err)?;
        Ok(Self { inner })
    }

    fn __len__(&self) -> usize {
        self.inner.len()
    }

    fn __getitem__(&mut self, py: Python<'_>, idx: usize) -> PyResult<PyObject> {
        let sample = self.inner.get(idx).map_err(sample_err)?;
        let dict = graph_to_dict(py, &sample.graph)?;
        dict.set_item("label", sample.label)?;
        dict.set_item("id", sample.id)?;
        Ok(dict.into_py(py))
    }

    #[getter]
    fn vocab_size(&self) -> usize {
        self.inner.pipeline().vocab_size()
    }

    #[getter]
    fn num_bonds(&self) -> usize {
        self.inner.pipeline().num_bonds()
    }
}

/// One-vs-rest dataset; items are `{"positive": ..., "negative": ...}`
#[pyclass]
pub struct BinaryProteinDataset {
    inner: BinaryDataset,
}

#[pymethods]
impl BinaryProteinDataset {
    #[new]
    #[pyo3(signature = (config_path, class_idx, split=None))]
    fn new(config_path: String, class_idx: i64, split: Option<String>) -> PyResult<Self> {
        let config = load_config(&config_path, split.as_deref())?;
        let inner = BinaryDataset::from_config(&config, class_idx).map_err(value_err)?;
        Ok(Self { inner })
    }

    fn __len__(&self) -> usize {
        self.inner.len()
    }

    fn __getitem__(&mut self, py: Python<'_>, idx: usize) -> PyResult<PyObject> {
        let pair = self.inner.get(idx).map_err(sample_err)?;
        let dict = PyDict::new_bound(py);
        for (key, sample) in [("positive", pair.positive), ("negative", pair.negative)] {
            let item = graph_to_dict(py, &sample.graph)?;
            item.set_item("label", sample.label)?;
            item.set_item("id", sample.id)?;
            dict.set_item(key, item)?;
        }
        Ok(dict.into_py(py))
    }

    #[getter]
    fn class_idx(&self) -> i64 {
        self.inner.class_idx()
    }
}
