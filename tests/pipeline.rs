use protein_graph::dataset::{collate, collate_pair_results, collate_results, CollateError};
use protein_graph::io::LocalProvider;
use protein_graph::{
    BinaryDataset, DatasetConfig, ErrorMode, MulticlassDataset, SampleError, Split,
};
use std::path::Path;

fn ca_line(serial: usize, res_name: &str, res_seq: usize, c: [f32; 3]) -> String {
    format!(
        "ATOM  {:>5}  CA  {} A{:>4}    {:>8.3}{:>8.3}{:>8.3}  1.00  0.00           C\n",
        serial, res_name, res_seq, c[0], c[1], c[2]
    )
}

/// Chain A with a CA-only backbone along x, plus a water and an unknown ligand
fn write_structure(dir: &Path, pdb_id: &str, n: usize) {
    let mut text = String::from("HEADER    TEST STRUCTURE\n");
    for i in 0..n {
        text.push_str(&ca_line(i + 1, "ALA", i + 1, [4.0 * i as f32, 0.0, 0.0]));
    }
    text.push_str(
        "HETATM  900  O   HOH A 501       0.000   5.000   0.000  1.00  0.00           O\n",
    );
    text.push_str(
        "HETATM  901  C1  LIG A 601       4.000   1.000   0.000  1.00  0.00           C\n",
    );
    text.push_str("END\n");
    std::fs::write(dir.join(format!("{}.pdb", pdb_id)), text).unwrap();
}

struct Fixture {
    _root: tempfile::TempDir,
    config: DatasetConfig,
}

fn fixture() -> Fixture {
    let root = tempfile::tempdir().unwrap();
    let pdb_dir = root.path().join("pdb");
    std::fs::create_dir_all(&pdb_dir).unwrap();

    write_structure(&pdb_dir, "1aaa", 5);
    write_structure(&pdb_dir, "1bbb", 3);
    write_structure(&pdb_dir, "1ccc", 4);
    // 1zzz is listed but never written

    let split_path = root.path().join("split.json");
    std::fs::write(
        &split_path,
        r#"{
            "train": {
                "input_list": ["1aaa.A", "1bbb.A", "1ccc.A", "1zzz.A"],
                "target_list": [3, 1, 3, 1]
            },
            "valid": {"input_list": ["1bbb.A"], "target_list": [1]}
        }"#,
    )
    .unwrap();

    let config_path = root.path().join("config.json");
    let config_json = serde_json::json!({
        "split_file": split_path,
        "split": "train",
        "data_dir": root.path(),
        "graph": {"cutoffs": [3.0, 3.5], "augment": true, "seed": 42},
        "error_mode": "warn"
    });
    std::fs::write(&config_path, config_json.to_string()).unwrap();

    let config = DatasetConfig::from_json_file(&config_path).unwrap();
    Fixture {
        _root: root,
        config,
    }
}

fn local(config: &DatasetConfig) -> Box<LocalProvider> {
    Box::new(LocalProvider::new(config.pdb_dir()))
}

#[test]
fn test_config_loads_from_json() {
    let fx = fixture();
    assert_eq!(fx.config.split, Split::Train);
    assert_eq!(fx.config.error_mode, ErrorMode::Warn);
    assert_eq!(fx.config.graph.seed, Some(42));
    assert!(fx.config.pdb_dir().ends_with("pdb"));
}

#[test]
fn test_multiclass_end_to_end() {
    let fx = fixture();
    let mut ds = MulticlassDataset::new(&fx.config, local(&fx.config)).unwrap();
    assert_eq!(ds.len(), 4);

    let sample = ds.get(0).unwrap();
    assert_eq!(sample.id, "1aaa.A");
    assert_eq!(sample.label, 3);
    // Water and the unknown ligand are not nodes
    assert_eq!(sample.graph.num_nodes(), 5);
    assert_eq!(sample.graph.node_feature.shape(), &[5, 20, 1]);
    assert_eq!(sample.graph.num_edges(), 8);
    assert_eq!(sample.graph.edge_feature.shape(), &[8, 3]);

    // Rotation preserves the 4 A backbone spacing
    for e in 0..sample.graph.num_edges() {
        let d = sample.graph.edge_displacement.row(e);
        let len = (d[0] * d[0] + d[1] * d[1] + d[2] * d[2]).sqrt();
        assert!((len - 4.0).abs() < 1e-3, "edge {} has length {}", e, len);
    }

    let missing = ds.get(3).unwrap_err();
    assert!(matches!(missing, SampleError::Fetch { .. }));
    assert_eq!(missing.id(), Some("1zzz.A"));
}

#[test]
fn test_use_classes_and_split() {
    let mut fx = fixture();
    fx.config.use_classes = Some(vec![3]);
    let ds = MulticlassDataset::new(&fx.config, local(&fx.config)).unwrap();
    assert_eq!(ds.index().ids(), &["1aaa.A", "1ccc.A"]);

    fx.config.use_classes = None;
    fx.config.split = Split::Valid;
    let ds = MulticlassDataset::new(&fx.config, local(&fx.config)).unwrap();
    assert_eq!(ds.len(), 1);

    fx.config.split = Split::Test;
    assert!(MulticlassDataset::new(&fx.config, local(&fx.config)).is_err());
}

#[test]
fn test_multiclass_collation_drops_failures() {
    let fx = fixture();
    let mut ds = MulticlassDataset::new(&fx.config, local(&fx.config)).unwrap();
    let results: Vec<_> = (0..ds.len()).map(|i| ds.get(i)).collect();

    let batch = collate_results(results, fx.config.error_mode).unwrap();
    assert_eq!(batch.ids, vec!["1aaa.A", "1bbb.A", "1ccc.A"]);
    assert_eq!(batch.labels, vec![3, 1, 3]);
    assert_eq!(batch.graph.batch_num_nodes, vec![5, 3, 4]);
    assert_eq!(batch.graph.num_nodes(), 12);

    let results: Vec<_> = (0..ds.len()).map(|i| ds.get(i)).collect();
    assert!(matches!(
        collate_results(results, ErrorMode::Fail),
        Err(CollateError::Sample(SampleError::Fetch { .. }))
    ));
}

#[test]
fn test_binary_end_to_end() {
    let mut fx = fixture();
    // Keep the negative pool to structures that exist on disk
    fx.config.use_classes = None;
    let split_path = fx.config.split_file.clone();
    std::fs::write(
        &split_path,
        r#"{"train": {"input_list": ["1aaa.A", "1bbb.A", "1ccc.A"], "target_list": [3, 1, 3]}}"#,
    )
    .unwrap();

    let mut ds = BinaryDataset::new(&fx.config, 3, local(&fx.config)).unwrap();
    assert_eq!(ds.len(), 2);
    assert_eq!(ds.cursor().pool_size(), 1);

    let pairs: Vec<_> = (0..ds.len()).map(|i| ds.get(i)).collect();
    // One negative, drawn twice: the second draw refills the pool
    assert_eq!(ds.cursor().refills(), 1);

    let batch = collate_pair_results(pairs, ErrorMode::Fail).unwrap();
    assert_eq!(batch.labels, vec![1, 1, 0, 0]);
    assert_eq!(batch.ids, vec!["1aaa.A", "1ccc.A", "1bbb.A", "1bbb.A"]);
    assert_eq!(batch.graph.batch_num_nodes, vec![5, 4, 3, 3]);
}

#[test]
fn test_seeded_datasets_are_reproducible() {
    let fx = fixture();
    let mut a = MulticlassDataset::new(&fx.config, local(&fx.config)).unwrap();
    let mut b = MulticlassDataset::new(&fx.config, local(&fx.config)).unwrap();

    let ga = a.get(0).unwrap().graph;
    let gb = b.get(0).unwrap().graph;
    assert_eq!(ga, gb);

    let batch = collate(&[a.get(2).unwrap()]).unwrap();
    assert_eq!(batch.graph.batch_size(), 1);
}
