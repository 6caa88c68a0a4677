//! Split index: `(identifier, label)` records for one dataset split

use crate::spec::{ConfigError, Split};
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::path::Path;

#[derive(Debug, Deserialize)]
struct SplitRecords {
    input_list: Vec<String>,
    target_list: Vec<i64>,
}

/// Identifiers and labels of one split, in file order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SplitIndex {
    ids: Vec<String>,
    labels: Vec<i64>,
}

impl SplitIndex {
    pub fn new(ids: Vec<String>, labels: Vec<i64>) -> Result<Self, ConfigError> {
        if ids.len() != labels.len() {
            return Err(ConfigError::SplitFile {
                path: Default::default(),
                reason: format!("{} identifiers but {} labels", ids.len(), labels.len()),
            });
        }
        Ok(Self { ids, labels })
    }

    /// Load one split from a JSON file shaped
    /// `{"train": {"input_list": [...], "target_list": [...]}, ...}`
    pub fn load<P: AsRef<Path>>(path: P, split: Split) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let fail = |reason: String| ConfigError::SplitFile {
            path: path.to_path_buf(),
            reason,
        };

        let text = std::fs::read_to_string(path)?;
        let mut splits: HashMap<String, SplitRecords> =
            serde_json::from_str(&text).map_err(|e| fail(e.to_string()))?;
        let records = splits
            .remove(split.as_str())
            .ok_or_else(|| fail(format!("missing split '{}'", split)))?;

        if records.input_list.len() != records.target_list.len() {
            return Err(fail(format!(
                "{} identifiers but {} labels",
                records.input_list.len(),
                records.target_list.len()
            )));
        }

        log::debug!(
            "Loaded {} records for split '{}' from {}",
            records.input_list.len(),
            split,
            path.display()
        );

        Ok(Self {
            ids: records.input_list,
            labels: records.target_list,
        })
    }

    /// Keep records whose label is in `classes`, preserving order
    pub fn filter_classes(self, classes: &[i64]) -> Self {
        let keep: HashSet<i64> = classes.iter().copied().collect();
        let (ids, labels): (Vec<String>, Vec<i64>) = self
            .ids
            .into_iter()
            .zip(self.labels)
            .filter(|(_, label)| keep.contains(label))
            .unzip();
        Self { ids, labels }
    }

    /// Split identifiers into those labelled `class_idx` and all others
    pub fn partition(&self, class_idx: i64) -> (Vec<String>, Vec<String>) {
        let mut positives = Vec::new();
        let mut negatives = Vec::new();
        for (id, &label) in self.ids.iter().zip(&self.labels) {
            if label == class_idx {
                positives.push(id.clone());
            } else {
                negatives.push(id.clone());
            }
        }
        (positives, negatives)
    }

    /// Number of distinct labels
    pub fn num_classes(&self) -> usize {
        self.labels.iter().collect::<HashSet<_>>().len()
    }

    pub fn get(&self, index: usize) -> Option<(&str, i64)> {
        Some((self.ids.get(index)?.as_str(), *self.labels.get(index)?))
    }

    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    pub fn labels(&self) -> &[i64] {
        &self.labels
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn index() -> SplitIndex {
        SplitIndex::new(
            vec!["a.A".into(), "b.A".into(), "c.A".into(), "d.A".into()],
            vec![2, 0, 2, 1],
        )
        .unwrap()
    }

    #[test]
    fn test_filter_classes_keeps_order() {
        let filtered = index().filter_classes(&[1, 2]);
        assert_eq!(filtered.ids(), &["a.A", "c.A", "d.A"]);
        assert_eq!(filtered.labels(), &[2, 2, 1]);
    }

    #[test]
    fn test_partition() {
        let (pos, neg) = index().partition(2);
        assert_eq!(pos, vec!["a.A", "c.A"]);
        assert_eq!(neg, vec!["b.A", "d.A"]);
    }

    #[test]
    fn test_load_split() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"train": {{"input_list": ["1abc.A", "2xyz.B"], "target_list": [3, 7]}},
                "test": {{"input_list": [], "target_list": []}}}}"#
        )
        .unwrap();

        let train = SplitIndex::load(file.path(), Split::Train).unwrap();
        assert_eq!(train.len(), 2);
        assert_eq!(train.get(1), Some(("2xyz.B", 7)));
        assert_eq!(train.num_classes(), 2);

        assert!(SplitIndex::load(file.path(), Split::Test).unwrap().is_empty());
        assert!(matches!(
            SplitIndex::load(file.path(), Split::Valid),
            Err(ConfigError::SplitFile { .. })
        ));
    }

    #[test]
    fn test_load_rejects_length_mismatch() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"train": {{"input_list": ["1abc.A"], "target_list": [3, 7]}}}}"#
        )
        .unwrap();
        assert!(matches!(
            SplitIndex::load(file.path(), Split::Train),
            Err(ConfigError::SplitFile { .. })
        ));
    }
}
