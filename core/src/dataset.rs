//! Reading labeled documents from `dataset_root/{train,test}/<class dir>`.

use crate::config::{ClassDir, IndexConfig};
use crate::ClassLabel;
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// The training documents of one class, in ingestion order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrainingClass {
    pub label: ClassLabel,
    pub documents: Vec<String>,
}

/// A labeled test document whose text may have failed to load.
#[derive(Debug)]
pub struct TestDocument {
    pub label: ClassLabel,
    pub path: PathBuf,
    pub text: Result<String>,
}

/// Regular files directly inside `dir`, sorted by file name.
pub fn list_documents(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1).sort_by_file_name() {
        let entry = entry.with_context(|| format!("listing {}", dir.display()))?;
        if entry.file_type().is_file() {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

fn read_document(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))
}

/// At most `train_size_per_class` documents from each class's train directory.
pub fn load_training_corpus(config: &IndexConfig) -> Result<Vec<TrainingClass>> {
    config
        .classes
        .iter()
        .map(|class| load_training_class(config, class))
        .collect()
}

fn load_training_class(config: &IndexConfig, class: &ClassDir) -> Result<TrainingClass> {
    let dir = config.train_dir(class);
    let files = list_documents(&dir)?;
    if files.len() < config.train_size_per_class {
        tracing::warn!(
            label = %class.label,
            found = files.len(),
            expected = config.train_size_per_class,
            "fewer training documents than the configured class size"
        );
    } else if files.len() > config.train_size_per_class {
        tracing::info!(label = %class.label, found = files.len(), "using the first {} documents", config.train_size_per_class);
    }
    let documents = files
        .iter()
        .take(config.train_size_per_class)
        .map(|path| read_document(path))
        .collect::<Result<Vec<_>>>()?;
    Ok(TrainingClass { label: class.label.clone(), documents })
}

/// Every document of each class's test directory. Unreadable files are kept
/// with their error so the evaluator can count them.
pub fn load_test_set(config: &IndexConfig) -> Result<Vec<TestDocument>> {
    let mut out = Vec::new();
    for class in &config.classes {
        for path in list_documents(&config.test_dir(class))? {
            let text = read_document(&path);
            out.push(TestDocument { label: class.label.clone(), path, text });
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn training_corpus_is_sorted_and_capped() {
        let dir = tempdir().unwrap();
        let mut config = IndexConfig { dataset_root: dir.path().to_path_buf(), ..IndexConfig::default() };
        config.classes = vec![ClassDir::new("1", "math")];
        config.train_size_per_class = 2;

        let math = dir.path().join("train/math");
        fs::create_dir_all(math.join("nested")).unwrap();
        fs::write(math.join("b.txt"), "second").unwrap();
        fs::write(math.join("a.txt"), "first").unwrap();
        fs::write(math.join("c.txt"), "third").unwrap();
        fs::write(math.join("nested/z.txt"), "ignored").unwrap();

        let corpus = load_training_corpus(&config).unwrap();
        assert_eq!(corpus, vec![TrainingClass { label: "1".into(), documents: vec!["first".into(), "second".into()] }]);
    }

    #[test]
    fn missing_class_directory_is_an_error() {
        let dir = tempdir().unwrap();
        let config = IndexConfig { dataset_root: dir.path().to_path_buf(), ..IndexConfig::default() };
        assert!(load_training_corpus(&config).is_err());
    }
}
