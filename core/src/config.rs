use crate::normalizer::Language;
use crate::ClassLabel;
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// One file per record.
    #[default]
    Files,
    Sled,
}

/// A class label and the dataset sub-directory holding its documents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassDir {
    pub label: ClassLabel,
    pub dir: String,
}

impl ClassDir {
    pub fn new(label: impl Into<ClassLabel>, dir: impl Into<String>) -> Self {
        Self { label: label.into(), dir: dir.into() }
    }
}

/// Everything the indexer and classifier need to locate data and weight terms.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    pub storage_root: PathBuf,
    pub storage_backend: StorageBackend,
    /// Holds `train/<dir>` and `test/<dir>` per class.
    pub dataset_root: PathBuf,
    pub classes: Vec<ClassDir>,
    pub train_size_per_class: usize,
    pub champion_size: usize,
    pub language: Language,
    pub stopwords_path: Option<PathBuf>,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            storage_root: PathBuf::from("./dist"),
            storage_backend: StorageBackend::Files,
            dataset_root: PathBuf::from("./dataset"),
            classes: vec![
                ClassDir::new("1", "history"),
                ClassDir::new("2", "hygin"),
                ClassDir::new("3", "math"),
                ClassDir::new("4", "physics"),
                ClassDir::new("5", "technology"),
            ],
            train_size_per_class: 5,
            champion_size: 5,
            language: Language::Persian,
            stopwords_path: None,
        }
    }
}

impl IndexConfig {
    /// Read a JSON config; missing fields take their defaults.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).with_context(|| format!("reading config {}", path.display()))?;
        let config: IndexConfig =
            serde_json::from_str(&text).with_context(|| format!("parsing config {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn labels(&self) -> Vec<ClassLabel> {
        self.classes.iter().map(|c| c.label.clone()).collect()
    }

    pub fn train_dir(&self, class: &ClassDir) -> PathBuf {
        self.dataset_root.join("train").join(&class.dir)
    }

    pub fn test_dir(&self, class: &ClassDir) -> PathBuf {
        self.dataset_root.join("test").join(&class.dir)
    }

    pub fn validate(&self) -> Result<()> {
        if self.classes.is_empty() {
            bail!("at least one class must be configured");
        }
        if self.train_size_per_class == 0 {
            bail!("train_size_per_class must be positive");
        }
        if self.champion_size == 0 {
            bail!("champion_size must be positive");
        }
        let mut seen = HashSet::new();
        for class in &self.classes {
            let valid = !class.label.is_empty()
                && class.label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
            if !valid {
                bail!("class label {:?} may only use ASCII letters, digits, '-' and '_'", class.label);
            }
            if !seen.insert(class.label.as_str()) {
                bail!("class label {:?} is configured twice", class.label);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn defaults_are_valid() {
        let config = IndexConfig::default();
        config.validate().unwrap();
        assert_eq!(config.labels(), vec!["1", "2", "3", "4", "5"]);
        assert_eq!(config.train_dir(&config.classes[2]), PathBuf::from("./dataset/train/math"));
    }

    #[test]
    fn partial_file_fills_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("textcat.json");
        fs::write(
            &path,
            r#"{"storage_backend": "sled", "language": "english",
                "classes": [{"label": "sport", "dir": "sport"}], "train_size_per_class": 40}"#,
        )
        .unwrap();

        let config = IndexConfig::from_file(&path).unwrap();
        assert_eq!(config.storage_backend, StorageBackend::Sled);
        assert_eq!(config.language, Language::English);
        assert_eq!(config.train_size_per_class, 40);
        assert_eq!(config.champion_size, 5);
        assert_eq!(config.storage_root, PathBuf::from("./dist"));
    }

    #[test]
    fn bad_labels_are_rejected() {
        let mut config = IndexConfig::default();
        config.classes.push(ClassDir::new("1", "again"));
        assert!(config.validate().is_err());

        config.classes = vec![ClassDir::new("../x", "x")];
        assert!(config.validate().is_err());

        config.classes = vec![ClassDir::new("ok", "x")];
        config.train_size_per_class = 0;
        assert!(config.validate().is_err());
    }
}
