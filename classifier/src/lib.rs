use anyhow::Result;
use serde::Serialize;
use std::collections::BTreeMap;
use textcat_core::dataset::load_test_set;
use textcat_core::{
    cosine_similarity, open_store, tokenize, ClassLabel, Dictionary, DocumentVector, IndexConfig, IndexError,
    Normalizer, RecordKey, Store, StoreError,
};

/// Scores of one document against every class centroid.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Classification {
    /// Every label that reached the top score.
    pub best: Vec<ClassLabel>,
    pub scores: Vec<(ClassLabel, f64)>,
}

impl Classification {
    pub fn contains(&self, label: &str) -> bool {
        self.best.iter().any(|l| l == label)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Evaluation {
    pub correct: usize,
    pub incorrect: usize,
    /// Documents that could not be classified; not part of the accuracy.
    pub failed: usize,
}

impl Evaluation {
    pub fn evaluated(&self) -> usize {
        self.correct + self.incorrect
    }

    pub fn accuracy(&self) -> f64 {
        match self.evaluated() {
            0 => 0.0,
            n => self.correct as f64 / n as f64,
        }
    }
}

/// Nearest-centroid classifier over a trained index. Never writes to the index.
pub struct Classifier<S> {
    dictionary: Dictionary<S>,
    normalizer: Normalizer,
    labels: Vec<ClassLabel>,
}

impl<S: Store> Classifier<S> {
    /// Classifier using the normalizer the index was trained with.
    pub fn open(store: S) -> Result<Self, IndexError> {
        let dictionary = Dictionary::open(store)?;
        let meta = dictionary.meta().ok_or_else(|| IndexError::NotBuilt(RecordKey::Meta.to_string()))?;
        let normalizer = Normalizer::from_settings(&meta.normalizer);
        let labels = meta.labels();
        Ok(Self { dictionary, normalizer, labels })
    }

    /// Like [`Classifier::open`], but insists on `normalizer` and fails if the
    /// index was trained with different settings.
    pub fn open_with(store: S, normalizer: Normalizer) -> Result<Self, IndexError> {
        let classifier = Self::open(store)?;
        if classifier.normalizer.settings() != normalizer.settings() {
            return Err(IndexError::NormalizerMismatch {
                trained: classifier.normalizer.language(),
                given: normalizer.language(),
            });
        }
        Ok(classifier)
    }

    pub fn labels(&self) -> &[ClassLabel] {
        &self.labels
    }

    pub fn dictionary(&self) -> &Dictionary<S> {
        &self.dictionary
    }

    pub fn normalizer(&self) -> &Normalizer {
        &self.normalizer
    }

    /// Weights from the document's own term counts and the trained idf table.
    ///
    /// Terms whose weight is zero or negative stay in the vector; they count
    /// toward its norm even though no centroid holds them.
    pub fn query_vector(&self, text: &str) -> Result<DocumentVector, StoreError> {
        let mut tfs: BTreeMap<String, u32> = BTreeMap::new();
        for token in self.normalizer.normalize_tokens(tokenize(text)) {
            *tfs.entry(token.word).or_insert(0) += 1;
        }
        let mut vector = DocumentVector::new();
        for (term, tf) in tfs {
            let idf = self.dictionary.inverse_document_frequency(&term)?;
            vector.insert(term, self.dictionary.weight(tf, Some(idf)));
        }
        Ok(vector)
    }

    pub fn classify(&self, text: &str) -> Result<Classification, IndexError> {
        let query = self.query_vector(text)?;
        let centroids = self.dictionary.load_centroids(&self.labels)?;
        let scores: Vec<(ClassLabel, f64)> = centroids
            .into_iter()
            .map(|(label, centroid)| {
                let score = cosine_similarity(&query, &centroid);
                (label, score)
            })
            .collect();
        let top = scores.iter().map(|(_, s)| *s).fold(f64::NEG_INFINITY, f64::max);
        let best = scores.iter().filter(|(_, s)| *s == top).map(|(l, _)| l.clone()).collect();
        Ok(Classification { best, scores })
    }

    /// Classify every `(true label, text)` pair. A document counts as correct
    /// when its label is among the best-scoring ones.
    pub fn evaluate<I>(&self, test_set: I) -> Evaluation
    where
        I: IntoIterator<Item = (ClassLabel, String)>,
    {
        let mut eval = Evaluation::default();
        for (label, text) in test_set {
            match self.classify(&text) {
                Ok(result) if result.contains(&label) => {
                    tracing::debug!(label = %label, "guessed right");
                    eval.correct += 1;
                }
                Ok(result) => {
                    tracing::debug!(label = %label, guessed = ?result.best, "guessed wrong");
                    eval.incorrect += 1;
                }
                Err(e) => {
                    tracing::warn!(label = %label, error = %e, "classification failed, skipping document");
                    eval.failed += 1;
                }
            }
        }
        eval
    }
}

/// Classifier over the index named by `config`. Text is normalized the way
/// the index was trained, whatever `config.language` says.
pub fn open_from_config(config: &IndexConfig) -> Result<Classifier<Box<dyn Store>>> {
    let store = open_store(config)?;
    let classifier = Classifier::open(store)?;
    let trained = classifier.normalizer().language();
    if trained != config.language {
        tracing::warn!(trained = ?trained, configured = ?config.language, "using the language the index was trained with");
    }
    Ok(classifier)
}

/// Evaluate the test split of the configured dataset. Unreadable files count as failed.
pub fn evaluate_dataset<S: Store>(classifier: &Classifier<S>, config: &IndexConfig) -> Result<Evaluation> {
    let mut unreadable = 0;
    let mut test_set = Vec::new();
    for doc in load_test_set(config)? {
        match doc.text {
            Ok(text) => test_set.push((doc.label, text)),
            Err(e) => {
                tracing::warn!(path = %doc.path.display(), error = %e, "skipping unreadable test document");
                unreadable += 1;
            }
        }
    }
    let mut eval = classifier.evaluate(test_set);
    eval.failed += unreadable;
    tracing::info!(correct = eval.correct, incorrect = eval.incorrect, failed = eval.failed, "evaluation finished");
    Ok(eval)
}
