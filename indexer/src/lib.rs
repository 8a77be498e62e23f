use serde::Serialize;
use textcat_core::persist::{ClassCatalog, IndexMeta};
use textcat_core::{
    doc_id, open_store, tokenize, Dictionary, IndexConfig, IndexError, Normalizer, RecordKey, Store, StoreError,
    TrainingClass, WeightParams,
};

/// Counts of what a training run produced.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TrainReport {
    pub documents: usize,
    pub terms: usize,
    pub champions: usize,
    pub vectors: usize,
    pub centroids: usize,
    pub write_failures: usize,
}

/// Feeds documents into a [`Dictionary`] and derives the training artifacts.
pub struct Indexer<S> {
    dictionary: Dictionary<S>,
    normalizer: Normalizer,
}

impl<S: Store> Indexer<S> {
    /// Indexer with an empty vocabulary over `store`.
    pub fn new(store: S, params: WeightParams, normalizer: Normalizer) -> Self {
        Self { dictionary: Dictionary::fresh(store, params), normalizer }
    }

    /// Indexer over the result of a previous run.
    pub fn open(store: S, normalizer: Normalizer) -> Result<Self, IndexError> {
        Ok(Self { dictionary: Dictionary::open(store)?, normalizer })
    }

    pub fn dictionary(&self) -> &Dictionary<S> {
        &self.dictionary
    }

    /// Full rebuild: drop all persisted state, ingest `corpus` class by class,
    /// then derive champions, vectors and centroids.
    pub fn rebuild(&mut self, corpus: &[TrainingClass]) -> Result<TrainReport, IndexError> {
        self.dictionary.reset()?;
        tracing::info!(classes = corpus.len(), "rebuilding index");

        let mut catalog = Vec::with_capacity(corpus.len());
        for class in corpus {
            let mut documents = Vec::with_capacity(class.documents.len());
            for (idx, text) in class.documents.iter().enumerate() {
                let id = doc_id(&class.label, idx + 1);
                let terms = self.ingest_document(&id, text)?;
                tracing::debug!(doc_id = %id, terms, "ingested document");
                documents.push(id);
            }
            tracing::info!(label = %class.label, documents = documents.len(), vocabulary = self.dictionary.len(), "ingested class");
            catalog.push(ClassCatalog { label: class.label.clone(), documents });
        }
        self.save_meta(&catalog)?;
        self.derive(&catalog)
    }

    /// Tokenize, normalize and index one document. Returns the number of terms fed.
    pub fn ingest_document(&mut self, doc_id: &str, text: &str) -> Result<usize, StoreError> {
        let tokens = self.normalizer.normalize_tokens(tokenize(text));
        for token in &tokens {
            self.dictionary.add_token(&token.word, doc_id, token.position)?;
        }
        Ok(tokens.len())
    }

    /// Regenerate champions, vectors and centroids from the stored posting lists.
    pub fn refresh(&mut self) -> Result<TrainReport, IndexError> {
        let meta = self.dictionary.meta().cloned().ok_or_else(|| IndexError::NotBuilt(RecordKey::Meta.to_string()))?;
        if meta.normalizer != self.normalizer.settings() {
            tracing::warn!(
                trained = ?meta.normalizer.language,
                given = ?self.normalizer.language(),
                "normalizer differs from the trained one, keeping the trained one"
            );
            self.normalizer = Normalizer::from_settings(&meta.normalizer);
        }
        tracing::info!(documents = meta.num_docs(), terms = self.dictionary.len(), "refreshing derived records");
        self.dictionary.warm_cache()?;
        self.derive(&meta.classes)
    }

    fn derive(&mut self, catalog: &[ClassCatalog]) -> Result<TrainReport, IndexError> {
        let champions = self.dictionary.generate_champions()?;
        tracing::info!(champions, "generated champion lists");

        let mut vectors = 0;
        for class in catalog {
            for id in &class.documents {
                self.dictionary.persist_vector(id)?;
                vectors += 1;
            }
        }
        tracing::info!(vectors, "cached document vectors");

        for class in catalog {
            let centroid = self.dictionary.compute_centroid(&class.label, &class.documents)?;
            tracing::debug!(label = %class.label, terms = centroid.len(), "computed centroid");
        }

        self.save_meta(catalog)?;
        self.dictionary.store().flush()?;

        let report = TrainReport {
            documents: catalog.iter().map(|c| c.documents.len()).sum(),
            terms: self.dictionary.len(),
            champions,
            vectors,
            centroids: catalog.len(),
            write_failures: self.dictionary.write_failures().len(),
        };
        if report.write_failures > 0 {
            tracing::warn!(failures = report.write_failures, "some records could not be written");
        }
        Ok(report)
    }

    fn save_meta(&mut self, catalog: &[ClassCatalog]) -> Result<(), StoreError> {
        let params = self.dictionary.params();
        let meta = IndexMeta {
            version: IndexMeta::VERSION,
            created_at: time::OffsetDateTime::now_utc()
                .format(&time::format_description::well_known::Rfc3339)
                .unwrap_or_default(),
            train_size_per_class: params.train_size,
            champion_size: params.champion_size,
            normalizer: self.normalizer.settings(),
            classes: catalog.to_vec(),
            num_terms: self.dictionary.len(),
            write_failures: self.dictionary.write_failures().len(),
        };
        self.dictionary.save_meta(meta)
    }
}

/// Weighting parameters taken from a configuration.
pub fn weight_params(config: &IndexConfig) -> WeightParams {
    WeightParams { train_size: config.train_size_per_class, champion_size: config.champion_size }
}

/// Full rebuild from the dataset described by `config`.
pub fn train(config: &IndexConfig) -> anyhow::Result<TrainReport> {
    config.validate()?;
    let corpus = textcat_core::dataset::load_training_corpus(config)?;
    let store = open_store(config)?;
    let normalizer = Normalizer::from_config(config)?;
    let mut indexer = Indexer::new(store, weight_params(config), normalizer);
    Ok(indexer.rebuild(&corpus)?)
}

/// Re-derive the training artifacts of an existing index.
pub fn refresh(config: &IndexConfig) -> anyhow::Result<TrainReport> {
    let store = open_store(config)?;
    let normalizer = Normalizer::from_config(config)?;
    let mut indexer = Indexer::open(store, normalizer)?;
    Ok(indexer.refresh()?)
}

