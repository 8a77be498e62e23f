use crate::error::{IndexError, StoreError};
use crate::persist::{self, IndexMeta};
use crate::posting::{ChampionList, ListView, PostingList, PostingSet};
use crate::store::{RecordKey, Store};
use crate::vector::{sum_vectors, DocumentVector};
use crate::{ClassLabel, DocId, PostingListId};
use std::borrow::Cow;
use std::collections::hash_map::Entry;
use std::collections::{BTreeMap, HashMap};

/// Term -> posting list id, ids dense from 0 in first-seen order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Vocabulary {
    terms: Vec<String>,
    ids: HashMap<String, PostingListId>,
}

impl Vocabulary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn get(&self, term: &str) -> Option<PostingListId> {
        self.ids.get(term).copied()
    }

    /// Terms in id order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, PostingListId)> + '_ {
        self.terms.iter().enumerate().map(|(id, term)| (term.as_str(), id as PostingListId))
    }

    /// Id of `term`, assigning the next one if it is new. The flag tells which.
    pub fn insert(&mut self, term: &str) -> (PostingListId, bool) {
        if let Some(id) = self.get(term) {
            return (id, false);
        }
        let id = self.terms.len() as PostingListId;
        self.terms.push(term.to_string());
        self.ids.insert(term.to_string(), id);
        (id, true)
    }

    pub(crate) fn to_map(&self) -> BTreeMap<&str, PostingListId> {
        self.iter().collect()
    }

    pub(crate) fn from_map(map: HashMap<String, PostingListId>) -> Result<Self, String> {
        let mut slots: Vec<Option<String>> = vec![None; map.len()];
        for (term, id) in &map {
            let Some(slot) = slots.get_mut(*id as usize) else {
                return Err(format!("id {id} of {term:?} is outside 0..{}", map.len()));
            };
            if let Some(other) = slot {
                return Err(format!("id {id} assigned to both {other:?} and {term:?}"));
            }
            *slot = Some(term.clone());
        }
        let terms = slots.into_iter().flatten().collect();
        Ok(Self { terms, ids: map })
    }
}

/// Corpus constants the weighting depends on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeightParams {
    /// Documents per class in the training set.
    pub train_size: usize,
    /// Postings kept per champion list.
    pub champion_size: usize,
}

impl From<&IndexMeta> for WeightParams {
    fn from(meta: &IndexMeta) -> Self {
        Self { train_size: meta.train_size_per_class, champion_size: meta.champion_size }
    }
}

/// Log-tf weight, scaled by `ln(train_size * idf)` when an idf is given.
///
/// `idf` here is `1 / df`, so the factor is `ln(train_size / df)`.
pub fn weight(tf: u32, idf: Option<f64>, train_size: usize) -> f64 {
    if tf == 0 {
        return 0.0;
    }
    let log_tf = 1.0 + f64::from(tf).ln();
    match idf {
        None => log_tf,
        Some(idf) if idf == 0.0 => 0.0,
        Some(idf) => log_tf * (train_size as f64 * idf).ln(),
    }
}

/// A record that could not be written. The in-memory state is unaffected.
#[derive(Debug, Clone, PartialEq)]
pub struct WriteFailure {
    pub key: String,
    pub error: String,
}

/// Vocabulary plus every statistic derived from the stored posting lists.
///
/// The dictionary is the only writer of posting lists, champion lists, vectors
/// and centroids. Each posting list mutation is written through to the store
/// before `add_token` returns.
pub struct Dictionary<S> {
    store: S,
    vocabulary: Vocabulary,
    /// Lists touched in this process; the store is authoritative for the rest.
    lists: HashMap<PostingListId, PostingList>,
    params: WeightParams,
    /// Manifest of the last finished run, if any.
    meta: Option<IndexMeta>,
    failures: Vec<WriteFailure>,
}

impl<S: Store> Dictionary<S> {
    /// Empty vocabulary. Existing records in `store` are not touched.
    pub fn fresh(store: S, params: WeightParams) -> Self {
        Self { store, vocabulary: Vocabulary::new(), lists: HashMap::new(), params, meta: None, failures: Vec::new() }
    }

    /// Load the vocabulary and weighting parameters of a finished training run.
    pub fn open(store: S) -> Result<Self, IndexError> {
        let meta = persist::load_meta(&store)?.ok_or_else(|| IndexError::NotBuilt(RecordKey::Meta.to_string()))?;
        let vocabulary = persist::load_vocabulary(&store)?
            .ok_or_else(|| IndexError::NotBuilt(RecordKey::Vocabulary.to_string()))?;
        tracing::debug!(terms = vocabulary.len(), "opened dictionary");
        Ok(Self {
            store,
            vocabulary,
            lists: HashMap::new(),
            params: WeightParams::from(&meta),
            meta: Some(meta),
            failures: Vec::new(),
        })
    }

    /// Discard every persisted record and all in-memory state.
    pub fn reset(&mut self) -> Result<(), StoreError> {
        self.store.clear()?;
        self.vocabulary = Vocabulary::new();
        self.lists.clear();
        self.meta = None;
        self.failures.clear();
        Ok(())
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn params(&self) -> WeightParams {
        self.params
    }

    pub fn meta(&self) -> Option<&IndexMeta> {
        self.meta.as_ref()
    }

    /// Persist `meta` and keep it as the current manifest.
    pub fn save_meta(&mut self, meta: IndexMeta) -> Result<(), StoreError> {
        persist::save_meta(&self.store, &meta)?;
        self.meta = Some(meta);
        Ok(())
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    pub fn len(&self) -> usize {
        self.vocabulary.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vocabulary.is_empty()
    }

    pub fn write_failures(&self) -> &[WriteFailure] {
        &self.failures
    }

    /// Record that `term` occurs at `position` in `doc_id`.
    ///
    /// Write failures are logged and recorded, never returned; only a stored
    /// posting list that cannot be read back is an error.
    pub fn add_token(&mut self, term: &str, doc_id: &str, position: u32) -> Result<(), StoreError> {
        let (id, is_new) = self.vocabulary.insert(term);
        if is_new {
            let result = persist::save_vocabulary(&self.store, &self.vocabulary);
            self.record_write(RecordKey::Vocabulary, result);
            self.lists.insert(id, PostingList::new(term, id));
        }
        if !self.list_mut(term, id)?.add_occurrence(doc_id, position) {
            return Ok(());
        }
        let result = match self.lists.get(&id) {
            Some(list) => persist::save_posting_list(&self.store, list),
            None => Ok(()),
        };
        self.record_write(RecordKey::PostingList(id, ListView::Full), result);
        Ok(())
    }

    fn list_mut(&mut self, term: &str, id: PostingListId) -> Result<&mut PostingList, StoreError> {
        match self.lists.entry(id) {
            Entry::Occupied(e) => Ok(e.into_mut()),
            Entry::Vacant(e) => {
                let list = match persist::load_posting_list(&self.store, id)? {
                    Some(list) => list,
                    None => {
                        tracing::warn!(term, id, "posting list record missing, starting it over");
                        PostingList::new(term, id)
                    }
                };
                Ok(e.insert(list))
            }
        }
    }

    /// Pull every stored posting list into memory.
    pub fn warm_cache(&mut self) -> Result<(), StoreError> {
        for (term, id) in self.vocabulary.iter() {
            if let Entry::Vacant(e) = self.lists.entry(id) {
                match persist::load_posting_list(&self.store, id)? {
                    Some(list) => {
                        e.insert(list);
                    }
                    None => tracing::warn!(term, id, "posting list record missing"),
                }
            }
        }
        Ok(())
    }

    fn record_write(&mut self, key: RecordKey, result: Result<(), StoreError>) {
        if let Err(err) = result {
            tracing::warn!(record = %key, error = %err, "write failed, continuing without it");
            self.failures.push(WriteFailure { key: key.to_string(), error: err.to_string() });
        }
    }

    pub fn posting_list_id(&self, term: &str) -> Option<PostingListId> {
        self.vocabulary.get(term)
    }

    /// Full posting list of `term`, `None` when the term or its record is absent.
    pub fn posting_list(&self, term: &str) -> Result<Option<Cow<'_, PostingList>>, StoreError> {
        let Some(id) = self.vocabulary.get(term) else {
            return Ok(None);
        };
        if let Some(list) = self.lists.get(&id) {
            return Ok(Some(Cow::Borrowed(list)));
        }
        Ok(persist::load_posting_list(&self.store, id)?.map(Cow::Owned))
    }

    pub fn champion_list(&self, term: &str) -> Result<Option<ChampionList>, StoreError> {
        match self.vocabulary.get(term) {
            Some(id) => persist::load_champion_list(&self.store, id),
            None => Ok(None),
        }
    }

    /// Number of documents containing `term`; 0 when unseen.
    pub fn document_frequency(&self, term: &str) -> Result<u32, StoreError> {
        Ok(self.posting_list(term)?.map(|list| list.frequency()).unwrap_or(0))
    }

    /// `1 / df`, or 0 for an unseen term.
    pub fn inverse_document_frequency(&self, term: &str) -> Result<f64, StoreError> {
        let df = self.document_frequency(term)?;
        if df == 0 {
            return Ok(0.0);
        }
        Ok(1.0 / f64::from(df))
    }

    pub fn term_frequency(&self, term: &str, doc_id: &str) -> Result<u32, StoreError> {
        Ok(self.posting_list(term)?.map(|list| list.term_frequency(doc_id)).unwrap_or(0))
    }

    pub fn weight(&self, tf: u32, idf: Option<f64>) -> f64 {
        weight(tf, idf, self.params.train_size)
    }

    /// Weighted vector of `doc_id` over the whole vocabulary, positive weights only.
    pub fn build_vector(&self, doc_id: &str) -> Result<DocumentVector, StoreError> {
        let mut vector = DocumentVector::new();
        for (term, _) in self.vocabulary.iter() {
            let Some(list) = self.posting_list(term)? else {
                continue;
            };
            let tf = list.term_frequency(doc_id);
            if tf == 0 {
                continue;
            }
            let idf = 1.0 / f64::from(list.frequency());
            let w = self.weight(tf, Some(idf));
            if w > 0.0 {
                vector.insert(term.to_string(), w);
            }
        }
        Ok(vector)
    }

    /// Build and cache the vector of `doc_id`.
    pub fn persist_vector(&mut self, doc_id: &str) -> Result<DocumentVector, StoreError> {
        let vector = self.build_vector(doc_id)?;
        let result = persist::save_vector(&self.store, doc_id, &vector);
        self.record_write(RecordKey::Vector(doc_id.to_string()), result);
        Ok(vector)
    }

    /// Cached vector of `doc_id`. Never recomputes.
    pub fn load_vector(&self, doc_id: &str) -> Result<Option<DocumentVector>, StoreError> {
        persist::load_vector(&self.store, doc_id)
    }

    /// Persist the champion list of every term. Returns how many were built.
    pub fn generate_champions(&mut self) -> Result<usize, StoreError> {
        let r = self.params.champion_size;
        let terms: Vec<(String, PostingListId)> =
            self.vocabulary.iter().map(|(term, id)| (term.to_string(), id)).collect();
        let mut built = 0;
        for (term, id) in terms {
            let champions = match self.posting_list(&term)? {
                Some(list) => ChampionList::from_list(&list, r),
                None => {
                    tracing::warn!(term = %term, id, "no posting list to prune");
                    continue;
                }
            };
            let result = persist::save_champion_list(&self.store, &champions);
            self.record_write(RecordKey::PostingList(id, ListView::Champion), result);
            built += 1;
        }
        Ok(built)
    }

    /// Mean of the cached vectors of `doc_ids`, divided by the configured
    /// training-set size, persisted under `label`.
    pub fn compute_centroid(&mut self, label: &str, doc_ids: &[DocId]) -> Result<DocumentVector, StoreError> {
        let mut sum = DocumentVector::new();
        for doc_id in doc_ids {
            match self.load_vector(doc_id)? {
                Some(vector) => sum = sum_vectors(&sum, &vector),
                None => tracing::warn!(label, doc_id = %doc_id, "no cached vector, document left out of centroid"),
            }
        }
        let n = self.params.train_size as f64;
        let centroid: DocumentVector = sum.into_iter().map(|(term, w)| (term, w / n)).collect();
        let result = persist::save_centroid(&self.store, label, &centroid);
        self.record_write(RecordKey::Centroid(label.to_string()), result);
        Ok(centroid)
    }

    /// Stored centroids in the order of `labels`. Every one of them must exist.
    pub fn load_centroids(&self, labels: &[ClassLabel]) -> Result<Vec<(ClassLabel, DocumentVector)>, IndexError> {
        let mut centroids = Vec::with_capacity(labels.len());
        for label in labels {
            let centroid = persist::load_centroid(&self.store, label)?
                .ok_or_else(|| IndexError::NotBuilt(RecordKey::Centroid(label.clone()).to_string()))?;
            centroids.push((label.clone(), centroid));
        }
        Ok(centroids)
    }
}
