//! Typed records on top of a [`Store`]: posting lists are bincode, everything
//! else is JSON.

use crate::dictionary::Vocabulary;
use crate::error::StoreError;
use crate::normalizer::NormalizerSettings;
use crate::posting::{ChampionList, PostingList, PostingSet};
use crate::store::{RecordKey, Store};
use crate::vector::DocumentVector;
use crate::{ClassLabel, DocId, PostingListId};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Manifest of a training run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexMeta {
    pub version: u32,
    pub created_at: String,
    pub train_size_per_class: usize,
    pub champion_size: usize,
    /// How training text was normalized; queries must match it.
    pub normalizer: NormalizerSettings,
    pub classes: Vec<ClassCatalog>,
    pub num_terms: usize,
    pub write_failures: usize,
}

impl IndexMeta {
    pub const VERSION: u32 = 1;

    pub fn labels(&self) -> Vec<ClassLabel> {
        self.classes.iter().map(|c| c.label.clone()).collect()
    }

    pub fn num_docs(&self) -> usize {
        self.classes.iter().map(|c| c.documents.len()).sum()
    }
}

/// Training documents of one class, in ingestion order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassCatalog {
    pub label: ClassLabel,
    pub documents: Vec<DocId>,
}

fn put_json<S, T>(store: &S, key: &RecordKey, value: &T) -> Result<(), StoreError>
where
    S: Store + ?Sized,
    T: Serialize + ?Sized,
{
    let bytes = serde_json::to_vec(value).map_err(|e| StoreError::encode(key, e))?;
    store.put(key, &bytes)
}

fn get_json<S, T>(store: &S, key: &RecordKey) -> Result<Option<T>, StoreError>
where
    S: Store + ?Sized,
    T: DeserializeOwned,
{
    match store.get(key)? {
        Some(bytes) => serde_json::from_slice(&bytes).map(Some).map_err(|e| StoreError::decode(key, e)),
        None => Ok(None),
    }
}

fn put_list<S, L>(store: &S, list: &L) -> Result<(), StoreError>
where
    S: Store + ?Sized,
    L: PostingSet + Serialize,
{
    let key = RecordKey::PostingList(list.id(), L::VIEW);
    let bytes = bincode::serialize(list).map_err(|e| StoreError::encode(&key, e))?;
    store.put(&key, &bytes)
}

fn get_list<S, L>(store: &S, id: PostingListId) -> Result<Option<L>, StoreError>
where
    S: Store + ?Sized,
    L: PostingSet + DeserializeOwned,
{
    let key = RecordKey::PostingList(id, L::VIEW);
    let Some(bytes) = store.get(&key)? else {
        return Ok(None);
    };
    let list: L = bincode::deserialize(&bytes).map_err(|e| StoreError::decode(&key, e))?;
    if list.id() != id {
        return Err(StoreError::decode(&key, format!("record holds list {}", list.id())));
    }
    Ok(Some(list))
}

pub fn save_vocabulary<S: Store + ?Sized>(store: &S, vocabulary: &Vocabulary) -> Result<(), StoreError> {
    put_json(store, &RecordKey::Vocabulary, &vocabulary.to_map())
}

pub fn load_vocabulary<S: Store + ?Sized>(store: &S) -> Result<Option<Vocabulary>, StoreError> {
    let key = RecordKey::Vocabulary;
    match get_json::<S, HashMap<String, PostingListId>>(store, &key)? {
        Some(map) => Vocabulary::from_map(map).map(Some).map_err(|reason| StoreError::decode(&key, reason)),
        None => Ok(None),
    }
}

pub fn save_posting_list<S: Store + ?Sized>(store: &S, list: &PostingList) -> Result<(), StoreError> {
    put_list(store, list)
}

pub fn load_posting_list<S: Store + ?Sized>(store: &S, id: PostingListId) -> Result<Option<PostingList>, StoreError> {
    get_list(store, id)
}

pub fn save_champion_list<S: Store + ?Sized>(store: &S, list: &ChampionList) -> Result<(), StoreError> {
    put_list(store, list)
}

pub fn load_champion_list<S: Store + ?Sized>(store: &S, id: PostingListId) -> Result<Option<ChampionList>, StoreError> {
    get_list(store, id)
}

pub fn save_vector<S: Store + ?Sized>(store: &S, doc_id: &str, vector: &DocumentVector) -> Result<(), StoreError> {
    put_json(store, &RecordKey::Vector(doc_id.to_string()), vector)
}

pub fn load_vector<S: Store + ?Sized>(store: &S, doc_id: &str) -> Result<Option<DocumentVector>, StoreError> {
    get_json(store, &RecordKey::Vector(doc_id.to_string()))
}

pub fn save_centroid<S: Store + ?Sized>(store: &S, label: &str, centroid: &DocumentVector) -> Result<(), StoreError> {
    put_json(store, &RecordKey::Centroid(label.to_string()), centroid)
}

pub fn load_centroid<S: Store + ?Sized>(store: &S, label: &str) -> Result<Option<DocumentVector>, StoreError> {
    get_json(store, &RecordKey::Centroid(label.to_string()))
}

pub fn save_meta<S: Store + ?Sized>(store: &S, meta: &IndexMeta) -> Result<(), StoreError> {
    let key = RecordKey::Meta;
    let json = serde_json::to_string_pretty(meta).map_err(|e| StoreError::encode(&key, e))?;
    store.put(&key, json.as_bytes())
}

pub fn load_meta<S: Store + ?Sized>(store: &S) -> Result<Option<IndexMeta>, StoreError> {
    get_json(store, &RecordKey::Meta)
}
