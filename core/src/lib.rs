//! Inverted index with champion lists and a nearest-centroid text classifier.
//!
//! Documents are fed term by term into a [`Dictionary`], which owns the
//! vocabulary and writes every posting list through to a [`Store`]. Once a
//! corpus is ingested the dictionary derives champion lists, per-document
//! weight vectors and per-class centroids from the stored postings.

pub mod config;
pub mod dataset;
pub mod dictionary;
pub mod error;
pub mod normalizer;
pub mod persist;
pub mod posting;
pub mod store;
pub mod tokenizer;
pub mod vector;

pub use config::{ClassDir, IndexConfig, StorageBackend};
pub use dataset::{TestDocument, TrainingClass};
pub use dictionary::{weight, Dictionary, WeightParams, WriteFailure};
pub use error::{IndexError, StoreError};
pub use normalizer::{Language, Normalizer, NormalizerSettings};
pub use persist::{ClassCatalog, IndexMeta};
pub use posting::{ChampionList, ListView, Posting, PostingList, PostingSet};
pub use store::{open_store, FileStore, MemoryStore, RecordKey, SledStore, Store};
pub use tokenizer::{tokenize, Token};
pub use vector::{cosine_similarity, sum_vectors, DocumentVector};

pub type PostingListId = u32;
pub type DocId = String;
pub type ClassLabel = String;

/// Document id for the `seq`-th (1-based) training document of a class.
pub fn doc_id(label: &str, seq: usize) -> DocId {
    format!("{label}-{seq}")
}
