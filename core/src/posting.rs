use crate::{DocId, PostingListId};
use serde::{Deserialize, Serialize};

/// Occurrences of one term inside one document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Posting {
    doc_id: DocId,
    /// Insertion order, no duplicates.
    positions: Vec<u32>,
}

impl Posting {
    pub fn new(doc_id: impl Into<DocId>, position: u32) -> Self {
        Self { doc_id: doc_id.into(), positions: vec![position] }
    }

    pub fn doc_id(&self) -> &str {
        &self.doc_id
    }

    pub fn positions(&self) -> &[u32] {
        &self.positions
    }

    pub fn term_frequency(&self) -> u32 {
        self.positions.len() as u32
    }

    /// Returns false when the position was already recorded.
    pub fn add_position(&mut self, position: u32) -> bool {
        if self.positions.contains(&position) {
            return false;
        }
        self.positions.push(position);
        true
    }
}

/// Which persisted view of a term's postings a record holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ListView {
    Full,
    Champion,
}

impl ListView {
    pub fn suffix(self) -> &'static str {
        match self {
            ListView::Full => "pl",
            ListView::Champion => "cl",
        }
    }
}

/// Read access shared by full and champion posting lists.
pub trait PostingSet {
    const VIEW: ListView;

    fn term(&self) -> &str;
    fn id(&self) -> PostingListId;
    fn postings(&self) -> &[Posting];

    /// Number of distinct documents in this view.
    fn frequency(&self) -> u32 {
        self.postings().len() as u32
    }

    fn posting(&self, doc_id: &str) -> Option<&Posting> {
        self.postings().iter().find(|p| p.doc_id() == doc_id)
    }

    fn term_frequency(&self, doc_id: &str) -> u32 {
        self.posting(doc_id).map(Posting::term_frequency).unwrap_or(0)
    }
}

/// Every document containing a term, in first-occurrence order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostingList {
    term: String,
    id: PostingListId,
    postings: Vec<Posting>,
}

impl PostingList {
    pub fn new(term: impl Into<String>, id: PostingListId) -> Self {
        Self { term: term.into(), id, postings: Vec::new() }
    }

    /// Record `position` of this term in `doc_id`. Returns whether anything changed.
    pub fn add_occurrence(&mut self, doc_id: &str, position: u32) -> bool {
        match self.postings.iter_mut().find(|p| p.doc_id() == doc_id) {
            Some(posting) => posting.add_position(position),
            None => {
                self.postings.push(Posting::new(doc_id, position));
                true
            }
        }
    }

    /// Up to `r` postings ordered by descending position count.
    ///
    /// Each round picks the not-yet-chosen posting with the strictly greatest
    /// count, so ties go to the posting that appears first in the list.
    pub fn best_postings(&self, r: usize) -> Vec<&Posting> {
        let rounds = r.min(self.postings.len());
        let mut chosen = vec![false; self.postings.len()];
        let mut result = Vec::with_capacity(rounds);
        for _ in 0..rounds {
            let mut best: Option<usize> = None;
            for (idx, posting) in self.postings.iter().enumerate() {
                if chosen[idx] {
                    continue;
                }
                let better = match best {
                    Some(b) => posting.term_frequency() > self.postings[b].term_frequency(),
                    None => true,
                };
                if better {
                    best = Some(idx);
                }
            }
            if let Some(idx) = best {
                chosen[idx] = true;
                result.push(&self.postings[idx]);
            }
        }
        result
    }
}

impl PostingSet for PostingList {
    const VIEW: ListView = ListView::Full;

    fn term(&self) -> &str {
        &self.term
    }

    fn id(&self) -> PostingListId {
        self.id
    }

    fn postings(&self) -> &[Posting] {
        &self.postings
    }
}

/// Top-R pruned snapshot of a [`PostingList`]. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChampionList {
    term: String,
    id: PostingListId,
    postings: Vec<Posting>,
}

impl ChampionList {
    pub const DEFAULT_SIZE: usize = 5;

    pub fn from_list(list: &PostingList, r: usize) -> Self {
        Self {
            term: list.term.clone(),
            id: list.id,
            postings: list.best_postings(r).into_iter().cloned().collect(),
        }
    }
}

impl PostingSet for ChampionList {
    const VIEW: ListView = ListView::Champion;

    fn term(&self) -> &str {
        &self.term
    }

    fn id(&self) -> PostingListId {
        self.id
    }

    fn postings(&self) -> &[Posting] {
        &self.postings
    }
}
