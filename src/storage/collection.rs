use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::core::{Document, ID_FIELD, RecordId, Result, StoreError, Value};

use super::filter::Filter;
use super::pipeline::{SortOrder, sort_documents};

/// Options for [`Collection::find`], mirroring the usual limit/skip/sort trio.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FindOptions {
    pub sort: Vec<(String, SortOrder)>,
    pub skip: usize,
    pub limit: Option<usize>,
}

impl FindOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Page `page` (zero-based) of `limit` documents; `limit == 0` disables paging.
    pub fn page(limit: usize, page: usize) -> Self {
        if limit == 0 {
            return Self::default();
        }
        Self {
            sort: Vec::new(),
            skip: limit.saturating_mul(page),
            limit: Some(limit),
        }
    }

    pub fn sort_by(mut self, field: impl Into<String>, order: SortOrder) -> Self {
        self.sort.push((field.into(), order));
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Collection {
    name: String,
    /// Documents keyed by insertion sequence, so unsorted scans return
    /// documents in insertion order.
    documents: BTreeMap<u64, Document>,
    next_seq: u64,
    #[serde(skip)]
    ids: HashMap<RecordId, u64>,
    indexed_fields: Vec<String>,
    #[serde(skip)]
    indexes: HashMap<String, BTreeMap<Value, Vec<u64>>>,
}

impl Collection {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            documents: BTreeMap::new(),
            next_seq: 0,
            ids: HashMap::new(),
            indexed_fields: Vec::new(),
            indexes: HashMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn indexed_fields(&self) -> &[String] {
        &self.indexed_fields
    }

    /// Inserts `doc`, assigning an `_id` if it carries none.
    pub fn insert(&mut self, mut doc: Document) -> Result<RecordId> {
        let id = match doc.get(ID_FIELD) {
            None | Some(Value::Null) => RecordId::new(),
            Some(Value::Id(id)) => *id,
            Some(other) => {
                return Err(StoreError::TypeMismatch(format!(
                    "'{}' must be an ID, got {}",
                    ID_FIELD,
                    other.type_name()
                )));
            }
        };
        if self.ids.contains_key(&id) {
            return Err(StoreError::DuplicateKey(format!("{}.{}", self.name, id)));
        }
        doc.set(ID_FIELD, id);

        let seq = self.next_seq;
        self.next_seq += 1;
        self.add_to_indexes(seq, &doc);
        self.ids.insert(id, seq);
        self.documents.insert(seq, doc);
        Ok(id)
    }

    /// All-or-nothing: the batch is checked for id clashes before any write.
    pub fn insert_many(&mut self, docs: Vec<Document>) -> Result<Vec<RecordId>> {
        let mut seen = std::collections::HashSet::new();
        for doc in &docs {
            if let Some(id) = doc.id()
                && (self.ids.contains_key(&id) || !seen.insert(id))
            {
                return Err(StoreError::DuplicateKey(format!("{}.{}", self.name, id)));
            }
        }
        docs.into_iter().map(|doc| self.insert(doc)).collect()
    }

    pub fn get(&self, id: &RecordId) -> Option<&Document> {
        self.ids.get(id).and_then(|seq| self.documents.get(seq))
    }

    /// Sets the given fields on the document with `id`. Returns `false` if
    /// no such document exists. `_id` cannot be changed.
    pub fn update(&mut self, id: &RecordId, mut set: Document) -> Result<bool> {
        let Some(&seq) = self.ids.get(id) else {
            return Ok(false);
        };
        set.remove(ID_FIELD);

        let Some(old) = self.documents.get(&seq).cloned() else {
            return Ok(false);
        };
        self.remove_from_indexes(seq, &old);
        let mut updated = old;
        updated.merge(set);
        self.add_to_indexes(seq, &updated);
        self.documents.insert(seq, updated);
        Ok(true)
    }

    pub fn find(&self, filter: &Filter, options: &FindOptions) -> Result<Vec<Document>> {
        let mut matched = Vec::new();
        for doc in self.candidates(filter) {
            if filter.matches(doc)? {
                matched.push(doc.clone());
            }
        }

        sort_documents(&mut matched, &options.sort);

        let limit = options.limit.unwrap_or(usize::MAX);
        Ok(matched.into_iter().skip(options.skip).take(limit).collect())
    }

    pub fn count(&self, filter: &Filter) -> Result<usize> {
        let mut count = 0;
        for doc in self.candidates(filter) {
            if filter.matches(doc)? {
                count += 1;
            }
        }
        Ok(count)
    }

    /// Narrows the scan through `_id` or a secondary index when the filter
    /// has an equality term on one; falls back to a full scan.
    fn candidates<'a>(&'a self, filter: &Filter) -> Box<dyn Iterator<Item = &'a Document> + 'a> {
        for (field, value) in filter.equality_terms() {
            if field == ID_FIELD {
                let hit = value.as_id().and_then(|id| self.get(&id));
                return Box::new(hit.into_iter());
            }
            if let Some(index) = self.indexes.get(field) {
                let seqs: Vec<u64> = index.get(value).cloned().unwrap_or_default();
                return Box::new(
                    seqs.into_iter()
                        .filter_map(move |seq| self.documents.get(&seq)),
                );
            }
        }
        Box::new(self.documents.values())
    }

    /// Builds an ascending index on `field`. Returns `false` when the index
    /// already exists.
    pub fn create_index(&mut self, field: &str) -> bool {
        if self.indexes.contains_key(field) {
            return false;
        }
        self.indexes.insert(field.to_string(), self.build_index(field));
        if !self.indexed_fields.iter().any(|f| f == field) {
            self.indexed_fields.push(field.to_string());
        }
        true
    }

    fn build_index(&self, field: &str) -> BTreeMap<Value, Vec<u64>> {
        let mut index: BTreeMap<Value, Vec<u64>> = BTreeMap::new();
        for (seq, doc) in &self.documents {
            if let Some(value) = doc.get(field) {
                index.entry(value.clone()).or_default().push(*seq);
            }
        }
        index
    }

    /// Restores the derived lookup structures after deserialization.
    pub fn rebuild_indexes(&mut self) {
        self.ids = self
            .documents
            .iter()
            .filter_map(|(seq, doc)| doc.id().map(|id| (id, *seq)))
            .collect();
        self.indexes = self
            .indexed_fields
            .iter()
            .map(|field| (field.clone(), self.build_index(field)))
            .collect();
    }

    fn add_to_indexes(&mut self, seq: u64, doc: &Document) {
        for (field, index) in &mut self.indexes {
            if let Some(value) = doc.get(field) {
                index.entry(value.clone()).or_default().push(seq);
            }
        }
    }

    fn remove_from_indexes(&mut self, seq: u64, doc: &Document) {
        for (field, index) in &mut self.indexes {
            if let Some(value) = doc.get(field)
                && let Some(seqs) = index.get_mut(value)
            {
                seqs.retain(|s| *s != seq);
                if seqs.is_empty() {
                    index.remove(value);
                }
            }
        }
    }
}
