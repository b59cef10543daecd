//! Declarative aggregation pipelines.
//!
//! A [`Pipeline`] is an ordered list of [`Stage`]s applied to the documents
//! of one collection. The store resolves a leading `Match` stage against its
//! indexes and hands the filtered set to [`execute`] for the remaining stages.
//!
//! `Facet` runs several sub-pipelines over the same intermediate set and
//! folds their outputs into a single document, one array field per branch,
//! so one round trip yields several independent groupings of one filtered
//! input.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use crate::core::{Document, Result, StoreError, Value};

use super::filter::Filter;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Ascending,
    Descending,
}

/// Field expressions usable in a `Project` stage.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Field(String),
    /// UTC calendar day of a timestamp field, as `YYYY-MM-DD` text.
    DayOf(String),
    Literal(Value),
}

impl Expr {
    pub fn field(name: impl Into<String>) -> Self {
        Self::Field(name.into())
    }

    pub fn day_of(name: impl Into<String>) -> Self {
        Self::DayOf(name.into())
    }

    fn evaluate(&self, doc: &Document) -> Result<Value> {
        match self {
            Self::Field(name) => Ok(doc.get_or_null(name)),
            Self::DayOf(name) => doc.get_or_null(name).day_of(),
            Self::Literal(value) => Ok(value.clone()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Stage {
    Match(Filter),
    /// Replaces each document by the listed output fields.
    Project(Vec<(String, Expr)>),
    /// Groups by the listed fields; each output row holds the key fields
    /// plus the group size under `count_as`.
    Group { by: Vec<String>, count_as: String },
    Sort(Vec<(String, SortOrder)>),
    Skip(usize),
    Limit(usize),
    Facet(Vec<(String, Vec<Stage>)>),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Pipeline {
    stages: Vec<Stage>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stage(mut self, stage: Stage) -> Self {
        self.stages.push(stage);
        self
    }

    pub fn matching(self, filter: Filter) -> Self {
        self.stage(Stage::Match(filter))
    }

    pub fn facet<I, S>(self, branches: I) -> Self
    where
        I: IntoIterator<Item = (S, Vec<Stage>)>,
        S: Into<String>,
    {
        let branches = branches
            .into_iter()
            .map(|(name, stages)| (name.into(), stages))
            .collect();
        self.stage(Stage::Facet(branches))
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    /// Splits off a leading `Match` so the store can serve it from an index.
    pub fn split_leading_match(&self) -> (Option<&Filter>, &[Stage]) {
        match self.stages.split_first() {
            Some((Stage::Match(filter), rest)) => (Some(filter), rest),
            _ => (None, &self.stages),
        }
    }

    pub fn validate(&self) -> Result<()> {
        validate_stages(&self.stages, 0)
    }
}

fn validate_stages(stages: &[Stage], depth: usize) -> Result<()> {
    for stage in stages {
        match stage {
            Stage::Group { by, count_as } => {
                if by.is_empty() {
                    return Err(StoreError::InvalidPipeline(
                        "group stage needs at least one key field".to_string(),
                    ));
                }
                if by.contains(count_as) {
                    return Err(StoreError::InvalidPipeline(format!(
                        "group count field '{}' collides with a key field",
                        count_as
                    )));
                }
            }
            Stage::Facet(branches) => {
                if depth > 0 {
                    return Err(StoreError::InvalidPipeline(
                        "facet stages cannot be nested".to_string(),
                    ));
                }
                if branches.is_empty() {
                    return Err(StoreError::InvalidPipeline(
                        "facet stage needs at least one branch".to_string(),
                    ));
                }
                for (_, branch) in branches {
                    validate_stages(branch, depth + 1)?;
                }
            }
            _ => {}
        }
    }
    Ok(())
}

/// Applies `stages` in order to `documents`.
pub fn execute(stages: &[Stage], mut documents: Vec<Document>) -> Result<Vec<Document>> {
    for stage in stages {
        documents = apply(stage, documents)?;
    }
    Ok(documents)
}

fn apply(stage: &Stage, documents: Vec<Document>) -> Result<Vec<Document>> {
    match stage {
        Stage::Match(filter) => {
            let mut kept = Vec::with_capacity(documents.len());
            for doc in documents {
                if filter.matches(&doc)? {
                    kept.push(doc);
                }
            }
            Ok(kept)
        }
        Stage::Project(fields) => documents
            .iter()
            .map(|doc| {
                fields
                    .iter()
                    .map(|(name, expr)| Ok((name.clone(), expr.evaluate(doc)?)))
                    .collect::<Result<Document>>()
            })
            .collect(),
        Stage::Group { by, count_as } => Ok(group(documents, by, count_as)),
        Stage::Sort(keys) => {
            let mut documents = documents;
            sort_documents(&mut documents, keys);
            Ok(documents)
        }
        Stage::Skip(n) => Ok(documents.into_iter().skip(*n).collect()),
        Stage::Limit(n) => Ok(documents.into_iter().take(*n).collect()),
        Stage::Facet(branches) => {
            let mut output = Document::new();
            for (name, branch) in branches {
                let rows = execute(branch, documents.clone())?;
                output.set(
                    name.clone(),
                    Value::Array(rows.into_iter().map(Value::Document).collect()),
                );
            }
            Ok(vec![output])
        }
    }
}

fn group(documents: Vec<Document>, by: &[String], count_as: &str) -> Vec<Document> {
    let mut groups: BTreeMap<Vec<Value>, i64> = BTreeMap::new();
    for doc in &documents {
        let key = by.iter().map(|field| doc.get_or_null(field)).collect();
        *groups.entry(key).or_insert(0) += 1;
    }

    groups
        .into_iter()
        .map(|(key, count)| {
            let mut row: Document = by.iter().cloned().zip(key).collect();
            row.set(count_as, count);
            row
        })
        .collect()
}

/// Stable multi-key sort; missing fields sort as `NULL`.
pub fn sort_documents(documents: &mut [Document], keys: &[(String, SortOrder)]) {
    if keys.is_empty() {
        return;
    }
    documents.sort_by(|a, b| {
        for (field, order) in keys {
            let ordering = a.get_or_null(field).cmp(&b.get_or_null(field));
            let ordering = match order {
                SortOrder::Ascending => ordering,
                SortOrder::Descending => ordering.reverse(),
            };
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    });
}
