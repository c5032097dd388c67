//! Join graph construction.
//!
//! A [`JoinGraph`] records, for one base model, every model reachable over
//! foreign-key links together with the shortest hop count, the cardinality of
//! the final hop and the predicate joining it to the model it is reached from.
//! It is built once per base model and never mutated afterwards.

use std::collections::{BTreeMap, HashSet, VecDeque};

use serde::Serialize;

use super::index::ModelIndex;

/// Cardinality of a join, seen from the side doing the joining.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Cardinality {
    /// Joined via the source model's foreign entity.
    ManyToOne,
    /// Joined via a foreign entity on the target pointing back.
    OneToMany,
}

impl Cardinality {
    pub fn as_str(&self) -> &'static str {
        match self {
            Cardinality::ManyToOne => "many_to_one",
            Cardinality::OneToMany => "one_to_many",
        }
    }
}

impl std::fmt::Display for Cardinality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Equality predicate between the matching entities of two models.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JoinPredicate {
    pub from_model: String,
    pub from_entity: String,
    pub from_expr: String,
    pub to_model: String,
    pub to_entity: String,
    pub to_expr: String,
}

impl std::fmt::Display for JoinPredicate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}.{} = {}.{}",
            self.from_model, self.from_expr, self.to_model, self.to_expr
        )
    }
}

/// One reachable model in a join graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JoinEntry {
    pub target: String,
    /// Model this entry is joined from (the base for single-hop joins).
    pub via: String,
    pub hop_count: usize,
    pub cardinality: Cardinality,
    pub predicate: JoinPredicate,
}

/// Models reachable from one base model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JoinGraph {
    base: String,
    entries: BTreeMap<String, JoinEntry>,
}

impl JoinGraph {
    /// Breadth-first traversal from `base` over foreign-key links.
    ///
    /// The first visit of a model is its shortest path; later paths are
    /// ignored, so the graph is acyclic. `max_hops` bounds traversal depth.
    pub fn build(base: &str, index: &ModelIndex<'_>, max_hops: Option<usize>) -> Self {
        let mut entries = BTreeMap::new();
        let mut visited: HashSet<String> = HashSet::new();
        let mut queue: VecDeque<(String, usize)> = VecDeque::new();

        visited.insert(base.to_string());
        queue.push_back((base.to_string(), 0));

        while let Some((current, hops)) = queue.pop_front() {
            if max_hops.is_some_and(|max| hops >= max) {
                continue;
            }

            for link in index.links_from(&current) {
                if !visited.insert(link.target.to_string()) {
                    continue;
                }

                let entry = JoinEntry {
                    target: link.target.to_string(),
                    via: current.clone(),
                    hop_count: hops + 1,
                    cardinality: link.data.cardinality,
                    predicate: JoinPredicate {
                        from_model: current.clone(),
                        from_entity: link.data.from_entity.clone(),
                        from_expr: link.data.from_expr.clone(),
                        to_model: link.target.to_string(),
                        to_entity: link.data.to_entity.clone(),
                        to_expr: link.data.to_expr.clone(),
                    },
                };
                tracing::debug!(
                    base,
                    target = link.target,
                    hops = entry.hop_count,
                    cardinality = %entry.cardinality,
                    "join discovered"
                );

                entries.insert(entry.target.clone(), entry);
                queue.push_back((link.target.to_string(), hops + 1));
            }
        }

        Self {
            base: base.to_string(),
            entries,
        }
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    /// Is `model` joined into this graph? The base itself is not an entry.
    pub fn contains(&self, model: &str) -> bool {
        self.entries.contains_key(model)
    }

    /// Can a metric anchored on the base use fields of `model`?
    pub fn reaches(&self, model: &str) -> bool {
        model == self.base || self.contains(model)
    }

    pub fn entry(&self, model: &str) -> Option<&JoinEntry> {
        self.entries.get(model)
    }

    /// Joins in emission order: by hop count, then model name.
    ///
    /// Every entry's `via` model is either the base or appears earlier.
    pub fn joins(&self) -> Vec<&JoinEntry> {
        let mut joins: Vec<&JoinEntry> = self.entries.values().collect();
        joins.sort_by(|a, b| (a.hop_count, &a.target).cmp(&(b.hop_count, &b.target)));
        joins
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
