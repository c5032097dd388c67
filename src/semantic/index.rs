//! Entity relationship index.
//!
//! Answers "which model declares primary entity X" and "which model owns
//! measure Y" in O(1), and holds the foreign-key relationship graph that
//! [`JoinGraph`](super::JoinGraph) traverses.

use std::collections::{BTreeMap, HashMap};

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use thiserror::Error;

use crate::model::SemanticModel;

use super::join_graph::Cardinality;

/// Errors detected while indexing the parsed models.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IndexError {
    #[error("Duplicate semantic model name: '{0}'")]
    DuplicateModel(String),

    #[error("Measure '{measure}' is defined in both '{first}' and '{second}'. Measure names must be unique across models.")]
    DuplicateMeasure {
        measure: String,
        first: String,
        second: String,
    },

    #[error("Primary entity '{entity}' is declared by both '{first}' and '{second}'")]
    DuplicatePrimaryEntity {
        entity: String,
        first: String,
        second: String,
    },

    #[error("Semantic model '{0}' declares more than one primary entity")]
    MultiplePrimaryEntities(String),
}

/// Edge data for a foreign-key link between two models.
///
/// `from_*` is always the side the edge leaves from, so a reverse edge has
/// the primary entity on its `from` side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkData {
    pub from_entity: String,
    pub from_expr: String,
    pub to_entity: String,
    pub to_expr: String,
    pub cardinality: Cardinality,
}

/// A link out of a model, resolved to the target model's name.
#[derive(Debug, Clone, Copy)]
pub struct Link<'i> {
    pub target: &'i str,
    pub data: &'i LinkData,
}

/// Read-only lookup structure built once per generation run.
#[derive(Debug, Clone)]
pub struct ModelIndex<'a> {
    models: BTreeMap<&'a str, &'a SemanticModel>,
    entity_owners: HashMap<&'a str, &'a str>,
    measure_owners: HashMap<&'a str, &'a str>,
    graph: DiGraph<&'a str, LinkData>,
    node_indices: HashMap<&'a str, NodeIndex>,
}

impl<'a> ModelIndex<'a> {
    /// Index a set of parsed models.
    pub fn build(models: &'a [SemanticModel]) -> Result<Self, IndexError> {
        let mut by_name: BTreeMap<&'a str, &'a SemanticModel> = BTreeMap::new();
        for model in models {
            if by_name.insert(model.name.as_str(), model).is_some() {
                return Err(IndexError::DuplicateModel(model.name.clone()));
            }
        }

        let mut entity_owners: HashMap<&'a str, &'a str> = HashMap::new();
        let mut measure_owners: HashMap<&'a str, &'a str> = HashMap::new();

        for (&name, model) in &by_name {
            if model.entities.iter().filter(|e| e.is_primary()).count() > 1 {
                return Err(IndexError::MultiplePrimaryEntities(name.to_string()));
            }

            if let Some(primary) = model.primary_entity() {
                if let Some(first) = entity_owners.insert(primary.name.as_str(), name) {
                    return Err(IndexError::DuplicatePrimaryEntity {
                        entity: primary.name.clone(),
                        first: first.to_string(),
                        second: name.to_string(),
                    });
                }
            }

            for measure in &model.measures {
                if let Some(first) = measure_owners.insert(measure.name.as_str(), name) {
                    return Err(IndexError::DuplicateMeasure {
                        measure: measure.name.clone(),
                        first: first.to_string(),
                        second: name.to_string(),
                    });
                }
            }
        }

        let mut graph = DiGraph::new();
        let mut node_indices = HashMap::new();
        for &name in by_name.keys() {
            node_indices.insert(name, graph.add_node(name));
        }

        for (&name, model) in &by_name {
            for foreign in model.foreign_entities() {
                let Some(&target) = entity_owners.get(foreign.name.as_str()) else {
                    tracing::warn!(
                        model = name,
                        entity = %foreign.name,
                        "foreign entity has no matching primary entity; no join will be emitted"
                    );
                    continue;
                };
                if target == name {
                    continue;
                }
                let Some(primary) = by_name[target].primary_entity() else {
                    continue;
                };

                let (from_idx, to_idx) = (node_indices[name], node_indices[target]);

                // Forward edge: the foreign key side fans in to the primary.
                graph.add_edge(
                    from_idx,
                    to_idx,
                    LinkData {
                        from_entity: foreign.name.clone(),
                        from_expr: foreign.expr.clone(),
                        to_entity: primary.name.clone(),
                        to_expr: primary.expr.clone(),
                        cardinality: Cardinality::ManyToOne,
                    },
                );

                // Reverse edge: the primary side fans out to the foreign key.
                graph.add_edge(
                    to_idx,
                    from_idx,
                    LinkData {
                        from_entity: primary.name.clone(),
                        from_expr: primary.expr.clone(),
                        to_entity: foreign.name.clone(),
                        to_expr: foreign.expr.clone(),
                        cardinality: Cardinality::OneToMany,
                    },
                );
            }
        }

        Ok(Self {
            models: by_name,
            entity_owners,
            measure_owners,
            graph,
            node_indices,
        })
    }

    /// All models, ordered by name.
    pub fn models(&self) -> impl Iterator<Item = &'a SemanticModel> + '_ {
        self.models.values().copied()
    }

    pub fn has_model(&self, name: &str) -> bool {
        self.models.contains_key(name)
    }

    /// The model declaring `entity` as its primary entity.
    pub fn model_for_entity(&self, entity: &str) -> Option<&'a SemanticModel> {
        self.entity_owners
            .get(entity)
            .and_then(|name| self.models.get(name).copied())
    }

    /// The model owning `measure`.
    pub fn model_for_measure(&self, measure: &str) -> Option<&'a SemanticModel> {
        self.measure_owners
            .get(measure)
            .and_then(|name| self.models.get(name).copied())
    }

    /// Links leaving `model`, ordered by target model then entity name.
    pub fn links_from(&self, model: &str) -> Vec<Link<'_>> {
        let Some(&idx) = self.node_indices.get(model) else {
            return Vec::new();
        };

        let mut links: Vec<Link<'_>> = self
            .graph
            .edges(idx)
            .map(|edge| Link {
                target: self.graph[edge.target()],
                data: edge.weight(),
            })
            .collect();
        links.sort_by(|a, b| {
            (a.target, a.data.from_entity.as_str()).cmp(&(b.target, b.data.from_entity.as_str()))
        });
        links
    }

    /// Number of foreign-key links (each stored in both directions).
    pub fn link_count(&self) -> usize {
        self.graph.edge_count() / 2
    }
}
