//! LookML output records.
//!
//! Plain data consumed by the [`emitter`]: one [`View`] per semantic model
//! and one [`Explore`] per base model, with joins carrying their field
//! exposure lists.

pub mod emitter;
pub mod exposure;
pub mod sql;
pub mod views;

use serde::Serialize;

use crate::semantic::Cardinality;

pub use exposure::{build_joins, join_fields, DIMENSIONS_ONLY_SET};
pub use sql::{ComposedSql, SqlComposer};
pub use views::build_view;

/// Maps model names to view and explore names.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ViewNaming {
    pub view_prefix: String,
    pub explore_prefix: String,
}

impl ViewNaming {
    pub fn new(view_prefix: impl Into<String>, explore_prefix: impl Into<String>) -> Self {
        Self {
            view_prefix: view_prefix.into(),
            explore_prefix: explore_prefix.into(),
        }
    }

    pub fn view_name(&self, model: &str) -> String {
        format!("{}{}", self.view_prefix, model)
    }

    pub fn explore_name(&self, model: &str) -> String {
        format!("{}{}", self.explore_prefix, model)
    }
}

/// A `dimension` field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Dimension {
    pub name: String,
    pub dimension_type: Option<String>,
    pub sql: String,
    pub primary_key: bool,
    pub hidden: bool,
    pub label: Option<String>,
    pub description: Option<String>,
}

/// A `dimension_group` of type time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DimensionGroup {
    pub name: String,
    pub timeframes: Vec<String>,
    pub sql: String,
    pub label: Option<String>,
    pub description: Option<String>,
}

impl DimensionGroup {
    /// Field names the group expands to, e.g. `created_date`.
    pub fn field_names(&self) -> impl Iterator<Item = String> + '_ {
        self.timeframes
            .iter()
            .map(move |tf| format!("{}_{}", self.name, tf))
    }
}

/// A `measure` mapped 1:1 from a semantic-model measure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Measure {
    pub name: String,
    pub measure_type: String,
    pub sql: Option<String>,
    pub label: Option<String>,
    pub description: Option<String>,
}

/// A `type: number` measure generated from a metric.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetricMeasure {
    pub name: String,
    pub metric: String,
    pub measure_type: String,
    pub sql: String,
    /// Every cross-view measure the SQL touches, sorted.
    pub required_fields: Vec<String>,
    pub label: String,
    pub description: Option<String>,
    pub value_format_name: Option<String>,
}

/// A view generated for one semantic model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct View {
    pub name: String,
    pub model: String,
    pub sql_table_name: Option<String>,
    pub description: Option<String>,
    pub dimensions: Vec<Dimension>,
    pub dimension_groups: Vec<DimensionGroup>,
    pub measures: Vec<Measure>,
    pub metric_measures: Vec<MetricMeasure>,
}

impl View {
    /// Every non-measure field, sorted. Backs the `dimensions_only` set.
    pub fn dimension_fields(&self) -> Vec<String> {
        let mut fields: Vec<String> = self
            .dimensions
            .iter()
            .map(|d| d.name.clone())
            .chain(self.dimension_groups.iter().flat_map(|g| g.field_names()))
            .collect();
        fields.sort();
        fields.dedup();
        fields
    }

    /// Does the view already define a field called `name`?
    pub fn has_field(&self, name: &str) -> bool {
        self.dimensions.iter().any(|d| d.name == name)
            || self
                .dimension_groups
                .iter()
                .any(|g| g.name == name || g.field_names().any(|f| f == name))
            || self.measures.iter().any(|m| m.name == name)
            || self.metric_measures.iter().any(|m| m.name == name)
    }
}

/// A join inside an explore.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Join {
    pub view: String,
    pub sql_on: String,
    pub relationship: Cardinality,
    pub join_type: String,
    pub hop_count: usize,
    /// Default dimension set first, then required measures sorted.
    pub fields: Vec<String>,
}

/// An explore rooted at one base model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Explore {
    pub name: String,
    pub base_view: String,
    pub label: Option<String>,
    pub joins: Vec<Join>,
}

impl Explore {
    pub fn join(&self, view: &str) -> Option<&Join> {
        self.joins.iter().find(|j| j.view == view)
    }
}
