//! # lookgen
//!
//! Generates LookML views and explores from a dbt-style semantic layer.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │        YAML (semantic_models: / metrics: blocks)         │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [model::loader]
//! ┌─────────────────────────────────────────────────────────┐
//! │            Project (SemanticModel, Metric)               │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [semantic]
//! ┌─────────────────────────────────────────────────────────┐
//! │   ModelIndex → JoinGraph per base model                  │
//! │   anchor → extract measures → validate connectivity      │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [lookml + generate]
//! ┌─────────────────────────────────────────────────────────┐
//! │   Views, metric measures, explores with join fields      │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [lookml::emitter]
//! ┌─────────────────────────────────────────────────────────┐
//! │               *.view.lkml, explores.lkml                 │
//! └─────────────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod generate;
pub mod lookml;
pub mod model;
pub mod semantic;

/// Re-exports for convenient usage.
pub mod prelude {
    pub use crate::config::{Settings, SettingsError};
    pub use crate::generate::{
        generate, GenerateError, GenerateOptions, GenerateOutput, GenerationMode, MetricAnchor,
    };
    pub use crate::lookml::emitter::EmitConfig;
    pub use crate::lookml::{Explore, Join, MetricMeasure, View, ViewNaming};
    pub use crate::model::loader::{load_project, load_project_from_str, LoadError};
    pub use crate::model::{
        AggregationType, Dimension, Entity, Measure, Metric, MetricInput, MetricKind, Project,
        SemanticModel, TimeGranularity,
    };
    pub use crate::semantic::{
        Cardinality, ErrorKind, JoinGraph, ModelIndex, SemanticError,
    };
}

pub use generate::{generate, GenerateOptions, GenerateOutput, GenerationMode};
pub use model::Project;
