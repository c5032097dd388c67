//! Join-graph-aware metric resolution.
//!
//! Turns parsed semantic models and metrics into the facts code generation
//! needs: which models each base model can join, which model anchors each
//! metric, which measures a metric reads, and whether those measures are
//! reachable from the anchor.
//!
//! The pieces, leaves first:
//!
//! 1. **Index** - primary entity / measure → owning model lookups
//! 2. **Join graph** - BFS over foreign-key links from a base model
//! 3. **Resolve** - pick a metric's anchor entity and model
//! 4. **Dependencies** - flatten a metric into measure names
//! 5. **Validation** - prove every measure is reachable from the anchor

pub mod dependencies;
pub mod error;
pub mod index;
pub mod join_graph;
pub mod requirement;
pub mod resolve;
pub mod validation;

pub use dependencies::{extract_measures, MetricCatalog};
pub use error::{ErrorKind, SemanticError, SemanticResult};
pub use index::{IndexError, Link, LinkData, ModelIndex};
pub use join_graph::{Cardinality, JoinEntry, JoinGraph, JoinPredicate};
pub use requirement::MetricRequirement;
pub use resolve::{resolve_anchor, resolve_primary_entity, Anchor, AnchorSource};
pub use validation::{required_measures, validate_connectivity};
