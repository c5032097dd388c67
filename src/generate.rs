//! End-to-end generation from a parsed project to LookML records.
//!
//! ```text
//! Project → ModelIndex → anchor metrics → JoinGraph per base model
//!         → extract + validate + compose → views, explores, diagnostics
//! ```
//!
//! # Example
//!
//! ```ignore
//! use lookgen::generate::{generate, GenerateOptions, GenerationMode};
//! use lookgen::model::loader::load_project;
//!
//! let project = load_project(Path::new("models/"))?;
//! let options = GenerateOptions::default().with_mode(GenerationMode::Strict);
//! let output = generate(&project, &options)?;
//! for (file, contents) in output.render(&EmitConfig::default()) {
//!     println!("{file}:\n{contents}");
//! }
//! ```

use std::collections::BTreeMap;

use inflector::Inflector;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::config::{first_present, Settings, SettingsError};
use crate::lookml::emitter::{self, format::is_valid_lookml_name, EmitConfig};
use crate::lookml::{
    build_joins, build_view, ComposedSql, Explore, MetricMeasure, SqlComposer, View, ViewNaming,
};
use crate::model::{ConversionCalculation, Metric, MetricKind, Project};
use crate::semantic::{
    extract_measures, required_measures, resolve_anchor, validate_connectivity, Anchor,
    AnchorSource, IndexError, JoinGraph, MetricCatalog, MetricRequirement, ModelIndex,
    SemanticError, SemanticResult,
};

// ============================================================================
// Error Types
// ============================================================================

/// Errors that abort a generation run.
#[derive(Debug, thiserror::Error)]
pub enum GenerateError {
    #[error("Invalid model set: {0}")]
    Index(#[from] IndexError),

    /// First metric error in strict mode.
    #[error("{0}")]
    Semantic(#[from] SemanticError),
}

pub type GenerateResult<T> = Result<T, GenerateError>;

// ============================================================================
// Options
// ============================================================================

/// What happens when a metric fails validation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationMode {
    /// Abort on the first error.
    Strict,
    /// Skip the metric, record a diagnostic, keep going.
    #[default]
    Lenient,
}

/// Options for a generation run.
#[derive(Debug, Clone, Default)]
pub struct GenerateOptions {
    pub mode: GenerationMode,
    pub max_join_hops: Option<usize>,
    pub naming: ViewNaming,
    pub schema: Option<String>,
    /// Base models that get an explore. `None` means every model with a
    /// primary entity.
    pub explores: Option<Vec<String>>,
}

impl GenerateOptions {
    /// Options taken from the `[generation]` settings section.
    pub fn from_settings(settings: &Settings) -> Result<Self, SettingsError> {
        let generation = &settings.generation;
        Ok(Self {
            mode: generation.mode,
            max_join_hops: generation.max_join_hops,
            naming: ViewNaming::new(&generation.view_prefix, &generation.explore_prefix),
            schema: settings.resolved_schema()?,
            explores: generation.explores.clone(),
        })
    }

    pub fn with_mode(mut self, mode: GenerationMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_max_join_hops(mut self, hops: usize) -> Self {
        self.max_join_hops = Some(hops);
        self
    }

    pub fn with_naming(mut self, naming: ViewNaming) -> Self {
        self.naming = naming;
        self
    }

    pub fn with_schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = Some(schema.into());
        self
    }

    pub fn with_explores(mut self, explores: Vec<String>) -> Self {
        self.explores = Some(explores);
        self
    }
}

// ============================================================================
// Result Types
// ============================================================================

/// Where a metric was anchored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetricAnchor {
    pub metric: String,
    pub entity: String,
    pub model: String,
    pub inferred: bool,
}

/// Everything a run produces.
#[derive(Debug, Clone, Default, Serialize)]
pub struct GenerateOutput {
    /// One view per semantic model, sorted by model name.
    pub views: Vec<View>,
    /// One explore per base model, sorted by model name.
    pub explores: Vec<Explore>,
    /// Anchors of every metric whose primary entity resolved.
    pub anchors: Vec<MetricAnchor>,
    /// Metrics skipped in lenient mode.
    pub diagnostics: Vec<SemanticError>,
}

impl GenerateOutput {
    /// SHA-256 over the JSON form of views and explores.
    ///
    /// Identical inputs always give identical fingerprints.
    pub fn fingerprint(&self) -> Result<String, serde_json::Error> {
        let json = serde_json::to_string(&(&self.views, &self.explores))?;
        let mut hasher = Sha256::new();
        hasher.update(json.as_bytes());
        Ok(format!("{:x}", hasher.finalize()))
    }

    pub fn has_errors(&self) -> bool {
        !self.diagnostics.is_empty()
    }

    pub fn view(&self, name: &str) -> Option<&View> {
        self.views.iter().find(|v| v.name == name)
    }

    pub fn explore(&self, name: &str) -> Option<&Explore> {
        self.explores.iter().find(|e| e.name == name)
    }

    pub fn anchor(&self, metric: &str) -> Option<&MetricAnchor> {
        self.anchors.iter().find(|a| a.metric == metric)
    }

    /// Render all LookML files, keyed by file name.
    pub fn render(&self, config: &EmitConfig) -> BTreeMap<String, String> {
        emitter::render_files(&self.views, &self.explores, config)
    }
}

// ============================================================================
// Generation
// ============================================================================

/// A metric that passed every check.
struct ResolvedMetric<'a> {
    anchor: Anchor<'a>,
    composed: ComposedSql,
    requirement: MetricRequirement,
}

/// Run the full pass over `project`.
pub fn generate(project: &Project, options: &GenerateOptions) -> GenerateResult<GenerateOutput> {
    let index = ModelIndex::build(&project.models)?;
    let catalog = MetricCatalog::new(&project.metrics);
    let mut diagnostics = Vec::new();

    for rejected in &project.rejected {
        record(options.mode, rejected.clone(), &mut diagnostics)?;
    }

    let mut views: BTreeMap<String, View> = index
        .models()
        .map(|model| {
            if !is_valid_lookml_name(&model.name) {
                tracing::warn!(model = %model.name, "model name is not a valid LookML identifier");
            }
            (
                model.name.clone(),
                build_view(model, &options.naming, options.schema.as_deref()),
            )
        })
        .collect();

    let mut metrics: Vec<&Metric> = project.metrics.iter().collect();
    metrics.sort_by(|a, b| a.name.cmp(&b.name));
    metrics.dedup_by(|later, earlier| later.name == earlier.name);

    let mut graphs: BTreeMap<String, JoinGraph> = BTreeMap::new();
    let mut requirements: BTreeMap<String, MetricRequirement> = BTreeMap::new();
    let mut anchors = Vec::new();

    for metric in metrics {
        let resolved = match resolve_metric(metric, &index, &catalog, &mut graphs, options) {
            Ok(resolved) => resolved,
            Err(error) => {
                record(options.mode, error, &mut diagnostics)?;
                continue;
            }
        };

        let model = &resolved.anchor.model.name;
        anchors.push(MetricAnchor {
            metric: metric.name.clone(),
            entity: resolved.anchor.entity.to_string(),
            model: model.clone(),
            inferred: resolved.anchor.source == AnchorSource::InferredFromDenominator,
        });
        requirements
            .entry(model.clone())
            .or_insert_with(|| MetricRequirement::new(model.as_str()))
            .merge(&resolved.requirement);

        if let Some(view) = views.get_mut(model) {
            let measure = metric_measure(metric, resolved.composed, view);
            view.metric_measures.push(measure);
        }
    }

    let explores = build_explores(&index, &mut graphs, &requirements, options);
    let views: Vec<View> = views.into_values().collect();

    tracing::info!(
        views = views.len(),
        explores = explores.len(),
        metrics = anchors.len(),
        defined = catalog.len(),
        skipped = diagnostics.len(),
        "generation finished"
    );

    Ok(GenerateOutput {
        views,
        explores,
        anchors,
        diagnostics,
    })
}

fn resolve_metric<'a>(
    metric: &'a Metric,
    index: &ModelIndex<'a>,
    catalog: &MetricCatalog<'a>,
    graphs: &mut BTreeMap<String, JoinGraph>,
    options: &GenerateOptions,
) -> SemanticResult<ResolvedMetric<'a>> {
    let anchor = resolve_anchor(metric, index)?;
    tracing::debug!(
        metric = %metric.name,
        entity = anchor.entity,
        model = %anchor.model.name,
        source = ?anchor.source,
        "resolved primary entity"
    );

    let measures = extract_measures(metric, catalog)?;
    let graph = graphs
        .entry(anchor.model.name.clone())
        .or_insert_with(|| JoinGraph::build(&anchor.model.name, index, options.max_join_hops));
    validate_connectivity(metric, &measures, anchor.model, graph, index)?;

    let composed = SqlComposer::new(index, catalog, &options.naming).compose(metric, anchor.model)?;
    let requirement = required_measures(&measures, anchor.model, index);

    Ok(ResolvedMetric {
        anchor,
        composed,
        requirement,
    })
}

/// Strict mode returns the error; lenient mode logs and keeps it.
fn record(
    mode: GenerationMode,
    error: SemanticError,
    diagnostics: &mut Vec<SemanticError>,
) -> GenerateResult<()> {
    match mode {
        GenerationMode::Strict => Err(error.into()),
        GenerationMode::Lenient => {
            tracing::warn!(metric = error.metric(), kind = %error.kind(), "skipping metric: {}", error);
            diagnostics.push(error);
            Ok(())
        }
    }
}

fn metric_measure(metric: &Metric, composed: ComposedSql, view: &View) -> MetricMeasure {
    let name = if view.has_field(&metric.name) {
        let renamed = format!("{}_metric", metric.name);
        tracing::warn!(
            metric = %metric.name,
            view = %view.name,
            renamed = %renamed,
            "metric name collides with an existing field"
        );
        renamed
    } else {
        metric.name.clone()
    };

    MetricMeasure {
        name,
        metric: metric.name.clone(),
        measure_type: "number".to_string(),
        sql: composed.sql,
        required_fields: composed.required_fields,
        label: metric
            .display
            .label
            .clone()
            .unwrap_or_else(|| metric.name.to_title_case()),
        description: metric.display.description.clone(),
        value_format_name: first_present([
            metric.display.value_format_name.clone(),
            default_value_format(metric).map(str::to_string),
        ]),
    }
}

fn default_value_format(metric: &Metric) -> Option<&'static str> {
    match &metric.kind {
        MetricKind::Ratio { .. } => Some("percent_2"),
        MetricKind::Conversion(params)
            if params.calculation == ConversionCalculation::ConversionRate =>
        {
            Some("percent_2")
        }
        _ => None,
    }
}

fn build_explores(
    index: &ModelIndex<'_>,
    graphs: &mut BTreeMap<String, JoinGraph>,
    requirements: &BTreeMap<String, MetricRequirement>,
    options: &GenerateOptions,
) -> Vec<Explore> {
    if let Some(include) = &options.explores {
        for name in include.iter().filter(|name| !index.has_model(name)) {
            tracing::warn!(model = %name, "explore requested for unknown model");
        }
    }

    let mut explores = Vec::new();
    for model in index.models() {
        if model.primary_entity().is_none() {
            continue;
        }
        if let Some(include) = &options.explores {
            if !include.contains(&model.name) {
                if requirements.contains_key(&model.name) {
                    tracing::warn!(
                        model = %model.name,
                        "metrics are anchored on a model without an explore"
                    );
                }
                continue;
            }
        }

        let graph = graphs
            .entry(model.name.clone())
            .or_insert_with(|| JoinGraph::build(&model.name, index, options.max_join_hops));
        let empty = MetricRequirement::new(model.name.as_str());
        let requirement = requirements.get(&model.name).unwrap_or(&empty);

        explores.push(Explore {
            name: options.naming.explore_name(&model.name),
            base_view: options.naming.view_name(&model.name),
            label: Some(model.name.to_title_case()),
            joins: build_joins(graph, requirement, &options.naming),
        });
    }
    explores
}
