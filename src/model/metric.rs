// src/model/metric.rs
use serde::Serialize;

/// Type tag of a metric, as written in the source YAML.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricType {
    Simple,
    Ratio,
    Derived,
    Conversion,
}

impl MetricType {
    /// Parse a type tag. Unknown tags return `None`.
    pub fn parse(tag: &str) -> Option<Self> {
        match tag.to_ascii_lowercase().as_str() {
            "simple" => Some(Self::Simple),
            "ratio" => Some(Self::Ratio),
            "derived" => Some(Self::Derived),
            "conversion" => Some(Self::Conversion),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MetricType::Simple => "simple",
            MetricType::Ratio => "ratio",
            MetricType::Derived => "derived",
            MetricType::Conversion => "conversion",
        }
    }
}

impl std::fmt::Display for MetricType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A metric referenced from a derived metric's expression.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetricInput {
    pub name: String,
    /// Identifier used in the expression instead of `name`.
    pub alias: Option<String>,
    pub offset_window: Option<String>,
    pub offset_to_grain: Option<String>,
}

impl MetricInput {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            alias: None,
            offset_window: None,
            offset_to_grain: None,
        }
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    pub fn with_offset_window(mut self, window: impl Into<String>) -> Self {
        self.offset_window = Some(window.into());
        self
    }

    /// The identifier this input is referred to by in the expression.
    pub fn reference_name(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }

    pub fn has_offset(&self) -> bool {
        self.offset_window.is_some() || self.offset_to_grain.is_some()
    }
}

/// What a conversion metric computes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversionCalculation {
    #[default]
    ConversionRate,
    Conversions,
}

/// Parameter block of a conversion metric.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConversionParams {
    pub entity: String,
    pub base_measure: String,
    pub conversion_measure: String,
    pub calculation: ConversionCalculation,
    pub window: Option<String>,
}

/// Per-variant metric payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MetricKind {
    Simple {
        measure: String,
    },
    Ratio {
        numerator: String,
        denominator: String,
    },
    Derived {
        expr: String,
        metrics: Vec<MetricInput>,
    },
    Conversion(ConversionParams),
}

impl MetricKind {
    pub fn metric_type(&self) -> MetricType {
        match self {
            MetricKind::Simple { .. } => MetricType::Simple,
            MetricKind::Ratio { .. } => MetricType::Ratio,
            MetricKind::Derived { .. } => MetricType::Derived,
            MetricKind::Conversion(_) => MetricType::Conversion,
        }
    }
}

/// Optional display metadata carried through to the generated measure.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct DisplayMeta {
    pub label: Option<String>,
    pub description: Option<String>,
    pub value_format_name: Option<String>,
}

/// A metric declared in the semantic layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Metric {
    pub name: String,
    pub kind: MetricKind,
    /// Explicit primary-entity override.
    pub primary_entity: Option<String>,
    pub display: DisplayMeta,
}

impl Metric {
    pub fn simple(name: impl Into<String>, measure: impl Into<String>) -> Self {
        Self::new(
            name,
            MetricKind::Simple {
                measure: measure.into(),
            },
        )
    }

    pub fn ratio(
        name: impl Into<String>,
        numerator: impl Into<String>,
        denominator: impl Into<String>,
    ) -> Self {
        Self::new(
            name,
            MetricKind::Ratio {
                numerator: numerator.into(),
                denominator: denominator.into(),
            },
        )
    }

    pub fn derived(name: impl Into<String>, expr: impl Into<String>, metrics: Vec<MetricInput>) -> Self {
        Self::new(
            name,
            MetricKind::Derived {
                expr: expr.into(),
                metrics,
            },
        )
    }

    pub fn conversion(name: impl Into<String>, params: ConversionParams) -> Self {
        Self::new(name, MetricKind::Conversion(params))
    }

    pub fn new(name: impl Into<String>, kind: MetricKind) -> Self {
        Self {
            name: name.into(),
            kind,
            primary_entity: None,
            display: DisplayMeta::default(),
        }
    }

    pub fn with_primary_entity(mut self, entity: impl Into<String>) -> Self {
        self.primary_entity = Some(entity.into());
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.display.label = Some(label.into());
        self
    }

    pub fn metric_type(&self) -> MetricType {
        self.kind.metric_type()
    }
}
