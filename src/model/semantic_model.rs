// src/model/semantic_model.rs
use serde::Serialize;

/// Role of an entity within its semantic model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityRole {
    /// The model-level join key.
    Primary,
    /// A reference to the model that declares the matching primary entity.
    Foreign,
}

impl EntityRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityRole::Primary => "primary",
            EntityRole::Foreign => "foreign",
        }
    }
}

impl std::fmt::Display for EntityRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An entity (join key) declared on a semantic model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Entity {
    pub name: String,
    pub role: EntityRole,
    /// Underlying column expression. Defaults to the entity name.
    pub expr: String,
}

impl Entity {
    pub fn primary(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            expr: name.clone(),
            name,
            role: EntityRole::Primary,
        }
    }

    pub fn foreign(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            expr: name.clone(),
            name,
            role: EntityRole::Foreign,
        }
    }

    pub fn with_expr(mut self, expr: impl Into<String>) -> Self {
        self.expr = expr.into();
        self
    }

    pub fn is_primary(&self) -> bool {
        self.role == EntityRole::Primary
    }

    pub fn is_foreign(&self) -> bool {
        self.role == EntityRole::Foreign
    }
}

/// Time granularity of a time dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeGranularity {
    Hour,
    Day,
    Week,
    Month,
    Quarter,
    Year,
}

impl TimeGranularity {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "hour" => Some(Self::Hour),
            "day" => Some(Self::Day),
            "week" => Some(Self::Week),
            "month" => Some(Self::Month),
            "quarter" => Some(Self::Quarter),
            "year" => Some(Self::Year),
            _ => None,
        }
    }
}

/// Kind of dimension.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DimensionKind {
    Categorical,
    Time { granularity: TimeGranularity },
}

/// A dimension on a semantic model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Dimension {
    pub name: String,
    pub kind: DimensionKind,
    pub expr: Option<String>,
    pub label: Option<String>,
    pub description: Option<String>,
}

impl Dimension {
    pub fn categorical(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: DimensionKind::Categorical,
            expr: None,
            label: None,
            description: None,
        }
    }

    pub fn time(name: impl Into<String>, granularity: TimeGranularity) -> Self {
        Self {
            name: name.into(),
            kind: DimensionKind::Time { granularity },
            expr: None,
            label: None,
            description: None,
        }
    }

    pub fn with_expr(mut self, expr: impl Into<String>) -> Self {
        self.expr = Some(expr.into());
        self
    }

    /// Column expression, falling back to the dimension name.
    pub fn column_expr(&self) -> &str {
        self.expr.as_deref().unwrap_or(&self.name)
    }
}

/// Aggregation applied by a measure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregationType {
    Sum,
    SumBoolean,
    Count,
    CountDistinct,
    Average,
    Min,
    Max,
    Median,
}

impl AggregationType {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "sum" => Some(Self::Sum),
            "sum_boolean" => Some(Self::SumBoolean),
            "count" => Some(Self::Count),
            "count_distinct" => Some(Self::CountDistinct),
            "average" | "avg" => Some(Self::Average),
            "min" => Some(Self::Min),
            "max" => Some(Self::Max),
            "median" => Some(Self::Median),
            _ => None,
        }
    }
}

/// A measure owned by exactly one semantic model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Measure {
    pub name: String,
    pub agg: AggregationType,
    pub expr: Option<String>,
    pub label: Option<String>,
    pub description: Option<String>,
}

impl Measure {
    pub fn new(name: impl Into<String>, agg: AggregationType) -> Self {
        Self {
            name: name.into(),
            agg,
            expr: None,
            label: None,
            description: None,
        }
    }

    pub fn with_expr(mut self, expr: impl Into<String>) -> Self {
        self.expr = Some(expr.into());
        self
    }
}

/// A parsed semantic model. Immutable once loaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SemanticModel {
    pub name: String,
    /// Underlying relation, e.g. the `x` of `ref('x')`.
    pub relation: Option<String>,
    pub description: Option<String>,
    pub entities: Vec<Entity>,
    pub dimensions: Vec<Dimension>,
    pub measures: Vec<Measure>,
}

impl SemanticModel {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            relation: None,
            description: None,
            entities: Vec::new(),
            dimensions: Vec::new(),
            measures: Vec::new(),
        }
    }

    pub fn with_relation(mut self, relation: impl Into<String>) -> Self {
        self.relation = Some(relation.into());
        self
    }

    pub fn with_entity(mut self, entity: Entity) -> Self {
        self.entities.push(entity);
        self
    }

    pub fn with_dimension(mut self, dimension: Dimension) -> Self {
        self.dimensions.push(dimension);
        self
    }

    pub fn with_measure(mut self, measure: Measure) -> Self {
        self.measures.push(measure);
        self
    }

    /// The model's declared primary entity, if any.
    pub fn primary_entity(&self) -> Option<&Entity> {
        self.entities.iter().find(|e| e.is_primary())
    }

    pub fn foreign_entities(&self) -> impl Iterator<Item = &Entity> {
        self.entities.iter().filter(|e| e.is_foreign())
    }

    pub fn entity(&self, name: &str) -> Option<&Entity> {
        self.entities.iter().find(|e| e.name == name)
    }

    pub fn measure(&self, name: &str) -> Option<&Measure> {
        self.measures.iter().find(|m| m.name == name)
    }
}
