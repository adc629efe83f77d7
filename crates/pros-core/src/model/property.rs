//! Scalar property declarations.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Semantic type of a scalar property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropertyKind {
    String,
    Boolean,
    /// Calendar date, `YYYY-MM-DD`.
    Date,
    /// RFC 3339 timestamp.
    DateTime,
    Float,
    Integer,
    /// UUID in hyphenated form.
    UniqueId,
}

impl PropertyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PropertyKind::String => "string",
            PropertyKind::Boolean => "boolean",
            PropertyKind::Date => "date",
            PropertyKind::DateTime => "date_time",
            PropertyKind::Float => "float",
            PropertyKind::Integer => "integer",
            PropertyKind::UniqueId => "unique_id",
        }
    }

    /// Whether `value` is a well-formed stored value of this kind.
    pub fn accepts(&self, value: &Value) -> bool {
        match self {
            PropertyKind::String => value.is_string(),
            PropertyKind::Boolean => value.is_boolean(),
            PropertyKind::Float => value.is_number(),
            PropertyKind::Integer => value.is_i64() || value.is_u64(),
            PropertyKind::Date => value
                .as_str()
                .is_some_and(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").is_ok()),
            PropertyKind::DateTime => value
                .as_str()
                .is_some_and(|s| DateTime::parse_from_rfc3339(s).is_ok()),
            PropertyKind::UniqueId => value.as_str().is_some_and(|s| Uuid::parse_str(s).is_ok()),
        }
    }
}

impl std::fmt::Display for PropertyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A default computed when a record is created rather than fixed up front.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Generator {
    /// Current UTC time.
    Now,
    /// Fresh v4 UUID.
    Uuid,
}

impl Generator {
    pub fn generate(&self) -> Value {
        match self {
            Generator::Now => Value::String(Utc::now().to_rfc3339()),
            Generator::Uuid => Value::String(Uuid::new_v4().to_string()),
        }
    }
}

/// One declared scalar property.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyDecl {
    pub kind: PropertyKind,

    #[serde(default)]
    pub required: bool,

    /// Fixed default value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,

    /// Default produced at creation time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generated: Option<Generator>,

    /// Allowed values, empty when unrestricted.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub choices: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub help_text: Option<String>,
}

impl PropertyDecl {
    pub fn new(kind: PropertyKind) -> Self {
        Self {
            kind,
            required: false,
            default: None,
            generated: None,
            choices: Vec::new(),
            help_text: None,
        }
    }

    pub fn string() -> Self {
        Self::new(PropertyKind::String)
    }

    pub fn boolean() -> Self {
        Self::new(PropertyKind::Boolean)
    }

    pub fn date() -> Self {
        Self::new(PropertyKind::Date)
    }

    pub fn date_time() -> Self {
        Self::new(PropertyKind::DateTime)
    }

    pub fn float() -> Self {
        Self::new(PropertyKind::Float)
    }

    pub fn integer() -> Self {
        Self::new(PropertyKind::Integer)
    }

    pub fn unique_id() -> Self {
        Self::new(PropertyKind::UniqueId)
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn with_generator(mut self, generator: Generator) -> Self {
        self.generated = Some(generator);
        self
    }

    pub fn with_choices<I, S>(mut self, choices: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.choices = choices.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_help_text(mut self, text: impl Into<String>) -> Self {
        self.help_text = Some(text.into());
        self
    }

    /// The value to store when the caller supplies none.
    pub fn default_value(&self) -> Option<Value> {
        match (&self.default, self.generated) {
            (Some(value), _) => Some(value.clone()),
            (None, Some(generator)) => Some(generator.generate()),
            (None, None) => None,
        }
    }

    /// Whether a read document always carries a value for this property.
    ///
    /// A generated default counts as always present; a fixed default does not
    /// make the field required.
    pub fn is_schema_required(&self) -> bool {
        (self.required && self.default.is_none()) || self.generated.is_some()
    }
}
