//! Field descriptors: the declarative unit behind one answer slot.

use std::fmt;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// A single answer value. Whole numbers stay integers so they round-trip
/// through JSON unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
}

impl Scalar {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Whether the value counts as "filled in" for selection purposes.
    pub fn is_truthy(&self) -> bool {
        match self {
            Self::Bool(b) => *b,
            Self::Integer(n) => *n != 0,
            Self::Float(n) => *n != 0.0,
            Self::Text(s) => !s.is_empty(),
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Integer(n) => write!(f, "{n}"),
            Self::Float(n) => write!(f, "{n}"),
            Self::Text(s) => write!(f, "{s}"),
        }
    }
}

impl From<bool> for Scalar {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for Scalar {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<f64> for Scalar {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for Scalar {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for Scalar {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

/// The value held by a field: one scalar, or an ordered sequence of scalars
/// for multi-valued fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Many(Vec<Scalar>),
    Single(Scalar),
}

impl FieldValue {
    pub fn is_many(&self) -> bool {
        matches!(self, Self::Many(_))
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Single(s) => s.as_bool(),
            Self::Many(_) => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Single(s) => s.as_str(),
            Self::Many(_) => None,
        }
    }

    pub fn is_truthy(&self) -> bool {
        match self {
            Self::Single(s) => s.is_truthy(),
            Self::Many(items) => !items.is_empty(),
        }
    }

    /// Whether a required field holding this value counts as unanswered.
    pub fn is_blank(&self) -> bool {
        match self {
            Self::Single(Scalar::Text(s)) => s.trim().is_empty(),
            Self::Single(_) => false,
            Self::Many(items) => items.is_empty(),
        }
    }

    /// Human-readable shape name, used in error messages.
    pub fn shape_name(multi_value: bool) -> &'static str {
        if multi_value { "sequence" } else { "scalar" }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Single(s) => write!(f, "{s}"),
            Self::Many(items) => {
                let parts: Vec<String> = items.iter().map(ToString::to_string).collect();
                write!(f, "{}", parts.join(", "))
            }
        }
    }
}

impl From<Scalar> for FieldValue {
    fn from(value: Scalar) -> Self {
        Self::Single(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        Self::Single(Scalar::Bool(value))
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        Self::Single(Scalar::Integer(value))
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        Self::Single(Scalar::Float(value))
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::Single(Scalar::Text(value.to_string()))
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::Single(Scalar::Text(value))
    }
}

/// Which input widget a renderer should use. Opaque to the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputKind {
    TextField,
    TextArea,
    Radio,
    SelectableCell,
    PrincipalId,
}

/// Pure value transform applied before a value is accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Normalizer {
    Trim,
    Lowercase,
}

impl Normalizer {
    pub fn apply(&self, value: &FieldValue) -> FieldValue {
        match value {
            FieldValue::Single(s) => FieldValue::Single(self.apply_scalar(s)),
            FieldValue::Many(items) => {
                FieldValue::Many(items.iter().map(|s| self.apply_scalar(s)).collect())
            }
        }
    }

    fn apply_scalar(&self, scalar: &Scalar) -> Scalar {
        match (self, scalar) {
            (Self::Trim, Scalar::Text(s)) => Scalar::Text(s.trim().to_string()),
            (Self::Lowercase, Scalar::Text(s)) => Scalar::Text(s.to_lowercase()),
            (_, other) => other.clone(),
        }
    }
}

/// A validation rule attached to a field. Rules only look at text values.
#[derive(Debug, Clone)]
pub enum ValidationRule {
    Pattern { regex: Regex, message: String },
    MaxLength { max: usize, message: String },
}

impl ValidationRule {
    /// Build a pattern rule. Fails on an invalid regex.
    pub fn pattern(pattern: &str, message: impl Into<String>) -> Result<Self, regex::Error> {
        Ok(Self::Pattern {
            regex: Regex::new(pattern)?,
            message: message.into(),
        })
    }

    pub fn max_length(max: usize, message: impl Into<String>) -> Self {
        Self::MaxLength {
            max,
            message: message.into(),
        }
    }

    fn check(&self, text: &str) -> Option<&str> {
        match self {
            Self::Pattern { regex, message } if !regex.is_match(text) => Some(message.as_str()),
            Self::MaxLength { max, message } if text.chars().count() > *max => {
                Some(message.as_str())
            }
            _ => None,
        }
    }
}

/// Declarative description of one answerable input.
#[derive(Debug, Clone)]
pub struct FieldDescriptor {
    pub default_value: FieldValue,
    pub multi_value: bool,
    pub input_kind: InputKind,
    pub label: Option<String>,
    pub required: bool,
    pub help: Option<String>,
    pub tooltip: Option<String>,
    /// Choices offered by radio inputs.
    pub options: Vec<Scalar>,
    pub rules: Vec<ValidationRule>,
    pub normalize: Option<Normalizer>,
}

impl FieldDescriptor {
    /// A single-valued field.
    pub fn single(default_value: impl Into<Scalar>, input_kind: InputKind) -> Self {
        Self::with_default(FieldValue::Single(default_value.into()), false, input_kind)
    }

    /// A multi-valued field.
    pub fn multi(default_values: Vec<Scalar>, input_kind: InputKind) -> Self {
        Self::with_default(FieldValue::Many(default_values), true, input_kind)
    }

    fn with_default(default_value: FieldValue, multi_value: bool, input_kind: InputKind) -> Self {
        Self {
            default_value,
            multi_value,
            input_kind,
            label: None,
            required: false,
            help: None,
            tooltip: None,
            options: Vec::new(),
            rules: Vec::new(),
            normalize: None,
        }
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    pub fn tooltip(mut self, tooltip: impl Into<String>) -> Self {
        self.tooltip = Some(tooltip.into());
        self
    }

    pub fn options(mut self, options: Vec<Scalar>) -> Self {
        self.options = options;
        self
    }

    pub fn rule(mut self, rule: ValidationRule) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn normalize(mut self, normalizer: Normalizer) -> Self {
        self.normalize = Some(normalizer);
        self
    }

    /// The label to show for this field, falling back to its name.
    pub fn display_label<'a>(&'a self, name: &'a str) -> &'a str {
        self.label.as_deref().unwrap_or(name)
    }

    /// Whether `value` has the shape this field declares.
    pub fn accepts_shape(&self, value: &FieldValue) -> bool {
        value.is_many() == self.multi_value
    }

    /// Apply the field's normalizer, if any.
    pub fn normalized(&self, value: &FieldValue) -> FieldValue {
        match self.normalize {
            Some(n) => n.apply(value),
            None => value.clone(),
        }
    }

    /// Check `value` against `required` and the validation rules, returning
    /// one message per failure.
    pub fn validate(&self, name: &str, value: &FieldValue) -> Vec<String> {
        let label = self.display_label(name);
        if value.is_blank() {
            return if self.required {
                vec![format!("{label} is required")]
            } else {
                Vec::new()
            };
        }

        let texts: Vec<&str> = match value {
            FieldValue::Single(s) => s.as_str().into_iter().collect(),
            FieldValue::Many(items) => items.iter().filter_map(Scalar::as_str).collect(),
        };

        let mut errors = Vec::new();
        for text in texts {
            for rule in &self.rules {
                if let Some(message) = rule.check(text) {
                    errors.push(message.to_string());
                }
            }
        }
        errors
    }
}
