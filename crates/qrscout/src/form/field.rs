//! Field definitions and values.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// The kind of input a field collects.
///
/// Unknown type names are kept verbatim in [`FieldType::Other`] so a
/// document written by a newer form editor survives an import/export cycle.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FieldType {
    /// Free text.
    Text,
    /// A number typed in by the scout.
    Number,
    /// One of an enumerated set of choices.
    Select,
    /// A checkbox.
    Boolean,
    /// A number driven by increment/decrement buttons.
    Counter,
    /// A number picked from a slider.
    Range,
    /// Elapsed seconds from a stopwatch.
    Timer,
    /// A static image; carries no meaningful value.
    Image,
    /// A type this crate does not know about.
    Other(String),
}

impl FieldType {
    /// The type name as it appears in a form document.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Text => "text",
            Self::Number => "number",
            Self::Select => "select",
            Self::Boolean => "boolean",
            Self::Counter => "counter",
            Self::Range => "range",
            Self::Timer => "timer",
            Self::Image => "image",
            Self::Other(name) => name,
        }
    }

    /// Whether values of this type are numeric.
    #[must_use]
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            Self::Number | Self::Counter | Self::Range | Self::Timer
        )
    }
}

impl From<String> for FieldType {
    fn from(name: String) -> Self {
        match name.as_str() {
            "text" => Self::Text,
            "number" => Self::Number,
            "select" => Self::Select,
            "boolean" => Self::Boolean,
            "counter" => Self::Counter,
            "range" => Self::Range,
            "timer" => Self::Timer,
            "image" => Self::Image,
            _ => Self::Other(name),
        }
    }
}

impl From<FieldType> for String {
    fn from(kind: FieldType) -> Self {
        match kind {
            FieldType::Other(name) => name,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A concrete field value.
///
/// An unset value is represented by `None` wherever a field value is
/// optional; JSON `null` deserializes to `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// A boolean.
    Bool(bool),
    /// A JSON number, integer or float.
    Number(serde_json::Number),
    /// A string.
    Text(String),
}

impl FieldValue {
    /// Convert a scalar JSON value. Returns `None` for null, arrays and objects.
    #[must_use]
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::Bool(b) => Some(Self::Bool(*b)),
            serde_json::Value::Number(n) => Some(Self::Number(n.clone())),
            serde_json::Value::String(s) => Some(Self::Text(s.clone())),
            _ => None,
        }
    }

    /// Parse user input into the value domain of `kind`.
    ///
    /// Blank input clears the field and yields `Ok(None)`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidValue`] if the input is not a number for a
    /// numeric field or not a recognised boolean for a boolean field.
    pub fn parse_as(kind: &FieldType, input: &str) -> Result<Option<Self>> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Ok(None);
        }

        let invalid = || Error::InvalidValue {
            kind: kind.to_string(),
            input: input.to_string(),
        };

        let value = if kind.is_numeric() {
            if let Ok(int) = trimmed.parse::<i64>() {
                Self::Number(int.into())
            } else {
                let float = trimmed.parse::<f64>().map_err(|_| invalid())?;
                Self::Number(serde_json::Number::from_f64(float).ok_or_else(invalid)?)
            }
        } else if *kind == FieldType::Boolean {
            match trimmed.to_ascii_lowercase().as_str() {
                "true" | "yes" | "y" | "1" => Self::Bool(true),
                "false" | "no" | "n" | "0" => Self::Bool(false),
                _ => return Err(invalid()),
            }
        } else {
            Self::Text(input.to_string())
        };

        Ok(Some(value))
    }

    /// Whether this value counts as empty for the required-field gate.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        matches!(self, Self::Text(s) if s.is_empty())
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<bool> for FieldValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i64> for FieldValue {
    fn from(n: i64) -> Self {
        Self::Number(n.into())
    }
}

impl From<u32> for FieldValue {
    fn from(n: u32) -> Self {
        Self::Number(n.into())
    }
}

/// Where a field's current value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Provenance {
    /// The scout may edit the value.
    #[default]
    Editable,
    /// The value was supplied by a leader station and must not be hand-edited.
    Locked,
}

/// One input definition plus its current value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    /// Human label, also the column header in exports.
    pub title: String,

    /// Input kind.
    #[serde(rename = "type")]
    pub kind: FieldType,

    /// Whether an unset value blocks committing the record.
    #[serde(default)]
    pub required: bool,

    /// Identifier, unique across the whole form.
    pub code: String,

    /// Value → label mapping for select fields.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub choices: Option<BTreeMap<String, String>>,

    /// Value restored on load and on reset.
    #[serde(
        rename = "defaultValue",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub default_value: Option<FieldValue>,

    /// Lower bound hint for numeric inputs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,

    /// Current value. Never written to a form document.
    #[serde(default, skip_serializing)]
    pub value: Option<FieldValue>,

    /// Whether the current value may be hand-edited.
    #[serde(skip)]
    pub provenance: Provenance,

    /// Document keys this crate does not interpret (e.g. `max`, `step`).
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl Field {
    /// Create an optional, editable field with no default.
    #[must_use]
    pub fn new(code: impl Into<String>, title: impl Into<String>, kind: FieldType) -> Self {
        Self {
            title: title.into(),
            kind,
            required: false,
            code: code.into(),
            choices: None,
            default_value: None,
            min: None,
            value: None,
            provenance: Provenance::Editable,
            extra: BTreeMap::new(),
        }
    }

    /// Mark the field as required.
    #[must_use]
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Set the default value.
    #[must_use]
    pub fn with_default(mut self, value: impl Into<FieldValue>) -> Self {
        self.default_value = Some(value.into());
        self
    }

    /// Set the choices of a select field.
    #[must_use]
    pub fn with_choices<I, K, V>(mut self, choices: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.choices = Some(
            choices
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        );
        self
    }

    /// Set the numeric lower bound.
    #[must_use]
    pub fn with_min(mut self, min: f64) -> Self {
        self.min = Some(min);
        self
    }

    /// Whether this field blocks a commit: required and unset or empty.
    #[must_use]
    pub fn is_missing(&self) -> bool {
        self.required && self.value.as_ref().map_or(true, FieldValue::is_blank)
    }

    /// Whether the value came from a leader station.
    #[must_use]
    pub fn is_locked(&self) -> bool {
        self.provenance == Provenance::Locked
    }

    /// Restore the default value.
    pub fn reset(&mut self) {
        self.value.clone_from(&self.default_value);
    }

    /// Parse `input` for this field's type.
    ///
    /// # Errors
    ///
    /// See [`FieldValue::parse_as`].
    pub fn parse_input(&self, input: &str) -> Result<Option<FieldValue>> {
        FieldValue::parse_as(&self.kind, input)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_type_round_trips_unknown_names() {
        let kind: FieldType = serde_json::from_str("\"multi-select\"").unwrap();
        assert_eq!(kind, FieldType::Other("multi-select".to_string()));
        assert_eq!(serde_json::to_string(&kind).unwrap(), "\"multi-select\"");
    }

    #[test]
    fn test_field_type_known_names() {
        let kind: FieldType = serde_json::from_str("\"counter\"").unwrap();
        assert_eq!(kind, FieldType::Counter);
        assert!(kind.is_numeric());
        assert!(!FieldType::Select.is_numeric());
        assert_eq!(FieldType::Boolean.to_string(), "boolean");
    }

    #[test]
    fn test_field_value_display() {
        assert_eq!(FieldValue::from(5_i64).to_string(), "5");
        assert_eq!(FieldValue::from(true).to_string(), "true");
        assert_eq!(FieldValue::from("r2").to_string(), "r2");
        let float: FieldValue = serde_json::from_str("2.5").unwrap();
        assert_eq!(float.to_string(), "2.5");
    }

    #[test]
    fn test_field_value_untagged_deserialize() {
        let v: FieldValue = serde_json::from_str("12").unwrap();
        assert_eq!(v, FieldValue::from(12_i64));
        let v: FieldValue = serde_json::from_str("false").unwrap();
        assert_eq!(v, FieldValue::Bool(false));
        let v: FieldValue = serde_json::from_str("\"S\"").unwrap();
        assert_eq!(v, FieldValue::from("S"));
    }

    #[test]
    fn test_from_json_rejects_compound_values() {
        assert!(FieldValue::from_json(&serde_json::json!(null)).is_none());
        assert!(FieldValue::from_json(&serde_json::json!([1])).is_none());
        assert!(FieldValue::from_json(&serde_json::json!({"a": 1})).is_none());
        assert_eq!(
            FieldValue::from_json(&serde_json::json!(3)),
            Some(FieldValue::from(3_i64))
        );
    }

    #[test]
    fn test_parse_as_number() {
        let v = FieldValue::parse_as(&FieldType::Number, "42").unwrap();
        assert_eq!(v, Some(FieldValue::from(42_i64)));

        let v = FieldValue::parse_as(&FieldType::Timer, "3.5").unwrap();
        assert_eq!(v.unwrap().to_string(), "3.5");

        let err = FieldValue::parse_as(&FieldType::Counter, "lots").unwrap_err();
        assert!(matches!(err, Error::InvalidValue { .. }));
    }

    #[test]
    fn test_parse_as_boolean() {
        assert_eq!(
            FieldValue::parse_as(&FieldType::Boolean, "Yes").unwrap(),
            Some(FieldValue::Bool(true))
        );
        assert_eq!(
            FieldValue::parse_as(&FieldType::Boolean, "0").unwrap(),
            Some(FieldValue::Bool(false))
        );
        assert!(FieldValue::parse_as(&FieldType::Boolean, "maybe").is_err());
    }

    #[test]
    fn test_parse_as_blank_clears() {
        assert_eq!(FieldValue::parse_as(&FieldType::Number, "  ").unwrap(), None);
        assert_eq!(FieldValue::parse_as(&FieldType::Text, "").unwrap(), None);
    }

    #[test]
    fn test_parse_as_text_keeps_input() {
        let v = FieldValue::parse_as(&FieldType::Text, " fast bot ").unwrap();
        assert_eq!(v, Some(FieldValue::from(" fast bot ")));
    }

    #[test]
    fn test_is_missing() {
        let mut field = Field::new("scouter", "Scouter ID", FieldType::Text).required();
        assert!(field.is_missing());

        field.value = Some(FieldValue::from(""));
        assert!(field.is_missing());

        field.value = Some(FieldValue::from("abc"));
        assert!(!field.is_missing());

        let optional = Field::new("comments", "Comments", FieldType::Text);
        assert!(!optional.is_missing());
    }

    #[test]
    fn test_zero_and_false_are_not_missing() {
        let mut field = Field::new("auto", "Auto", FieldType::Boolean).required();
        field.value = Some(FieldValue::Bool(false));
        assert!(!field.is_missing());

        field.value = Some(FieldValue::from(0_i64));
        assert!(!field.is_missing());
    }

    #[test]
    fn test_reset_restores_default() {
        let mut field = Field::new("cones", "Cones", FieldType::Counter).with_default(0_i64);
        field.value = Some(FieldValue::from(7_i64));
        field.reset();
        assert_eq!(field.value, Some(FieldValue::from(0_i64)));
    }

    #[test]
    fn test_field_serialization_omits_value_and_provenance() {
        let mut field = Field::new("matchNumber", "Match Number", FieldType::Number)
            .required()
            .with_min(0.0);
        field.value = Some(FieldValue::from(9_i64));
        field.provenance = Provenance::Locked;

        let json = serde_json::to_value(&field).unwrap();
        assert_eq!(json["type"], "number");
        assert_eq!(json["code"], "matchNumber");
        assert!(json.get("value").is_none());
        assert!(json.get("provenance").is_none());
        assert!(json.get("choices").is_none());
    }

    #[test]
    fn test_field_keeps_unknown_keys() {
        let json = r#"{"title":"Speed","type":"range","code":"speed","min":1,"max":5,"step":1}"#;
        let field: Field = serde_json::from_str(json).unwrap();
        assert_eq!(field.kind, FieldType::Range);
        assert_eq!(field.min, Some(1.0));
        assert_eq!(field.extra.get("max"), Some(&serde_json::json!(5)));

        let out = serde_json::to_value(&field).unwrap();
        assert_eq!(out["step"], 1);
    }

    #[test]
    fn test_field_deserialize_reads_value_key() {
        let json = r#"{"title":"T","type":"text","code":"t","value":"stale"}"#;
        let field: Field = serde_json::from_str(json).unwrap();
        assert_eq!(field.value, Some(FieldValue::from("stale")));
        assert!(field.extra.is_empty());
    }
}
