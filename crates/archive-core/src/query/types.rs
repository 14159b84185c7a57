//! Query wire form.

use crate::error::{ArchiveError, Result};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

/// A conjunction of filters, optionally restricted to the newest snapshot of
/// each identifier.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Query {
    #[serde(default)]
    pub latest: bool,
    #[serde(default)]
    pub filters: Vec<Filter>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn latest_only(mut self) -> Self {
        self.latest = true;
        self
    }

    pub fn with_filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }
}

/// What a filter inspects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubjectType {
    #[serde(alias = "sw")]
    Software,
    Property,
}

/// One predicate.
///
/// For software filters `value` is the version; empty matches any version.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Filter {
    pub subject_type: SubjectType,
    pub subject_name: String,
    pub operator: Operator,
    #[serde(default, deserialize_with = "scalar_to_string")]
    pub value: String,
}

impl Filter {
    pub fn software(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            subject_type: SubjectType::Software,
            subject_name: name.into(),
            operator: Operator::Eq,
            value: version.into(),
        }
    }

    pub fn property(name: impl Into<String>, operator: Operator, value: impl Into<String>) -> Self {
        Self {
            subject_type: SubjectType::Property,
            subject_name: name.into(),
            operator,
            value: value.into(),
        }
    }
}

/// Accept string, number or boolean literals; keep their text.
fn scalar_to_string<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        Value::Null => Ok(String::new()),
        other => Err(serde::de::Error::custom(format!(
            "filter value must be a scalar, found {}",
            other
        ))),
    }
}

/// Comparison operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    Lt,
    Le,
    Eq,
    Ge,
    Gt,
    Ne,
}

impl Operator {
    /// SQL spelling.
    pub fn symbol(&self) -> &'static str {
        match self {
            Operator::Lt => "<",
            Operator::Le => "<=",
            Operator::Eq => "=",
            Operator::Ge => ">=",
            Operator::Gt => ">",
            Operator::Ne => "!=",
        }
    }

    pub fn parse(s: &str) -> Result<Self> {
        match s.trim() {
            "<" | "lt" => Ok(Operator::Lt),
            "<=" | "le" | "≤" => Ok(Operator::Le),
            "=" | "==" | "eq" => Ok(Operator::Eq),
            ">=" | "ge" | "≥" => Ok(Operator::Ge),
            ">" | "gt" => Ok(Operator::Gt),
            "!=" | "<>" | "ne" | "≠" => Ok(Operator::Ne),
            other => Err(ArchiveError::invalid_filter(format!(
                "Unknown operator {:?}",
                other
            ))),
        }
    }
}

impl std::fmt::Display for Operator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

impl std::str::FromStr for Operator {
    type Err = ArchiveError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl Serialize for Operator {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.symbol())
    }
}

impl<'de> Deserialize<'de> for Operator {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Operator::parse(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_deserialize_wire_form() {
        let query: Query = serde_json::from_value(json!({
            "latest": true,
            "filters": [
                {"subject_type": "sw", "subject_name": "refmac", "operator": "eq", "value": "5.8"},
                {"subject_type": "property", "subject_name": "RFREE", "operator": "≤", "value": 0.25},
                {"subject_type": "property", "subject_name": "HAS_LIGAND", "operator": "!=", "value": false}
            ]
        }))
        .unwrap();

        assert!(query.latest);
        assert_eq!(query.filters[0], Filter::software("refmac", "5.8"));
        assert_eq!(query.filters[1], Filter::property("RFREE", Operator::Le, "0.25"));
        assert_eq!(query.filters[2].value, "false");
    }

    #[test]
    fn test_rejects_unknown_operator() {
        let result: std::result::Result<Filter, _> = serde_json::from_value(json!({
            "subject_type": "property", "subject_name": "RFREE", "operator": "~", "value": "1"
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_missing_fields_default() {
        let query: Query = serde_json::from_value(json!({})).unwrap();
        assert_eq!(query, Query::new());
    }
}
