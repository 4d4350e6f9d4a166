//! Job description files and the query text derived from them.

use crate::error::{MatchError, Result};
use serde_json::Value;
use std::fs;
use std::path::Path;

/// A job description record; only ever used as a transient query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobDescription {
    pub title: String,
    pub description: String,
    pub requirements: String,
}

impl JobDescription {
    pub fn from_path(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path).map_err(|e| {
            MatchError::InvalidQueryFormat(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_json_str(&raw)
    }

    pub fn from_json_str(raw: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(raw)
            .map_err(|e| MatchError::InvalidQueryFormat(format!("malformed JSON: {e}")))?;
        let obj = value.as_object().ok_or_else(|| {
            MatchError::InvalidQueryFormat("expected a JSON object".to_string())
        })?;
        let field = |name: &str| -> Result<String> {
            match obj.get(name) {
                Some(Value::String(s)) => Ok(s.clone()),
                Some(Value::Array(items)) => items
                    .iter()
                    .map(|v| {
                        v.as_str().map(str::to_string).ok_or_else(|| {
                            MatchError::InvalidQueryFormat(format!(
                                "field `{name}` must contain only strings"
                            ))
                        })
                    })
                    .collect::<Result<Vec<_>>>()
                    .map(|parts| parts.join(" ")),
                Some(_) => Err(MatchError::InvalidQueryFormat(format!(
                    "field `{name}` must be a string or a list of strings"
                ))),
                None => Err(MatchError::InvalidQueryFormat(format!(
                    "missing field `{name}`"
                ))),
            }
        };
        Ok(Self {
            title: field("title")?,
            description: field("description")?,
            requirements: field("requirements")?,
        })
    }

    pub fn query_text(&self) -> String {
        format!("{} {} {}", self.title, self.description, self.requirements)
    }
}
