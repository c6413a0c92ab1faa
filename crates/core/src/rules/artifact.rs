//! Parsing of the exported rule artifact
//!
//! The artifact is JSON: either a bare array of rows or an object with a
//! `rules` array. Item-set columns accept a JSON array of strings or the
//! `frozenset({'a', 'b'})` literal that tabular exports of mined rules emit.

use std::fs;
use std::path::PathBuf;

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use super::types::{LoadReport, RowRejection, Rule};

/// Where the rule artifact is read from
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RuleSource {
    /// JSON file on disk
    File(PathBuf),
    /// JSON document already in memory
    Inline(String),
}

impl RuleSource {
    pub fn origin(&self) -> String {
        match self {
            Self::File(path) => path.display().to_string(),
            Self::Inline(_) => "inline".to_string(),
        }
    }
}

/// Failure that makes the whole artifact unusable
#[derive(Debug, Error)]
pub enum RuleLoadError {
    #[error("could not read rule artifact `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("rule artifact is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("rule artifact must be an array of rows or an object with a `rules` array")]
    UnexpectedShape,
    #[error("rule artifact row {row} does not match the expected columns: {source}")]
    RowShape { row: usize, source: serde_json::Error },
}

#[derive(Debug, Deserialize)]
struct RuleRow {
    antecedents: ItemSetColumn,
    consequents: ItemSetColumn,
    confidence: f64,
    lift: f64,
    #[serde(default)]
    support: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ItemSetColumn {
    Items(Vec<String>),
    Literal(String),
}

impl ItemSetColumn {
    fn into_items(self) -> Vec<String> {
        match self {
            Self::Items(items) => items,
            Self::Literal(literal) => parse_set_literal(&literal),
        }
    }
}

/// Split `frozenset({'a', 'b'})`, `{'a', 'b'}` or `a, b` into its items.
/// An empty body is the empty set; a blank fragment is kept as `""` so the
/// row fails validation like a blank array entry. Items containing commas
/// cannot be expressed in literal form.
fn parse_set_literal(raw: &str) -> Vec<String> {
    let mut body = raw.trim();
    if let Some(inner) = body.strip_prefix("frozenset(").and_then(|rest| rest.strip_suffix(')')) {
        body = inner.trim();
    }
    if let Some(inner) = body.strip_prefix('{').and_then(|rest| rest.strip_suffix('}')) {
        body = inner;
    }

    if body.trim().is_empty() {
        return Vec::new();
    }

    body.split(',')
        .map(|part| part.trim().trim_matches(|ch: char| ch == '\'' || ch == '"').trim())
        .map(str::to_string)
        .collect()
}

pub(crate) fn read_source(source: &RuleSource) -> Result<String, RuleLoadError> {
    match source {
        RuleSource::File(path) => fs::read_to_string(path)
            .map_err(|source| RuleLoadError::ReadFile { path: path.clone(), source }),
        RuleSource::Inline(document) => Ok(document.clone()),
    }
}

/// Parse an artifact document. Rows with missing or mistyped columns fail
/// the whole document; rows that parse but break a rule invariant are
/// recorded in the report and skipped.
pub(crate) fn parse_rules(
    document: &str,
    origin: String,
) -> Result<(Vec<Rule>, LoadReport), RuleLoadError> {
    let value: Value = serde_json::from_str(document)?;
    let rows = match value {
        Value::Array(rows) => rows,
        Value::Object(mut object) => match object.remove("rules") {
            Some(Value::Array(rows)) => rows,
            _ => return Err(RuleLoadError::UnexpectedShape),
        },
        _ => return Err(RuleLoadError::UnexpectedShape),
    };

    let mut report = LoadReport::new(origin);
    report.rows_read = rows.len();

    let mut rules = Vec::with_capacity(rows.len());
    for (index, row) in rows.into_iter().enumerate() {
        let row: RuleRow = serde_json::from_value(row)
            .map_err(|source| RuleLoadError::RowShape { row: index, source })?;

        let mut rule = Rule::new(
            row.antecedents.into_items(),
            row.consequents.into_items(),
            row.confidence,
            row.lift,
        );
        rule.support = row.support;

        match rule.validate() {
            Ok(()) => rules.push(rule),
            Err(violation) => {
                report.rejected.push(RowRejection { row: index, reason: violation.to_string() })
            }
        }
    }

    report.accepted = rules.len();
    Ok((rules, report))
}
