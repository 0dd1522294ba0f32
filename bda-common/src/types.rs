// Copyright 2025 BDA Contributors
// Licensed under the Apache License, Version 2.0

//! Common type definitions shared by the query service and the engine

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque identifier of one submitted query execution.
///
/// Issued by the query service and returned to callers verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QueryHandle(String);

impl QueryHandle {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for QueryHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Execution state as reported by the query service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QueryState {
    Queued,
    Running,
    Succeeded,
    Failed,
    Cancelled,
}

impl fmt::Display for QueryState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            QueryState::Queued => "QUEUED",
            QueryState::Running => "RUNNING",
            QueryState::Succeeded => "SUCCEEDED",
            QueryState::Failed => "FAILED",
            QueryState::Cancelled => "CANCELLED",
        };
        f.write_str(name)
    }
}

/// Column metadata of a result set
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDescriptor {
    pub name: String,
    /// Declared type as spelled by the service (`varchar`, `bigint`, ...)
    pub data_type: String,
}

impl ColumnDescriptor {
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
        }
    }
}

/// One undecoded row; `None` marks a cell without a textual value
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawRow {
    pub cells: Vec<Option<String>>,
}

impl RawRow {
    pub fn new(cells: Vec<Option<String>>) -> Self {
        Self { cells }
    }

    /// Build a row where every cell carries text
    pub fn from_texts<I, S>(texts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            cells: texts.into_iter().map(|t| Some(t.into())).collect(),
        }
    }

    pub fn cell(&self, index: usize) -> Option<&str> {
        self.cells.get(index).and_then(|c| c.as_deref())
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

/// One page of query results.
///
/// A present `next_token` means more pages remain.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ResultPage {
    #[serde(default)]
    pub columns: Vec<ColumnDescriptor>,
    #[serde(default)]
    pub rows: Vec<RawRow>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_token: Option<String>,
}

impl ResultPage {
    pub fn new(columns: Vec<ColumnDescriptor>, rows: Vec<RawRow>) -> Self {
        Self {
            columns,
            rows,
            next_token: None,
        }
    }

    pub fn with_next_token(mut self, token: impl Into<String>) -> Self {
        self.next_token = Some(token.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_row_cells() {
        let row = RawRow::new(vec![Some("1".to_string()), None]);
        assert_eq!(row.cell(0), Some("1"));
        assert_eq!(row.cell(1), None);
        assert_eq!(row.cell(5), None);
        assert_eq!(row.len(), 2);
    }

    #[test]
    fn query_state_display() {
        assert_eq!(QueryState::Succeeded.to_string(), "SUCCEEDED");
        assert_eq!(QueryHandle::new("q-1").to_string(), "q-1");
    }
}
