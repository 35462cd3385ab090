use crate::spec::rule::{DefaultValue, TransformRule};
use serde::{Deserialize, Serialize};
use std::{collections::HashSet, fmt, str::FromStr};
use thiserror::Error;

/// Schema-qualified table name, e.g. `auth.users`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TableRef {
    #[serde(default)]
    pub schema: Option<String>,
    pub name: String,
}

impl TableRef {
    pub fn new(schema: &str, name: &str) -> Self {
        Self {
            schema: Some(schema.to_string()),
            name: name.to_string(),
        }
    }

    pub fn unqualified(name: &str) -> Self {
        Self {
            schema: None,
            name: name.to_string(),
        }
    }

    pub fn schema_or_public(&self) -> &str {
        self.schema.as_deref().unwrap_or("public")
    }
}

impl fmt::Display for TableRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.schema {
            Some(schema) => write!(f, "{}.{}", schema, self.name),
            None => f.write_str(&self.name),
        }
    }
}

impl FromStr for TableRef {
    type Err = SpecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let parsed = match s.split_once('.') {
            Some((schema, name)) => TableRef::new(schema.trim(), name.trim()),
            None => TableRef::unqualified(s),
        };
        if parsed.name.is_empty() || parsed.schema.as_deref() == Some("") {
            return Err(SpecError::InvalidTableName(s.to_string()));
        }
        Ok(parsed)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceQuery {
    pub table: TableRef,
    /// Primary ordering column; the primary key breaks ties.
    #[serde(default)]
    pub sort_key: Option<String>,
}

/// Where a destination column gets its value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnSource {
    Column(String),
    Default(DefaultValue),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnSpec {
    /// Destination column name.
    pub name: String,
    pub source: ColumnSource,
    #[serde(default)]
    pub rules: Vec<TransformRule>,
}

impl ColumnSpec {
    pub fn passthrough(name: &str) -> Self {
        Self {
            name: name.to_string(),
            source: ColumnSource::Column(name.to_string()),
            rules: Vec::new(),
        }
    }

    pub fn renamed(source: &str, destination: &str) -> Self {
        Self {
            name: destination.to_string(),
            source: ColumnSource::Column(source.to_string()),
            rules: Vec::new(),
        }
    }

    pub fn default_value(name: &str, default: DefaultValue) -> Self {
        Self {
            name: name.to_string(),
            source: ColumnSource::Default(default),
            rules: Vec::new(),
        }
    }

    pub fn rule(mut self, rule: TransformRule) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn source_column(&self) -> Option<&str> {
        match &self.source {
            ColumnSource::Column(c) => Some(c),
            ColumnSource::Default(_) => None,
        }
    }
}

/// Columns never overwritten when the destination row already exists.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConflictPolicy {
    #[serde(default)]
    pub preserve: Vec<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WriteMode {
    /// `INSERT .. ON CONFLICT (pk) DO UPDATE`.
    #[default]
    Upsert,
    /// Rows whose key already exists in the destination are left alone.
    SkipExisting,
}

/// Declarative description of how one entity is copied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableSpec {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub source: SourceQuery,
    pub destination: TableRef,
    pub primary_key: Vec<String>,
    pub columns: Vec<ColumnSpec>,
    #[serde(default)]
    pub conflict: ConflictPolicy,
    #[serde(default)]
    pub mode: WriteMode,
    #[serde(default)]
    pub row_label: Vec<String>,
}

#[derive(Debug, Error, PartialEq)]
pub enum SpecError {
    #[error("Invalid table name: '{0}'")]
    InvalidTableName(String),

    #[error("Table spec '{0}' has no columns")]
    NoColumns(String),

    #[error("Table spec '{0}' has no primary key")]
    NoPrimaryKey(String),

    #[error("Table spec '{spec}': primary key column '{column}' is not mapped from a source column")]
    PrimaryKeyNotSourced { spec: String, column: String },

    #[error("Table spec '{spec}': duplicate destination column '{column}'")]
    DuplicateColumn { spec: String, column: String },

    #[error("Table spec '{spec}': preserved column '{column}' is not a destination column")]
    UnknownPreservedColumn { spec: String, column: String },
}

impl TableSpec {
    pub fn new(name: &str, source: TableRef, destination: TableRef) -> Self {
        Self {
            name: name.to_string(),
            description: String::new(),
            source: SourceQuery {
                table: source,
                sort_key: None,
            },
            destination,
            primary_key: Vec::new(),
            columns: Vec::new(),
            conflict: ConflictPolicy::default(),
            mode: WriteMode::Upsert,
            row_label: Vec::new(),
        }
    }

    pub fn describe(mut self, description: &str) -> Self {
        self.description = description.to_string();
        self
    }

    pub fn primary_key(mut self, columns: &[&str]) -> Self {
        self.primary_key = columns.iter().map(|c| c.to_string()).collect();
        self
    }

    pub fn sort_by(mut self, column: &str) -> Self {
        self.source.sort_key = Some(column.to_string());
        self
    }

    pub fn passthrough(mut self, columns: &[&str]) -> Self {
        self.columns
            .extend(columns.iter().map(|c| ColumnSpec::passthrough(c)));
        self
    }

    pub fn column(mut self, column: ColumnSpec) -> Self {
        self.columns.push(column);
        self
    }

    /// Attaches `rule` to every listed destination column.
    pub fn with_rule(mut self, columns: &[&str], rule: TransformRule) -> Self {
        for column in self.columns.iter_mut() {
            if columns.iter().any(|c| c.eq_ignore_ascii_case(&column.name)) {
                column.rules.push(rule.clone());
            }
        }
        self
    }

    pub fn preserve(mut self, columns: &[&str]) -> Self {
        self.conflict
            .preserve
            .extend(columns.iter().map(|c| c.to_string()));
        self
    }

    pub fn label(mut self, columns: &[&str]) -> Self {
        self.row_label = columns.iter().map(|c| c.to_string()).collect();
        self
    }

    pub fn mode(mut self, mode: WriteMode) -> Self {
        self.mode = mode;
        self
    }

    /// Distinct source columns read by this spec, in declaration order.
    pub fn source_columns(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        self.columns
            .iter()
            .filter_map(ColumnSpec::source_column)
            .filter(|c| seen.insert(c.to_ascii_lowercase()))
            .map(str::to_string)
            .collect()
    }

    pub fn destination_columns(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    /// Columns rewritten on conflict: every non-key, non-preserved column.
    pub fn update_columns(&self) -> Vec<String> {
        self.columns
            .iter()
            .map(|c| c.name.as_str())
            .filter(|name| !self.is_primary_key(name) && !self.is_preserved(name))
            .map(str::to_string)
            .collect()
    }

    /// Source-side names of the primary-key columns.
    pub fn source_key_columns(&self) -> Vec<String> {
        self.primary_key
            .iter()
            .filter_map(|pk| {
                self.columns
                    .iter()
                    .find(|c| c.name.eq_ignore_ascii_case(pk))
                    .and_then(ColumnSpec::source_column)
                    .map(str::to_string)
            })
            .collect()
    }

    /// Source-side ordering: sort key first, then the key columns.
    pub fn order_columns(&self) -> Vec<String> {
        let mut order = Vec::new();
        if let Some(sort) = &self.source.sort_key {
            order.push(sort.clone());
        }
        for pk in self.source_key_columns() {
            if !order.iter().any(|c| c.eq_ignore_ascii_case(&pk)) {
                order.push(pk);
            }
        }
        order
    }

    pub fn is_primary_key(&self, column: &str) -> bool {
        self.primary_key
            .iter()
            .any(|pk| pk.eq_ignore_ascii_case(column))
    }

    pub fn is_preserved(&self, column: &str) -> bool {
        self.conflict
            .preserve
            .iter()
            .any(|p| p.eq_ignore_ascii_case(column))
    }

    pub fn validate(&self) -> Result<(), SpecError> {
        if self.columns.is_empty() {
            return Err(SpecError::NoColumns(self.name.clone()));
        }
        if self.primary_key.is_empty() {
            return Err(SpecError::NoPrimaryKey(self.name.clone()));
        }

        let mut seen = HashSet::new();
        for column in &self.columns {
            if !seen.insert(column.name.to_ascii_lowercase()) {
                return Err(SpecError::DuplicateColumn {
                    spec: self.name.clone(),
                    column: column.name.clone(),
                });
            }
        }

        for pk in &self.primary_key {
            let sourced = self
                .columns
                .iter()
                .find(|c| c.name.eq_ignore_ascii_case(pk))
                .is_some_and(|c| c.source_column().is_some());
            if !sourced {
                return Err(SpecError::PrimaryKeyNotSourced {
                    spec: self.name.clone(),
                    column: pk.clone(),
                });
            }
        }

        for preserved in &self.conflict.preserve {
            if !seen.contains(&preserved.to_ascii_lowercase()) {
                return Err(SpecError::UnknownPreservedColumn {
                    spec: self.name.clone(),
                    column: preserved.clone(),
                });
            }
        }

        Ok(())
    }
}
