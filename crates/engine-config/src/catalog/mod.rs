use crate::catalog::error::CatalogError;
use model::spec::table::TableSpec;
use serde::{Deserialize, Serialize};
use std::{collections::HashSet, path::Path};
use tracing::info;

pub mod builtin;
pub mod error;

/// Ordered set of table specs. Order is dependency order and is the
/// order tables run in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    tables: Vec<TableSpec>,
}

impl Catalog {
    pub fn new(tables: Vec<TableSpec>) -> Result<Self, CatalogError> {
        if tables.is_empty() {
            return Err(CatalogError::Empty);
        }

        let mut seen = HashSet::new();
        for spec in &tables {
            spec.validate()?;
            if !seen.insert(normalize(&spec.name)) {
                return Err(CatalogError::DuplicateSpec(spec.name.clone()));
            }
        }

        Ok(Self { tables })
    }

    pub fn builtin() -> Self {
        Self {
            tables: builtin::specs(),
        }
    }

    /// Parses `{"tables": [...]}`.
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let parsed: Catalog = serde_json::from_str(json)?;
        Self::new(parsed.tables)
    }

    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let json = std::fs::read_to_string(path).map_err(|source| CatalogError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let catalog = Self::from_json(&json)?;
        info!(path = %path.display(), tables = catalog.len(), "Loaded catalog");
        Ok(catalog)
    }

    pub fn to_json(&self) -> Result<String, CatalogError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn tables(&self) -> &[TableSpec] {
        &self.tables
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    pub fn names(&self) -> Vec<&str> {
        self.tables.iter().map(|t| t.name.as_str()).collect()
    }

    /// Looks up a spec by name; `user-profiles` and `USER_PROFILES` both
    /// match `user_profiles`.
    pub fn get(&self, name: &str) -> Result<&TableSpec, CatalogError> {
        let wanted = normalize(name);
        self.tables
            .iter()
            .find(|t| normalize(&t.name) == wanted)
            .ok_or_else(|| self.unknown(name))
    }

    /// Restricts the catalog to `names`, keeping catalog order regardless
    /// of the order the names were given in.
    pub fn only(&self, names: &[String]) -> Result<Catalog, CatalogError> {
        let mut wanted = HashSet::new();
        for name in names.iter().map(|n| n.trim()).filter(|n| !n.is_empty()) {
            wanted.insert(normalize(&self.get(name)?.name));
        }

        let tables: Vec<TableSpec> = self
            .tables
            .iter()
            .filter(|t| wanted.contains(&normalize(&t.name)))
            .cloned()
            .collect();
        if tables.is_empty() {
            return Err(CatalogError::Empty);
        }
        Ok(Catalog { tables })
    }

    fn unknown(&self, name: &str) -> CatalogError {
        CatalogError::UnknownTable {
            name: name.to_string(),
            available: self.names().join(", "),
        }
    }
}

fn normalize(name: &str) -> String {
    name.trim().to_ascii_lowercase().replace('-', "_")
}
