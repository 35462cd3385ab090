//! Defines the AST for an INSERT statement.

use crate::query::ast::{common::TableRef, expr::Expr};

/// Represents a complete INSERT statement.
///
/// `values` holds one inner vector per row.
#[derive(Debug, Clone, PartialEq)]
pub struct Insert {
    pub table: TableRef,
    pub columns: Vec<String>,
    pub values: Vec<Vec<Expr>>,
    /// Optional ON CONFLICT clause for handling conflicts.
    pub on_conflict: Option<OnConflict>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OnConflict {
    pub columns: Vec<String>,
    pub action: ConflictAction,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ConflictAction {
    DoNothing,
    DoUpdate {
        assignments: Vec<ConflictAssignment>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConflictAssignment {
    pub column: String,
    pub value: Expr,
}
