//! Provides a fluent builder for constructing `Insert` ASTs.

use crate::query::ast::{
    common::TableRef,
    expr::Expr,
    insert::{ConflictAction, ConflictAssignment, Insert, OnConflict},
};

#[derive(Debug, Clone)]
pub struct InsertBuilder {
    ast: Insert,
}

impl InsertBuilder {
    pub fn new(table: TableRef) -> Self {
        Self {
            ast: Insert {
                table,
                columns: Vec::new(),
                values: Vec::new(),
                on_conflict: None,
            },
        }
    }

    pub fn columns(mut self, columns: &[String]) -> Self {
        self.ast.columns = columns.to_vec();
        self
    }

    /// Adds a row of values to the insert statement.
    pub fn values(mut self, values: Vec<Expr>) -> Self {
        self.ast.values.push(values);
        self
    }

    /// `ON CONFLICT (keys) DO UPDATE SET col = EXCLUDED.col` for each of `update`.
    pub fn on_conflict_update(mut self, keys: &[String], update: &[String]) -> Self {
        let assignments = update
            .iter()
            .map(|column| ConflictAssignment {
                column: column.clone(),
                value: Expr::Excluded(column.clone()),
            })
            .collect();
        self.ast.on_conflict = Some(OnConflict {
            columns: keys.to_vec(),
            action: ConflictAction::DoUpdate { assignments },
        });
        self
    }

    pub fn on_conflict_do_nothing(mut self, keys: &[String]) -> Self {
        self.ast.on_conflict = Some(OnConflict {
            columns: keys.to_vec(),
            action: ConflictAction::DoNothing,
        });
        self
    }

    pub fn build(self) -> Insert {
        self.ast
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_upsert() {
        let ast = InsertBuilder::new(TableRef::new("auth", "users"))
            .columns(&["id".into(), "email".into()])
            .values(vec![Expr::Placeholder, Expr::Placeholder])
            .on_conflict_update(&["id".into()], &["email".into()])
            .build();

        assert_eq!(ast.values[0].len(), 2);
        let on_conflict = ast.on_conflict.unwrap();
        assert_eq!(on_conflict.columns, vec!["id"]);
        assert_eq!(
            on_conflict.action,
            ConflictAction::DoUpdate {
                assignments: vec![ConflictAssignment {
                    column: "email".into(),
                    value: Expr::Excluded("email".into()),
                }]
            }
        );
    }
}
