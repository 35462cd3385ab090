//! Provides a fluent builder for constructing `Select` ASTs.

use crate::query::ast::{
    common::{OrderDir, TableRef},
    expr::Expr,
    select::{FromClause, OrderByExpr, Select},
};

#[derive(Debug, Clone, Default)]
pub struct SelectBuilder {
    ast: Select,
}

impl SelectBuilder {
    pub fn new(columns: Vec<Expr>) -> Self {
        Self {
            ast: Select {
                columns,
                ..Default::default()
            },
        }
    }

    pub fn from(mut self, table: TableRef) -> Self {
        self.ast.from = Some(FromClause { table, alias: None });
        self
    }

    pub fn where_clause(mut self, condition: Expr) -> Self {
        self.ast.where_clause = Some(condition);
        self
    }

    pub fn order_by_asc(mut self, expr: Expr) -> Self {
        self.ast.order_by.push(OrderByExpr {
            expr,
            direction: Some(OrderDir::Asc),
        });
        self
    }

    pub fn limit(mut self, limit: Expr) -> Self {
        self.ast.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: Expr) -> Self {
        self.ast.offset = Some(offset);
        self
    }

    pub fn build(self) -> Select {
        self.ast
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::ident;

    #[test]
    fn test_select_builder() {
        let ast = SelectBuilder::new(vec![ident("id")])
            .from(TableRef::new("shop", "products"))
            .order_by_asc(ident("id"))
            .limit(Expr::Placeholder)
            .build();

        assert_eq!(ast.columns.len(), 1);
        assert_eq!(ast.from.unwrap().table.name, "products");
        assert_eq!(ast.order_by[0].direction, Some(OrderDir::Asc));
        assert_eq!(ast.limit, Some(Expr::Placeholder));
        assert!(ast.offset.is_none());
    }
}
