use crate::query::{
    ast::{
        common::OrderDir,
        select::{FromClause, OrderByExpr, Select},
    },
    renderer::{Render, Renderer},
};

impl Render for Select {
    fn render(&self, r: &mut Renderer) {
        // 1. SELECT clause
        r.sql.push_str("SELECT ");
        for (i, col) in self.columns.iter().enumerate() {
            if i > 0 {
                r.sql.push_str(", ");
            }
            col.render(r);
        }

        // 2. FROM
        if let Some(from) = &self.from {
            r.sql.push(' ');
            from.render(r);
        }

        // 3. WHERE
        if let Some(where_clause) = &self.where_clause {
            r.sql.push_str(" WHERE ");
            where_clause.render(r);
        }

        // 4. ORDER BY
        if !self.order_by.is_empty() {
            r.sql.push_str(" ORDER BY ");
            for (i, order) in self.order_by.iter().enumerate() {
                if i > 0 {
                    r.sql.push_str(", ");
                }
                order.render(r);
            }
        }

        // 5. LIMIT
        if let Some(limit) = &self.limit {
            r.sql.push_str(" LIMIT ");
            limit.render(r);
        }

        // 6. OFFSET
        if let Some(offset) = &self.offset {
            r.sql.push_str(" OFFSET ");
            offset.render(r);
        }
    }
}

impl Render for FromClause {
    fn render(&self, r: &mut Renderer) {
        r.sql.push_str("FROM ");
        r.render_table_ref(&self.table);
        if let Some(alias) = &self.alias {
            r.sql.push_str(" AS ");
            r.sql.push_str(&r.dialect.quote_identifier(alias));
        }
    }
}

impl Render for OrderByExpr {
    fn render(&self, r: &mut Renderer) {
        self.expr.render(r);
        if let Some(dir) = &self.direction {
            let dir_str = match dir {
                OrderDir::Asc => "ASC",
                OrderDir::Desc => "DESC",
            };
            r.sql.push(' ');
            r.sql.push_str(dir_str);
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::query::{
        ast::{
            common::{OrderDir, TableRef},
            select::{FromClause, OrderByExpr, Select},
        },
        dialect::Postgres,
        ident,
        renderer::{Render, Renderer},
        value,
    };
    use model::core::value::Value;

    #[test]
    fn test_paged_select_postgres() {
        let ast = Select {
            columns: vec![ident("id"), ident("email")],
            from: Some(FromClause {
                table: TableRef::new("auth", "users"),
                alias: None,
            }),
            order_by: vec![
                OrderByExpr {
                    expr: ident("created_at"),
                    direction: Some(OrderDir::Asc),
                },
                OrderByExpr {
                    expr: ident("id"),
                    direction: Some(OrderDir::Asc),
                },
            ],
            limit: Some(value(Value::Int(500))),
            offset: Some(value(Value::Int(1000))),
            ..Default::default()
        };

        let dialect = Postgres;
        let mut renderer = Renderer::new(&dialect);
        ast.render(&mut renderer);
        let (sql, params) = renderer.finish();

        assert_eq!(
            sql,
            concat!(
                r#"SELECT "id", "email" FROM "auth"."users" "#,
                r#"ORDER BY "created_at" ASC, "id" ASC LIMIT $1 OFFSET $2"#
            )
        );
        assert_eq!(params, vec![Value::Int(500), Value::Int(1000)]);
    }
}
