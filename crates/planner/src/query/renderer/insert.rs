use crate::query::{
    ast::insert::{ConflictAction, Insert, OnConflict},
    renderer::{Render, Renderer},
};

impl Render for Insert {
    fn render(&self, r: &mut Renderer) {
        // 1. INSERT INTO table (...)
        r.sql.push_str("INSERT INTO ");
        r.render_table_ref(&self.table);
        r.sql.push_str(" (");
        let quoted_columns: Vec<String> = self
            .columns
            .iter()
            .map(|c| r.dialect.quote_identifier(c))
            .collect();
        r.sql.push_str(&quoted_columns.join(", "));
        r.sql.push(')');

        // 2. VALUES (...)
        render_values(self, r);

        if let Some(on_conflict) = &self.on_conflict {
            render_on_conflict(on_conflict, r);
        }
    }
}

fn render_values(insert: &Insert, r: &mut Renderer) {
    r.sql.push_str(" VALUES ");
    for (i, row) in insert.values.iter().enumerate() {
        if i > 0 {
            r.sql.push_str(", ");
        }
        r.sql.push('(');
        for (j, val) in row.iter().enumerate() {
            if j > 0 {
                r.sql.push_str(", ");
            }
            val.render(r);
        }
        r.sql.push(')');
    }
}

fn render_on_conflict(on_conflict: &OnConflict, r: &mut Renderer) {
    if on_conflict.columns.is_empty() {
        return;
    }

    r.sql.push_str(" ON CONFLICT (");
    let quoted: Vec<String> = on_conflict
        .columns
        .iter()
        .map(|c| r.dialect.quote_identifier(c))
        .collect();
    r.sql.push_str(&quoted.join(", "));
    r.sql.push(')');

    match &on_conflict.action {
        ConflictAction::DoNothing => r.sql.push_str(" DO NOTHING"),
        ConflictAction::DoUpdate { assignments } => {
            if assignments.is_empty() {
                r.sql.push_str(" DO NOTHING");
                return;
            }

            r.sql.push_str(" DO UPDATE SET ");
            for (i, assignment) in assignments.iter().enumerate() {
                if i > 0 {
                    r.sql.push_str(", ");
                }
                r.sql
                    .push_str(&r.dialect.quote_identifier(&assignment.column));
                r.sql.push_str(" = ");
                assignment.value.render(r);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::query::{
        ast::{
            common::TableRef,
            expr::Expr,
            insert::{ConflictAction, ConflictAssignment, Insert, OnConflict},
        },
        dialect::Postgres,
        renderer::{Render, Renderer},
        value,
    };
    use model::core::value::Value;

    #[test]
    fn test_render_insert_with_params() {
        let ast = Insert {
            table: TableRef::unqualified("users"),
            columns: vec!["name".to_string(), "is_active".to_string()],
            values: vec![vec![
                value(Value::String("Alice".to_string())),
                value(Value::Boolean(true)),
            ]],
            on_conflict: None,
        };

        let dialect = Postgres;
        let mut renderer = Renderer::new(&dialect);
        ast.render(&mut renderer);
        let (sql, params) = renderer.finish();

        assert_eq!(sql, r#"INSERT INTO "users" ("name", "is_active") VALUES ($1, $2)"#);
        assert_eq!(
            params,
            vec![Value::String("Alice".to_string()), Value::Boolean(true)]
        );
    }

    #[test]
    fn test_render_upsert_with_excluded() {
        let ast = Insert {
            table: TableRef::new("auth", "users"),
            columns: vec!["id".to_string(), "email".to_string()],
            values: vec![vec![Expr::Placeholder, Expr::Placeholder]],
            on_conflict: Some(OnConflict {
                columns: vec!["id".to_string()],
                action: ConflictAction::DoUpdate {
                    assignments: vec![ConflictAssignment {
                        column: "email".to_string(),
                        value: Expr::Excluded("email".to_string()),
                    }],
                },
            }),
        };

        let dialect = Postgres;
        let mut renderer = Renderer::new(&dialect);
        ast.render(&mut renderer);
        let (sql, params) = renderer.finish();

        assert_eq!(
            sql,
            concat!(
                r#"INSERT INTO "auth"."users" ("id", "email") VALUES ($1, $2) "#,
                r#"ON CONFLICT ("id") DO UPDATE SET "email" = EXCLUDED."email""#
            )
        );
        assert!(params.is_empty());
    }

    #[test]
    fn test_empty_assignments_fall_back_to_do_nothing() {
        let ast = Insert {
            table: TableRef::new("auth", "user_roles"),
            columns: vec!["id".to_string()],
            values: vec![vec![Expr::Placeholder]],
            on_conflict: Some(OnConflict {
                columns: vec!["id".to_string()],
                action: ConflictAction::DoUpdate {
                    assignments: vec![],
                },
            }),
        };

        let dialect = Postgres;
        let mut renderer = Renderer::new(&dialect);
        ast.render(&mut renderer);
        let (sql, _) = renderer.finish();

        assert!(sql.ends_with(r#"ON CONFLICT ("id") DO NOTHING"#));
    }
}
