//! SQL statements the migrator issues for one `TableSpec`.

use crate::query::{
    ast::{common::TableRef, expr::Expr},
    builder::{insert::InsertBuilder, select::SelectBuilder},
    dialect::Dialect,
    ident,
    renderer::{Render, Renderer},
    value,
};
use model::{
    core::value::Value,
    spec::table::{TableSpec, WriteMode},
};
use std::collections::HashSet;

pub struct TableStatements<'a> {
    spec: &'a TableSpec,
    dialect: &'a dyn Dialect,
}

impl<'a> TableStatements<'a> {
    pub fn new(spec: &'a TableSpec, dialect: &'a dyn Dialect) -> Self {
        Self { spec, dialect }
    }

    /// `SELECT COUNT(*) FROM <source>`
    pub fn count(&self) -> String {
        let ast = SelectBuilder::new(vec![Expr::count_star()])
            .from(self.spec.source.table.clone())
            .build();
        self.render(&ast).0
    }

    /// Source projection with no rows; used to learn the column types.
    pub fn describe_source(&self) -> String {
        let ast = SelectBuilder::new(self.source_projection(&HashSet::new()))
            .from(self.spec.source.table.clone())
            .limit(Expr::Literal("0".to_string()))
            .build();
        self.render(&ast).0
    }

    /// One page of the source in deterministic order.
    /// Binds `$1 = limit`, `$2 = offset`.
    ///
    /// Columns named in `as_text` (lower-cased) are selected as `::text`.
    pub fn select_page(&self, as_text: &HashSet<String>) -> String {
        let mut builder = SelectBuilder::new(self.source_projection(as_text))
            .from(self.spec.source.table.clone());
        for column in self.spec.order_columns() {
            builder = builder.order_by_asc(ident(&column));
        }
        let ast = builder
            .limit(Expr::Placeholder)
            .offset(Expr::Placeholder)
            .build();
        self.render(&ast).0
    }

    /// Key columns of every destination row.
    pub fn select_destination_keys(&self) -> String {
        let columns = self.spec.primary_key.iter().map(|c| ident(c)).collect();
        let ast = SelectBuilder::new(columns)
            .from(self.spec.destination.clone())
            .build();
        self.render(&ast).0
    }

    /// Upsert of one destination row; one placeholder per destination column.
    ///
    /// `casts[i]`, when set, wraps the i-th placeholder as
    /// `CAST(CAST($n AS text) AS <type>)` for types with no native binding.
    pub fn upsert(&self, casts: &[Option<String>]) -> String {
        let columns = self.spec.destination_columns();
        let slots = (0..columns.len())
            .map(|i| match casts.get(i).and_then(Option::as_ref) {
                Some(data_type) => Expr::Placeholder.cast("text").cast(data_type),
                None => Expr::Placeholder,
            })
            .collect();

        let builder = InsertBuilder::new(self.spec.destination.clone())
            .columns(&columns)
            .values(slots);
        let builder = match self.spec.mode {
            WriteMode::Upsert => {
                builder.on_conflict_update(&self.spec.primary_key, &self.spec.update_columns())
            }
            WriteMode::SkipExisting => builder.on_conflict_do_nothing(&self.spec.primary_key),
        };
        self.render(&builder.build()).0
    }

    /// Existence probe; binds `$1 = schema`, `$2 = table`.
    pub fn table_exists(table: &TableRef, dialect: &dyn Dialect) -> (String, Vec<Value>) {
        let ast = SelectBuilder::new(vec![Expr::Literal("1".to_string()).alias("present")])
            .from(TableRef::new("pg_catalog", "pg_tables"))
            .where_clause(Expr::and(
                Expr::eq(ident("schemaname"), value(Value::from(table.schema_or_public()))),
                Expr::eq(ident("tablename"), value(Value::from(table.name.as_str()))),
            ))
            .build();
        let mut renderer = Renderer::new(dialect);
        ast.render(&mut renderer);
        renderer.finish()
    }

    fn source_projection(&self, as_text: &HashSet<String>) -> Vec<Expr> {
        self.spec
            .source_columns()
            .iter()
            .map(|column| {
                if as_text.contains(&column.to_ascii_lowercase()) {
                    ident(column).cast("text").alias(column)
                } else {
                    ident(column)
                }
            })
            .collect()
    }

    fn render(&self, node: &dyn Render) -> (String, Vec<Value>) {
        let mut renderer = Renderer::new(self.dialect);
        node.render(&mut renderer);
        renderer.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::dialect::Postgres;
    use model::spec::table::{ColumnSpec, TableRef};

    fn users() -> TableSpec {
        TableSpec::new(
            "users",
            TableRef::new("auth", "users"),
            TableRef::new("auth", "users"),
        )
        .primary_key(&["id"])
        .sort_by("created_at")
        .passthrough(&["id", "email", "role", "created_at"])
        .preserve(&["created_at"])
    }

    #[test]
    fn count_targets_source_table() {
        let spec = users();
        let stmts = TableStatements::new(&spec, &Postgres);
        assert_eq!(stmts.count(), r#"SELECT COUNT(*) FROM "auth"."users""#);
    }

    #[test]
    fn page_orders_by_sort_key_then_pk_and_casts_text_columns() {
        let spec = users();
        let stmts = TableStatements::new(&spec, &Postgres);
        let as_text = HashSet::from(["role".to_string()]);
        assert_eq!(
            stmts.select_page(&as_text),
            concat!(
                r#"SELECT "id", "email", CAST("role" AS text) AS "role", "created_at" "#,
                r#"FROM "auth"."users" ORDER BY "created_at" ASC, "id" ASC LIMIT $1 OFFSET $2"#
            )
        );
    }

    #[test]
    fn describe_source_selects_no_rows() {
        let spec = users();
        let stmts = TableStatements::new(&spec, &Postgres);
        assert_eq!(
            stmts.describe_source(),
            r#"SELECT "id", "email", "role", "created_at" FROM "auth"."users" LIMIT 0"#
        );
    }

    #[test]
    fn upsert_skips_key_and_preserved_columns() {
        let spec = users();
        let stmts = TableStatements::new(&spec, &Postgres);
        assert_eq!(
            stmts.upsert(&[None, None, Some(r#""auth"."app_role""#.into()), None]),
            concat!(
                r#"INSERT INTO "auth"."users" ("id", "email", "role", "created_at") "#,
                r#"VALUES ($1, $2, CAST(CAST($3 AS text) AS "auth"."app_role"), $4) "#,
                r#"ON CONFLICT ("id") DO UPDATE SET "email" = EXCLUDED."email", "role" = EXCLUDED."role""#
            )
        );
    }

    #[test]
    fn skip_existing_mode_never_updates() {
        let spec = users().mode(WriteMode::SkipExisting);
        let stmts = TableStatements::new(&spec, &Postgres);
        assert!(stmts.upsert(&[]).ends_with(r#"ON CONFLICT ("id") DO NOTHING"#));
    }

    #[test]
    fn renamed_columns_select_source_names() {
        let spec = TableSpec::new(
            "profiles",
            TableRef::new("public", "user_profiles"),
            TableRef::new("artesanos", "user_profiles"),
        )
        .column(ColumnSpec::renamed("uid", "id"))
        .primary_key(&["id"]);
        let stmts = TableStatements::new(&spec, &Postgres);
        assert!(stmts.select_page(&HashSet::new()).contains(r#"ORDER BY "uid" ASC"#));
        assert_eq!(
            stmts.select_destination_keys(),
            r#"SELECT "id" FROM "artesanos"."user_profiles""#
        );
    }

    #[test]
    fn table_exists_binds_schema_and_name() {
        let (sql, params) =
            TableStatements::table_exists(&TableRef::new("shop", "products"), &Postgres);
        assert_eq!(
            sql,
            concat!(
                r#"SELECT 1 AS "present" FROM "pg_catalog"."pg_tables" "#,
                r#"WHERE (("schemaname" = $1) AND ("tablename" = $2))"#
            )
        );
        assert_eq!(params, vec![Value::from("shop"), Value::from("products")]);
    }
}
