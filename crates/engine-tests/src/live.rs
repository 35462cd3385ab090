//! Runs against a real Postgres. Both ends point at the same database,
//! using separate schemas. Set the `*_DB` variables and run with
//! `cargo test -- --ignored`.

#[cfg(test)]
mod tests {
    use crate::live_pg_config;
    use connectors::sql::{base::adapter::SqlAdapter, postgres::adapter::PgAdapter};
    use engine_core::reporter::MemoryReporter;
    use engine_runtime::{connection::PgConnectionProvider, orchestrator::Orchestrator};
    use model::{
        core::value::Value,
        spec::{
            rule::TransformRule,
            table::{TableRef, TableSpec},
        },
    };
    use std::sync::Arc;
    use tracing_test::traced_test;

    const SETUP: &str = r#"
        DROP SCHEMA IF EXISTS live_src CASCADE;
        DROP SCHEMA IF EXISTS live_dst CASCADE;
        CREATE SCHEMA live_src;
        CREATE SCHEMA live_dst;
        CREATE TABLE live_src.tags (
            id uuid PRIMARY KEY,
            name text NOT NULL,
            meta text,
            created_at timestamptz NOT NULL
        );
        CREATE TABLE live_dst.tags (
            id uuid PRIMARY KEY,
            name varchar(12) NOT NULL,
            meta jsonb,
            created_at timestamptz NOT NULL
        );
        INSERT INTO live_src.tags VALUES
            ('00000000-0000-0000-0000-000000000001', 'ceramica', '{"color":"rojo"}', '2024-01-01'),
            ('00000000-0000-0000-0000-000000000002', 'a name that is far too long', NULL, '2024-01-02'),
            ('00000000-0000-0000-0000-000000000003', 'tejido', '', '2024-01-03');
        INSERT INTO live_dst.tags VALUES
            ('00000000-0000-0000-0000-000000000001', 'viejo', NULL, '2020-01-01');
    "#;

    fn tags() -> TableSpec {
        TableSpec::new(
            "tags",
            TableRef::new("live_src", "tags"),
            TableRef::new("live_dst", "tags"),
        )
        .primary_key(&["id"])
        .sort_by("created_at")
        .passthrough(&["id", "name", "meta", "created_at"])
        .with_rule(&["meta"], TransformRule::JsonSanitize)
        .preserve(&["created_at"])
        .label(&["name", "id"])
    }

    // Scenario: three source rows, one too long for the destination column,
    // one already present in the destination.
    // Expected Outcome:
    // - two rows succeed and the long name fails on its own
    // - the existing row is updated but keeps its creation date
    #[traced_test]
    #[tokio::test]
    #[ignore]
    async fn live_postgres_upsert() {
        let Some(config) = live_pg_config() else {
            return;
        };
        let admin = PgAdapter::connect(&config).await.expect("connect postgres");
        admin.exec(SETUP).await.expect("set up schemas");

        let orchestrator = Orchestrator::new(
            Arc::new(PgConnectionProvider::new(config.clone(), config.clone())),
            Arc::new(MemoryReporter::new()),
            crate::utils::settings(false),
        );
        let report = orchestrator.run_one(&tags()).await.expect("run tags");

        let result = report.outcomes[0].result.as_ref().unwrap();
        assert_eq!((result.total, result.succeeded, result.failed), (3, 2, 1));
        assert_eq!(result.failures[0].row_id, "a name that is far too long");

        let rows = admin
            .query_rows(
                "SELECT name, meta::text AS meta, created_at::date::text AS created FROM live_dst.tags ORDER BY id",
                Vec::new(),
            )
            .await
            .expect("read destination");
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].get_value("name"), Value::from("ceramica"));
        assert_eq!(rows[0].get_value("created"), Value::from("2020-01-01"));
        assert_eq!(rows[0].get_value("meta"), Value::from(r#"{"color": "rojo"}"#));
        assert_eq!(rows[1].get_value("meta"), Value::Null);
    }
}
