use crate::transform::{
    context::TransformContext,
    error::TransformError,
    mapping::{FieldMapper, KeyGuard, RuleApplier},
    pipeline::{TransformPipeline, TransformPipelineExt},
};
use model::{records::row::RowData, spec::table::TableSpec};

pub mod context;
pub mod error;
pub mod mapping;
pub mod pipeline;
pub mod rules;

/// A transformed row plus the warnings its rules raised.
#[derive(Debug, Clone, PartialEq)]
pub struct Transformed {
    pub row: RowData,
    pub warnings: Vec<String>,
}

/// Stateless source-row to destination-row mapping for one table spec.
#[derive(Clone)]
pub struct RecordTransformer {
    pipeline: TransformPipeline,
}

impl RecordTransformer {
    pub fn for_spec(spec: &TableSpec, ctx: &TransformContext) -> Self {
        let pipeline = TransformPipeline::new()
            .add_transform(FieldMapper::new(spec, ctx.clone()))
            .add_if(RuleApplier::has_rules(spec), || {
                RuleApplier::new(spec, ctx.clone())
            })
            .add_transform(KeyGuard::new(spec));
        Self { pipeline }
    }

    pub fn transform(&self, row: &RowData) -> Result<Transformed, TransformError> {
        let mut warnings = Vec::new();
        let row = self.pipeline.apply(row.clone(), &mut warnings)?;
        Ok(Transformed { row, warnings })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use engine_config::catalog::builtin;
    use model::{core::value::Value, records::row::FieldValue};
    use serde_json::json;

    fn storage(path: &str) -> String {
        format!("https://ylooqmqmoufqtxvetxuj.supabase.co/storage/v1/object/public/{path}")
    }

    fn row(entity: &str, fields: &[(&str, Value)]) -> RowData {
        RowData::new(
            entity,
            fields
                .iter()
                .map(|(name, value)| FieldValue::new(*name, value.clone()))
                .collect(),
        )
    }

    fn shop_row() -> RowData {
        let spec = builtin::artisan_shops();
        let mut source = row("artisan_shops", &[]);
        for column in spec.source_columns() {
            source.set(&column, Value::Null);
        }
        source.set("id", Value::from("7f0c"));
        source.set("shop_name", Value::from("Tejidos Ana"));
        source.set("logo_url", Value::from(storage("shops/logo.png")));
        source.set("banner_url", Value::from("https://cdn.example.com/banner.png"));
        source.set("contact_info", Value::from(""));
        source.set("social_links", Value::from("{broken"));
        source.set("seo_data", Value::Json(json!({"title": "Ana"})));
        source.set(
            "hero_config",
            Value::Json(json!({"slides": [{"imageUrl": storage("hero/1.png")}]})),
        );
        source.set("bank_data_status", Value::from("pending"));
        source
    }

    #[test]
    fn shops_are_mapped_and_rewritten() {
        let spec = builtin::artisan_shops();
        let transformer = RecordTransformer::for_spec(&spec, &TransformContext::default());

        let out = transformer.transform(&shop_row()).unwrap();
        let dest = &out.row;

        assert_eq!(dest.field_values.len(), spec.columns.len());
        assert_eq!(dest.get_value("logo_url"), Value::from("/shops/logo.png"));
        assert_eq!(
            dest.get_value("banner_url"),
            Value::from("https://cdn.example.com/banner.png")
        );
        assert_eq!(dest.get_value("contact_info"), Value::Null);
        assert_eq!(dest.get_value("social_links"), Value::Null);
        assert_eq!(dest.get_value("seo_data"), Value::Json(json!({"title": "Ana"})));
        assert_eq!(
            dest.get_value("hero_config"),
            Value::Json(json!({"slides": [{"imageUrl": "/hero/1.png"}]}))
        );
        assert_eq!(dest.get_value("bank_data_status"), Value::from("complete"));
        assert_eq!(dest.get_value("servientrega_coverage"), Value::Boolean(false));

        assert_eq!(out.warnings.len(), 1);
        assert!(out.warnings[0].starts_with("social_links: invalid JSON"));
    }

    #[test]
    fn null_bank_status_becomes_not_set() {
        let spec = builtin::artisan_shops();
        let transformer = RecordTransformer::for_spec(&spec, &TransformContext::default());
        let mut source = shop_row();
        source.set("bank_data_status", Value::Null);

        let out = transformer.transform(&source).unwrap();
        assert_eq!(out.row.get_value("bank_data_status"), Value::from("not_set"));
    }

    #[test]
    fn missing_source_column_fails_the_row() {
        let spec = builtin::user_roles();
        let transformer = RecordTransformer::for_spec(&spec, &TransformContext::default());
        let source = row("user_roles", &[("id", Value::from("r1")), ("user_id", Value::from("u1"))]);

        let err = transformer.transform(&source).unwrap_err();
        assert_eq!(
            err,
            TransformError::MissingSourceColumn {
                column: "role".into(),
                destination: "role".into()
            }
        );
    }

    #[test]
    fn null_primary_key_fails_the_row() {
        let spec = builtin::user_roles();
        let transformer = RecordTransformer::for_spec(&spec, &TransformContext::default());
        let source = row(
            "user_roles",
            &[
                ("id", Value::Null),
                ("user_id", Value::from("u1")),
                ("role", Value::from("artisan")),
                ("created_at", Value::Null),
            ],
        );

        assert_eq!(
            transformer.transform(&source).unwrap_err(),
            TransformError::NullPrimaryKey("id".into())
        );
    }

    #[test]
    fn renamed_columns_read_their_source() {
        use model::spec::table::{ColumnSpec, TableRef};

        let spec = TableSpec::new("tags", TableRef::new("public", "tags"), TableRef::new("shop", "tags"))
            .primary_key(&["id"])
            .passthrough(&["id"])
            .column(ColumnSpec::renamed("name", "label"));
        let transformer = RecordTransformer::for_spec(&spec, &TransformContext::default());

        let out = transformer
            .transform(&row("tags", &[("id", Value::Int(1)), ("name", Value::from("wool"))]))
            .unwrap();
        assert_eq!(out.row.get_value("label"), Value::from("wool"));
        assert!(!out.row.contains("name"));
    }
}
