use crate::transform::{
    context::TransformContext, error::TransformError, pipeline::Transform, rules,
};
use model::{
    records::row::{FieldValue, RowData},
    spec::{
        rule::TransformRule,
        table::{ColumnSource, ColumnSpec, TableSpec},
    },
};

/// Builds the destination-shaped row: one field per destination column, in
/// declaration order, read from its source column or filled from a default.
pub struct FieldMapper {
    entity: String,
    columns: Vec<ColumnSpec>,
    ctx: TransformContext,
}

impl FieldMapper {
    pub fn new(spec: &TableSpec, ctx: TransformContext) -> Self {
        Self {
            entity: spec.name.clone(),
            columns: spec.columns.clone(),
            ctx,
        }
    }
}

impl Transform for FieldMapper {
    fn apply(&self, row: RowData, _warnings: &mut Vec<String>) -> Result<RowData, TransformError> {
        let fields = self
            .columns
            .iter()
            .map(|column| {
                let value = match &column.source {
                    ColumnSource::Column(source) => row
                        .get(source)
                        .map(|f| f.value.clone())
                        .ok_or_else(|| TransformError::MissingSourceColumn {
                            column: source.clone(),
                            destination: column.name.clone(),
                        })?,
                    ColumnSource::Default(default) => rules::default_value(default, &self.ctx),
                };
                Ok(FieldValue::new(column.name.clone(), value))
            })
            .collect::<Result<Vec<_>, TransformError>>()?;

        Ok(RowData::new(&self.entity, fields))
    }
}

/// Runs each column's rules, in order, over a destination-shaped row.
pub struct RuleApplier {
    rules: Vec<(String, Vec<TransformRule>)>,
    ctx: TransformContext,
}

impl RuleApplier {
    pub fn new(spec: &TableSpec, ctx: TransformContext) -> Self {
        Self {
            rules: spec
                .columns
                .iter()
                .filter(|c| !c.rules.is_empty())
                .map(|c| (c.name.clone(), c.rules.clone()))
                .collect(),
            ctx,
        }
    }

    pub fn has_rules(spec: &TableSpec) -> bool {
        spec.columns.iter().any(|c| !c.rules.is_empty())
    }
}

impl Transform for RuleApplier {
    fn apply(&self, mut row: RowData, warnings: &mut Vec<String>) -> Result<RowData, TransformError> {
        for (column, column_rules) in &self.rules {
            let mut value = row.get_value(column);
            for rule in column_rules {
                let before = warnings.len();
                value = rules::apply(rule, value, &self.ctx, warnings);
                for warning in warnings.iter_mut().skip(before) {
                    *warning = format!("{column}: {warning}");
                }
            }
            row.set(column, value);
        }
        Ok(row)
    }
}

/// Rejects rows whose primary key came out `NULL`.
pub struct KeyGuard {
    primary_key: Vec<String>,
}

impl KeyGuard {
    pub fn new(spec: &TableSpec) -> Self {
        Self {
            primary_key: spec.primary_key.clone(),
        }
    }
}

impl Transform for KeyGuard {
    fn apply(&self, row: RowData, _warnings: &mut Vec<String>) -> Result<RowData, TransformError> {
        if let Some(column) = self.primary_key.iter().find(|pk| row.get_value(pk).is_null()) {
            return Err(TransformError::NullPrimaryKey(column.clone()));
        }
        Ok(row)
    }
}
