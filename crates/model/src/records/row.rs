use crate::core::value::Value;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FieldValue {
    pub name: String,
    pub value: Value,
}

impl FieldValue {
    pub fn new(name: impl Into<String>, value: Value) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}

/// One row of one entity, in column order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RowData {
    pub entity: String,
    pub field_values: Vec<FieldValue>,
}

/// Primary-key tuple of a row, in primary-key column order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RowKey(pub Vec<Value>);

impl RowData {
    pub fn new(entity: &str, field_values: Vec<FieldValue>) -> Self {
        RowData {
            entity: entity.to_string(),
            field_values,
        }
    }

    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.field_values
            .iter()
            .find(|f| f.name.eq_ignore_ascii_case(field))
    }

    pub fn get_value(&self, field: &str) -> Value {
        self.get(field)
            .map(|f| f.value.clone())
            .unwrap_or(Value::Null)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.get(field).is_some()
    }

    /// Replaces the value of `field`, appending it when absent.
    pub fn set(&mut self, field: &str, value: Value) {
        match self
            .field_values
            .iter_mut()
            .find(|f| f.name.eq_ignore_ascii_case(field))
        {
            Some(existing) => existing.value = value,
            None => self.field_values.push(FieldValue::new(field, value)),
        }
    }

    /// Builds the key tuple for `columns`; absent columns become `Null`.
    pub fn key(&self, columns: &[String]) -> RowKey {
        RowKey(columns.iter().map(|c| self.get_value(c)).collect())
    }

    /// Human-readable identifier: the first non-empty of `columns`.
    pub fn label(&self, columns: &[String]) -> Option<String> {
        columns
            .iter()
            .filter_map(|c| self.get_value(c).to_text())
            .find(|text| !text.trim().is_empty())
    }
}

impl RowKey {
    /// Text-normalized key, so a source `uuid` matches a destination `text`
    /// or enum column holding the same value.
    pub fn normalized(&self) -> RowKey {
        RowKey(
            self.0
                .iter()
                .map(|v| v.to_text().map(Value::String).unwrap_or(Value::Null))
                .collect(),
        )
    }
}

impl std::fmt::Display for RowKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let parts = self.0.iter().map(|v| v.to_string()).collect::<Vec<_>>();
        f.write_str(&parts.join(","))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user_row() -> RowData {
        RowData::new(
            "users",
            vec![
                FieldValue::new("id", Value::from("b3c1")),
                FieldValue::new("email", Value::from("")),
                FieldValue::new("phone", Value::Null),
            ],
        )
    }

    #[test]
    fn label_skips_empty_and_null_columns() {
        let row = user_row();
        let label = row.label(&["email".into(), "phone".into(), "id".into()]);
        assert_eq!(label.as_deref(), Some("b3c1"));
    }

    #[test]
    fn set_replaces_case_insensitively() {
        let mut row = user_row();
        row.set("EMAIL", Value::from("ana@example.com"));
        assert_eq!(row.field_values.len(), 3);
        assert_eq!(row.get_value("email"), Value::from("ana@example.com"));

        row.set("version", Value::Int(1));
        assert_eq!(row.field_values.len(), 4);
    }

    #[test]
    fn missing_key_columns_become_null() {
        let row = user_row();
        let key = row.key(&["id".into(), "tenant".into()]);
        assert_eq!(key, RowKey(vec![Value::from("b3c1"), Value::Null]));
    }

    #[test]
    fn normalized_keys_compare_by_text() {
        let id = uuid::Uuid::nil();
        let typed = RowKey(vec![Value::Uuid(id)]);
        let text = RowKey(vec![Value::String(id.to_string())]);
        assert_ne!(typed, text);
        assert_eq!(typed.normalized(), text.normalized());
    }
}
