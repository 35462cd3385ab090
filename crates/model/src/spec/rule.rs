use crate::core::value::Value;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A named, pure value transformation applied to one destination column.
///
/// Rules are total: input outside their domain maps to a safe default
/// (usually `NULL`) and a warning, never to an error.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum TransformRule {
    /// Normalizes JSON text/values; empty or unparseable input becomes `NULL`.
    JsonSanitize,

    /// Rewrites a storage-host URL to a destination-relative path.
    AssetUrl { prefix: String },

    /// Rewrites asset URLs nested inside a JSON payload.
    NestedAssets(NestedAssetFields),

    /// Table-driven value substitution.
    EnumRemap {
        mapping: BTreeMap<String, String>,
        #[serde(default)]
        fallback: Option<String>,
    },
}

/// Where asset URLs live inside a JSON payload.
///
/// A payload that is itself an array is treated as a list of URLs.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct NestedAssetFields {
    pub prefix: String,
    /// Object keys holding a single URL.
    #[serde(default)]
    pub single: Vec<String>,
    /// Object keys holding an array of URLs.
    #[serde(default)]
    pub arrays: Vec<String>,
    /// Object keys holding an array of objects, each with a URL field.
    #[serde(default)]
    pub object_lists: Vec<ObjectListField>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ObjectListField {
    pub list: String,
    pub field: String,
}

/// Value for a destination column that has no source counterpart.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum DefaultValue {
    Constant(Value),
    /// Wall-clock time at transform.
    Now,
    /// First value of a counter column, e.g. a row version.
    Counter(i64),
}

impl TransformRule {
    pub fn name(&self) -> &'static str {
        match self {
            TransformRule::JsonSanitize => "json_sanitize",
            TransformRule::AssetUrl { .. } => "asset_url",
            TransformRule::NestedAssets(_) => "nested_assets",
            TransformRule::EnumRemap { .. } => "enum_remap",
        }
    }

    pub fn asset_url(prefix: &str) -> Self {
        TransformRule::AssetUrl {
            prefix: prefix.to_string(),
        }
    }

    pub fn enum_remap(pairs: &[(&str, &str)], fallback: Option<&str>) -> Self {
        TransformRule::EnumRemap {
            mapping: pairs
                .iter()
                .map(|(from, to)| (from.to_string(), to.to_string()))
                .collect(),
            fallback: fallback.map(str::to_string),
        }
    }
}

impl NestedAssetFields {
    pub fn new(prefix: &str) -> Self {
        Self {
            prefix: prefix.to_string(),
            ..Default::default()
        }
    }

    pub fn single(mut self, key: &str) -> Self {
        self.single.push(key.to_string());
        self
    }

    pub fn array(mut self, key: &str) -> Self {
        self.arrays.push(key.to_string());
        self
    }

    pub fn object_list(mut self, list: &str, field: &str) -> Self {
        self.object_lists.push(ObjectListField {
            list: list.to_string(),
            field: field.to_string(),
        });
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rules_deserialize_from_tagged_json() {
        let json = r#"[
            {"rule": "json_sanitize"},
            {"rule": "asset_url", "prefix": "/images/"},
            {"rule": "nested_assets", "prefix": "/", "arrays": ["familyPhotos"]},
            {"rule": "enum_remap", "mapping": {"pending": "complete"}, "fallback": "not_set"}
        ]"#;

        let rules: Vec<TransformRule> = serde_json::from_str(json).unwrap();
        assert_eq!(rules[0], TransformRule::JsonSanitize);
        assert_eq!(rules[1], TransformRule::asset_url("/images/"));
        assert_eq!(
            rules[2],
            TransformRule::NestedAssets(NestedAssetFields::new("/").array("familyPhotos"))
        );
        assert_eq!(
            rules[3],
            TransformRule::enum_remap(&[("pending", "complete")], Some("not_set"))
        );
    }

    #[test]
    fn defaults_deserialize_with_kind_tag() {
        let json = r#"[
            {"kind": "constant", "value": {"Boolean": false}},
            {"kind": "counter", "value": 1},
            {"kind": "now"}
        ]"#;
        let defaults: Vec<DefaultValue> = serde_json::from_str(json).unwrap();
        assert_eq!(defaults[0], DefaultValue::Constant(Value::Boolean(false)));
        assert_eq!(defaults[1], DefaultValue::Counter(1));
        assert_eq!(defaults[2], DefaultValue::Now);
    }
}
