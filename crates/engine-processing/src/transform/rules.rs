//! Column-level rules. Every rule is total: bad input becomes a safe value
//! (usually `NULL`) plus a warning pushed onto `warnings`.

use crate::transform::context::TransformContext;
use model::{
    core::value::Value,
    spec::rule::{DefaultValue, NestedAssetFields, TransformRule},
};
use serde_json::Value as Json;
use std::collections::BTreeMap;
use tracing::debug;

const PUBLIC_OBJECT_MARKER: &str = "/storage/v1/object/public/";

pub fn apply(
    rule: &TransformRule,
    value: Value,
    ctx: &TransformContext,
    warnings: &mut Vec<String>,
) -> Value {
    match rule {
        TransformRule::JsonSanitize => sanitize_json(value, warnings),
        TransformRule::AssetUrl { prefix } => {
            rewrite_asset_url(value, prefix, &ctx.storage_host, warnings)
        }
        TransformRule::NestedAssets(fields) => {
            rewrite_nested_assets(value, fields, &ctx.storage_host, warnings)
        }
        TransformRule::EnumRemap { mapping, fallback } => {
            remap_enum(value, mapping, fallback.as_deref())
        }
    }
}

pub fn default_value(default: &DefaultValue, ctx: &TransformContext) -> Value {
    match default {
        DefaultValue::Constant(value) => value.clone(),
        DefaultValue::Now => Value::Timestamp(ctx.now()),
        DefaultValue::Counter(start) => Value::Int(*start),
    }
}

/// `NULL` and empty text become `NULL`; JSON text is parsed; structured
/// values are kept. A JSON string holding JSON text (double-encoded) is
/// decoded one level.
pub fn sanitize_json(value: Value, warnings: &mut Vec<String>) -> Value {
    let text = match value {
        Value::Null => return Value::Null,
        Value::String(s) => s,
        Value::Json(Json::Null) => return Value::Null,
        Value::Json(Json::String(s)) => s,
        Value::Json(json) => return Value::Json(json),
        Value::StringArray(items) => return Value::Json(Json::from(items)),
        other => {
            return match to_json(&other) {
                Some(json) => Value::Json(json),
                None => {
                    warnings.push(format!("{} value is not JSON-serializable; using NULL", other.kind()));
                    Value::Null
                }
            };
        }
    };

    if text.trim().is_empty() {
        return Value::Null;
    }

    match serde_json::from_str::<Json>(&text) {
        Ok(Json::Null) => Value::Null,
        Ok(json) => Value::Json(json),
        Err(err) => {
            warnings.push(format!("invalid JSON ({err}); using NULL"));
            Value::Null
        }
    }
}

fn to_json(value: &Value) -> Option<Json> {
    match value {
        Value::SmallInt(v) => Some(Json::from(*v)),
        Value::Int32(v) => Some(Json::from(*v)),
        Value::Int(v) => Some(Json::from(*v)),
        Value::Float(v) => serde_json::Number::from_f64(*v).map(Json::Number),
        Value::Boolean(v) => Some(Json::Bool(*v)),
        Value::Bytes(_) => None,
        other => other.to_text().map(Json::String),
    }
}

/// Result of rewriting one URL.
#[derive(Debug, PartialEq)]
enum UrlRewrite {
    Rewritten(String),
    /// Not on the storage host; kept verbatim.
    External,
    /// On the storage host but not a public-object URL.
    Malformed,
    Empty,
}

fn rewrite_url(url: &str, prefix: &str, storage_host: &str) -> UrlRewrite {
    if url.trim().is_empty() {
        return UrlRewrite::Empty;
    }
    if !url.contains(storage_host) {
        return UrlRewrite::External;
    }
    match url.find(PUBLIC_OBJECT_MARKER) {
        Some(idx) => {
            let path = &url[idx + PUBLIC_OBJECT_MARKER.len()..];
            if path.is_empty() {
                UrlRewrite::Malformed
            } else {
                UrlRewrite::Rewritten(format!("{prefix}{path}"))
            }
        }
        None => UrlRewrite::Malformed,
    }
}

/// Rewrites one URL to a JSON value, `null` when it cannot be kept.
fn rewrite_url_json(url: &str, prefix: &str, storage_host: &str, warnings: &mut Vec<String>) -> Json {
    match rewrite_url(url, prefix, storage_host) {
        UrlRewrite::Rewritten(path) => Json::String(path),
        UrlRewrite::External => {
            debug!(url, "Keeping external URL");
            Json::String(url.to_string())
        }
        UrlRewrite::Malformed => {
            warnings.push(format!("unrecognized storage URL '{url}'; using NULL"));
            Json::Null
        }
        UrlRewrite::Empty => Json::Null,
    }
}

/// Maps `https://<host>/storage/v1/object/public/<path>` to `<prefix><path>`.
pub fn rewrite_asset_url(
    value: Value,
    prefix: &str,
    storage_host: &str,
    warnings: &mut Vec<String>,
) -> Value {
    let url = match &value {
        Value::String(s) => s.as_str(),
        Value::Json(Json::String(s)) => s.as_str(),
        _ => return value,
    };

    match rewrite_url_json(url, prefix, storage_host, warnings) {
        Json::String(s) => Value::String(s),
        _ => Value::Null,
    }
}

/// Rewrites URLs inside a JSON payload. A top-level array is treated as a
/// list of URLs; objects are rewritten at the keys named in `fields`.
/// Text that does not parse is kept as-is.
pub fn rewrite_nested_assets(
    value: Value,
    fields: &NestedAssetFields,
    storage_host: &str,
    warnings: &mut Vec<String>,
) -> Value {
    let mut json = match &value {
        Value::Null => return Value::Null,
        Value::Json(json) => json.clone(),
        Value::String(text) => match serde_json::from_str::<Json>(text) {
            Ok(json) => json,
            Err(_) => {
                debug!("Nested asset payload is not JSON; keeping it unchanged");
                return value;
            }
        },
        _ => return value,
    };

    let prefix = fields.prefix.as_str();
    match &mut json {
        Json::Array(items) => rewrite_url_list(items, prefix, storage_host, warnings),
        Json::Object(object) => {
            for entry in &fields.object_lists {
                if let Some(Json::Array(list)) = object.get_mut(&entry.list) {
                    for item in list.iter_mut() {
                        if let Json::Object(item) = item {
                            let rewritten = match item.get(&entry.field) {
                                Some(Json::String(url)) => {
                                    rewrite_url_json(url, prefix, storage_host, warnings)
                                }
                                Some(Json::Null) | None => Json::Null,
                                Some(other) => other.clone(),
                            };
                            item.insert(entry.field.clone(), rewritten);
                        }
                    }
                }
            }

            for key in &fields.single {
                if let Some(slot) = object.get_mut(key)
                    && let Json::String(url) = &*slot
                    && !url.is_empty()
                {
                    *slot = rewrite_url_json(url, prefix, storage_host, warnings);
                }
            }

            for key in &fields.arrays {
                if let Some(Json::Array(items)) = object.get_mut(key) {
                    rewrite_url_list(items, prefix, storage_host, warnings);
                }
            }
        }
        _ => {}
    }

    Value::Json(json)
}

fn rewrite_url_list(items: &mut [Json], prefix: &str, storage_host: &str, warnings: &mut Vec<String>) {
    for item in items.iter_mut() {
        if let Json::String(url) = &*item {
            *item = rewrite_url_json(url, prefix, storage_host, warnings);
        }
    }
}

/// Table lookup; `NULL` or empty input takes `fallback` when one is set,
/// unmapped values pass through.
pub fn remap_enum(value: Value, mapping: &BTreeMap<String, String>, fallback: Option<&str>) -> Value {
    let text = value.to_text().filter(|t| !t.is_empty());
    match text {
        None => match fallback {
            Some(fallback) => Value::String(fallback.to_string()),
            None => value,
        },
        Some(text) => match mapping.get(&text) {
            Some(mapped) => Value::String(mapped.clone()),
            None => value,
        },
    }
}
