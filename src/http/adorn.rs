//! Request-shaping helpers: URL composition, query defaults, body encoding.

use chrono::Utc;
use serde_json::{Map, Value};

use crate::config::Config;

/// Reserved cache-busting field merged into params and bodies
pub const TIMESTAMP_FIELD: &str = "t";

/// Body encoding for [`adorn_data`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ContentType {
    #[default]
    Json,
    Form,
}

impl ContentType {
    /// "json" selects JSON; any other name selects form encoding
    pub fn from_name(name: &str) -> Self {
        if name == "json" {
            ContentType::Json
        } else {
            ContentType::Form
        }
    }

    pub fn mime(&self) -> &'static str {
        match self {
            ContentType::Json => "application/json; charset=utf-8",
            ContentType::Form => "application/x-www-form-urlencoded; charset=utf-8",
        }
    }
}

/// Full request URL for an API action.
///
/// Non-production builds with the proxy flag go through the local proxy
/// prefix, everything else hits `base_url` directly.
pub fn adorn_url(config: &Config, action: &str) -> String {
    if config.uses_proxy() {
        format!("{}{}", config.proxy_prefix, action)
    } else {
        format!("{}{}", config.base_url, action)
    }
}

fn default_fields() -> Value {
    let mut defaults = Map::new();
    defaults.insert(
        TIMESTAMP_FIELD.to_string(),
        Value::from(Utc::now().timestamp_millis()),
    );
    Value::Object(defaults)
}

/// Query parameters with the cache-busting timestamp merged underneath.
///
/// Caller fields are merged over the defaults, so a caller-supplied `t`
/// wins. Non-object params are returned unchanged.
pub fn adorn_params(params: Value, with_defaults: bool) -> Value {
    if !with_defaults {
        return params;
    }
    match params {
        Value::Null => default_fields(),
        Value::Object(_) => {
            let mut merged = default_fields();
            deep_merge(&mut merged, params);
            merged
        }
        other => other,
    }
}

/// Encoded request body, with the same default merge as [`adorn_params`]
pub fn adorn_data(data: Value, with_defaults: bool, content_type: ContentType) -> String {
    let data = adorn_params(data, with_defaults);
    match content_type {
        ContentType::Json => data.to_string(),
        ContentType::Form => to_form_urlencoded(&data),
    }
}

/// Recursive merge: objects merge key by key, arrays index by index,
/// anything else in `source` replaces the target value.
fn deep_merge(target: &mut Value, source: Value) {
    match (target, source) {
        (Value::Object(target), Value::Object(source)) => {
            for (key, value) in source {
                match target.get_mut(&key) {
                    Some(existing) => deep_merge(existing, value),
                    None => {
                        target.insert(key, value);
                    }
                }
            }
        }
        (Value::Array(target), Value::Array(source)) => {
            for (index, value) in source.into_iter().enumerate() {
                match target.get_mut(index) {
                    Some(existing) => deep_merge(existing, value),
                    None => target.push(value),
                }
            }
        }
        (target, source) => *target = source,
    }
}

/// Bracket-style form encoding: `a[b]=c`, arrays as `a[0]=x`, null as `a=`.
/// Keys and values are percent-encoded (brackets included); empty objects
/// and arrays produce nothing.
pub fn to_form_urlencoded(value: &Value) -> String {
    let Value::Object(map) = value else {
        return String::new();
    };
    let mut pairs = Vec::new();
    for (key, value) in map {
        collect_pairs(key.clone(), value, &mut pairs);
    }
    pairs
        .into_iter()
        .map(|(key, value)| {
            format!(
                "{}={}",
                urlencoding::encode(&key),
                urlencoding::encode(&value)
            )
        })
        .collect::<Vec<_>>()
        .join("&")
}

fn collect_pairs(prefix: String, value: &Value, pairs: &mut Vec<(String, String)>) {
    match value {
        Value::Object(map) => {
            for (key, value) in map {
                collect_pairs(format!("{}[{}]", prefix, key), value, pairs);
            }
        }
        Value::Array(items) => {
            for (index, value) in items.iter().enumerate() {
                collect_pairs(format!("{}[{}]", prefix, index), value, pairs);
            }
        }
        Value::Null => pairs.push((prefix, String::new())),
        Value::String(s) => pairs.push((prefix, s.clone())),
        Value::Bool(b) => pairs.push((prefix, b.to_string())),
        Value::Number(n) => pairs.push((prefix, n.to_string())),
    }
}
