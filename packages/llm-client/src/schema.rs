//! Schema generation for structured outputs.
//!
//! Schemas are derived from Rust types with `schemars` and then rewritten
//! into the dialect each provider accepts.
//!
//! # Example
//!
//! ```rust,ignore
//! use schemars::JsonSchema;
//! use serde::Deserialize;
//! use llm_client::{to_gemini_schema, StructuredOutput};
//!
//! #[derive(Deserialize, JsonSchema)]
//! struct Change {
//!     /// What changed
//!     name: String,
//! }
//!
//! let openai = Vec::<Change>::strict_schema();
//! let gemini = to_gemini_schema(&openai);
//! ```

use schemars::{schema_for, JsonSchema};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

/// Types that can be requested as structured output.
///
/// Implemented for every `JsonSchema + DeserializeOwned` type.
pub trait StructuredOutput: JsonSchema + DeserializeOwned {
    /// Strict JSON schema: `$ref`s inlined, every object closed with
    /// `additionalProperties: false` and all of its properties required.
    fn strict_schema() -> Value {
        let schema = schema_for!(Self);
        let mut value = serde_json::to_value(schema).unwrap_or_default();

        close_objects(&mut value);
        inline_refs(&mut value);

        if let Value::Object(map) = &mut value {
            map.remove("definitions");
            map.remove("$schema");
        }

        value
    }
}

impl<T: JsonSchema + DeserializeOwned> StructuredOutput for T {}

/// Close every object schema and mark all of its properties required.
fn close_objects(value: &mut Value) {
    match value {
        Value::Object(map) => {
            if map.get("type") == Some(&Value::String("object".to_string())) {
                map.insert("additionalProperties".to_string(), Value::Bool(false));

                if let Some(Value::Object(props)) = map.get("properties") {
                    let keys: Vec<Value> = props.keys().cloned().map(Value::String).collect();
                    map.insert("required".to_string(), Value::Array(keys));
                }
            }

            for (_, v) in map.iter_mut() {
                close_objects(v);
            }
        }
        Value::Array(arr) => {
            for item in arr.iter_mut() {
                close_objects(item);
            }
        }
        _ => {}
    }
}

/// Replace `{"$ref": "#/definitions/X"}` nodes with the definition itself.
fn inline_refs(value: &mut Value) {
    let definitions = match value {
        Value::Object(map) => map.get("definitions").cloned(),
        _ => None,
    };

    if let Some(defs) = definitions {
        inline_refs_with(value, &defs);
    }
}

fn inline_refs_with(value: &mut Value, definitions: &Value) {
    match value {
        Value::Object(map) => {
            if let Some(Value::String(path)) = map.get("$ref").cloned() {
                if let Some(name) = path.strip_prefix("#/definitions/") {
                    if let Some(def) = definitions.get(name) {
                        *value = def.clone();
                        inline_refs_with(value, definitions);
                        return;
                    }
                }
            }

            for (key, v) in map.iter_mut() {
                if key != "definitions" {
                    inline_refs_with(v, definitions);
                }
            }
        }
        Value::Array(arr) => {
            for item in arr.iter_mut() {
                inline_refs_with(item, definitions);
            }
        }
        _ => {}
    }
}

/// Keys Gemini's `responseSchema` understands.
const GEMINI_KEYS: &[&str] = &[
    "type",
    "description",
    "properties",
    "items",
    "required",
    "enum",
    "format",
    "nullable",
];

/// Rewrite a JSON schema into the subset Gemini accepts.
///
/// Type names become upper case, `["string", "null"]` unions become
/// `nullable: true`, and unsupported keywords are dropped.
pub fn to_gemini_schema(schema: &Value) -> Value {
    let Value::Object(map) = schema else {
        return schema.clone();
    };

    let mut out = Map::new();

    for (key, v) in map {
        if !GEMINI_KEYS.contains(&key.as_str()) {
            continue;
        }

        match key.as_str() {
            "type" => match v {
                Value::String(t) => {
                    out.insert("type".to_string(), Value::String(t.to_uppercase()));
                }
                Value::Array(types) => {
                    let concrete = types
                        .iter()
                        .filter_map(Value::as_str)
                        .find(|t| *t != "null");
                    if let Some(t) = concrete {
                        out.insert("type".to_string(), Value::String(t.to_uppercase()));
                    }
                    if types.iter().any(|t| t == "null") {
                        out.insert("nullable".to_string(), Value::Bool(true));
                    }
                }
                _ => {}
            },
            "properties" => {
                if let Value::Object(props) = v {
                    let converted = props
                        .iter()
                        .map(|(name, prop)| (name.clone(), to_gemini_schema(prop)))
                        .collect();
                    out.insert("properties".to_string(), Value::Object(converted));
                }
            }
            "items" => {
                out.insert("items".to_string(), to_gemini_schema(v));
            }
            _ => {
                out.insert(key.clone(), v.clone());
            }
        }
    }

    Value::Object(out)
}
