// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Loading observed calls from JSON.
//!
//! **DDD Context:** Command Line
//!
//! A call file describes one entry into the target:
//!
//! ```json
//! {
//!   "receiver": {"$type": "com.acme.OrderService"},
//!   "args": [
//!     {"$type": "com.acme.Order", "getId": "A-1", "isPaid": true},
//!     "express"
//!   ],
//!   "thrown": {"type": "java.lang.IllegalStateException", "message": "closed"}
//! }
//! ```
//!
//! JSON scalars map to values directly. Objects are decoded by their marker
//! key: `$type` (a record whose other keys are inspector outputs), `$enum`
//! with `variant`, `$bytes`, `$chars` and `$char`.

use camino::Utf8Path;
use ecow::EcoString;
use miette::{Context, IntoDiagnostic, Result, bail, miette};
use reachspec_core::fitness::ThrownException;
use reachspec_core::value::{Record, Value};
use serde::Deserialize;
use std::fs;

/// A call into the target, as read from a call file.
#[derive(Debug, Clone)]
pub struct ObservedCall {
    pub receiver: Option<Value>,
    pub args: Vec<Value>,
    pub thrown: Option<ThrownException>,
}

#[derive(Debug, Deserialize)]
struct CallFile {
    #[serde(default)]
    receiver: serde_json::Value,
    #[serde(default)]
    args: Vec<serde_json::Value>,
    #[serde(default)]
    thrown: Option<ThrownFile>,
}

#[derive(Debug, Deserialize)]
struct ThrownFile {
    #[serde(rename = "type")]
    type_name: String,
    #[serde(default)]
    message: Option<String>,
}

/// Read a call file.
pub fn load_call(path: &Utf8Path) -> Result<ObservedCall> {
    let content = fs::read_to_string(path)
        .into_diagnostic()
        .wrap_err_with(|| format!("Failed to read call file '{path}'"))?;
    parse_call(&content).wrap_err_with(|| format!("Failed to parse call file '{path}'"))
}

/// Parse call file contents.
pub fn parse_call(content: &str) -> Result<ObservedCall> {
    let file: CallFile = serde_json::from_str(content).into_diagnostic()?;
    let receiver = match &file.receiver {
        serde_json::Value::Null => None,
        other => Some(decode_value(other).wrap_err("Invalid receiver")?),
    };
    let args = file
        .args
        .iter()
        .enumerate()
        .map(|(i, arg)| decode_value(arg).wrap_err_with(|| format!("Invalid argument {i}")))
        .collect::<Result<Vec<_>>>()?;
    let thrown = file.thrown.map(|t| ThrownException {
        type_name: t.type_name.into(),
        message: t.message,
    });
    Ok(ObservedCall {
        receiver,
        args,
        thrown,
    })
}

/// Decode one JSON value.
pub fn decode_value(json: &serde_json::Value) -> Result<Value> {
    use serde_json::Value as Json;

    match json {
        Json::Null => Ok(Value::Null),
        Json::Bool(b) => Ok(Value::Bool(*b)),
        Json::Number(n) => n
            .as_i64()
            .map(Value::Int)
            .or_else(|| n.as_f64().map(Value::Float))
            .ok_or_else(|| miette!("Number {n} is out of range")),
        Json::String(s) => Ok(Value::text(s.as_str())),
        Json::Array(_) => bail!("Arrays are not supported; use `$bytes` or `$chars`"),
        Json::Object(map) => {
            if let Some(type_name) = map.get("$type") {
                let type_name = type_name
                    .as_str()
                    .ok_or_else(|| miette!("`$type` must be a string"))?;
                let mut record = Record::new(type_name);
                for (method, output) in map.iter().filter(|(key, _)| *key != "$type") {
                    let value = decode_value(output)
                        .wrap_err_with(|| format!("Invalid output of `{method}`"))?;
                    record.insert(EcoString::from(method.as_str()), value);
                }
                Ok(record.into_value())
            } else if let Some(type_name) = map.get("$enum") {
                let type_name = type_name
                    .as_str()
                    .ok_or_else(|| miette!("`$enum` must be a string"))?;
                let variant = map
                    .get("variant")
                    .and_then(Json::as_str)
                    .ok_or_else(|| miette!("Enum value of `{type_name}` needs a `variant` string"))?;
                Ok(Value::enumeration(type_name, variant))
            } else if let Some(bytes) = map.get("$bytes") {
                let bytes = bytes
                    .as_array()
                    .ok_or_else(|| miette!("`$bytes` must be an array"))?
                    .iter()
                    .map(|b| {
                        b.as_u64()
                            .and_then(|b| u8::try_from(b).ok())
                            .ok_or_else(|| miette!("`$bytes` entries must be 0..=255"))
                    })
                    .collect::<Result<Vec<u8>>>()?;
                Ok(Value::Bytes(bytes))
            } else if let Some(chars) = map.get("$chars") {
                let chars = chars
                    .as_str()
                    .ok_or_else(|| miette!("`$chars` must be a string"))?;
                Ok(Value::Chars(chars.chars().collect()))
            } else if let Some(c) = map.get("$char") {
                let mut chars = c
                    .as_str()
                    .ok_or_else(|| miette!("`$char` must be a string"))?
                    .chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Ok(Value::Char(c)),
                    _ => bail!("`$char` must hold exactly one character"),
                }
            } else {
                bail!("Objects need a `$type`, `$enum`, `$bytes`, `$chars` or `$char` key")
            }
        }
    }
}
