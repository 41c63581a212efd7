use std::collections::BTreeMap;

use rhai::{Array, Dynamic, ImmutableString, Map, FLOAT, INT};
use sh_core::{ExecutionResult, ScriptHostError, ScriptValue};

pub(crate) fn script_value_to_dynamic(value: &ScriptValue) -> Dynamic {
    match value {
        ScriptValue::Null => Dynamic::UNIT,
        ScriptValue::Bool(value) => Dynamic::from_bool(*value),
        ScriptValue::Int(value) => Dynamic::from_int(*value as INT),
        ScriptValue::Number(value) => Dynamic::from_float(*value as FLOAT),
        ScriptValue::String(value) => Dynamic::from(value.clone()),
        ScriptValue::Array(values) => {
            let array = values.iter().map(script_value_to_dynamic).collect::<Array>();
            Dynamic::from_array(array)
        }
        ScriptValue::Map(values) => {
            let mut map = Map::new();
            for (key, value) in values {
                map.insert(key.clone().into(), script_value_to_dynamic(value));
            }
            Dynamic::from_map(map)
        }
    }
}

pub(crate) fn dynamic_to_script_value(value: Dynamic) -> Result<ScriptValue, ScriptHostError> {
    if value.is_unit() {
        return Ok(ScriptValue::Null);
    }
    if value.is::<bool>() {
        return Ok(ScriptValue::Bool(value.cast::<bool>()));
    }
    if value.is::<INT>() {
        return Ok(ScriptValue::Int(value.cast::<INT>() as i64));
    }
    if value.is::<FLOAT>() {
        return Ok(ScriptValue::Number(value.cast::<FLOAT>() as f64));
    }
    if value.is::<ImmutableString>() {
        return Ok(ScriptValue::String(
            value.cast::<ImmutableString>().to_string(),
        ));
    }
    if value.is::<Array>() {
        let array = value.cast::<Array>();
        let mut out = Vec::with_capacity(array.len());
        for item in array {
            out.push(dynamic_to_script_value(item)?);
        }
        return Ok(ScriptValue::Array(out));
    }
    if value.is::<Map>() {
        let map = value.cast::<Map>();
        let mut out = BTreeMap::new();
        for (key, value) in map {
            out.insert(key.to_string(), dynamic_to_script_value(value)?);
        }
        return Ok(ScriptValue::Map(out));
    }

    Err(ScriptHostError::new(
        "EXECUTOR_VALUE_UNSUPPORTED",
        format!("Unsupported Rhai value type \"{}\".", value.type_name()),
    ))
}

/// Text form of a script-produced value; custom host types fall back to
/// their Rhai display form.
pub(crate) fn dynamic_to_text(value: Dynamic) -> String {
    let fallback = value.to_string();
    dynamic_to_script_value(value)
        .map(|value| value.to_text())
        .unwrap_or(fallback)
}

/// Reads the command result slot written by a script. Accepts the numeric
/// result codes and their lowercase names.
pub(crate) fn dynamic_to_result_code(value: &Dynamic) -> Option<ExecutionResult> {
    if let Some(code) = value.clone().try_cast::<INT>() {
        return ExecutionResult::from_code(code as i64);
    }
    if let Some(code) = value.clone().try_cast::<FLOAT>() {
        if code.fract().abs() < FLOAT::EPSILON {
            return ExecutionResult::from_code(code as i64);
        }
        return None;
    }
    if let Some(name) = value.clone().try_cast::<ImmutableString>() {
        return ExecutionResult::from_name(name.as_str());
    }
    None
}

pub(crate) fn dynamic_to_results_map(value: Dynamic) -> BTreeMap<String, String> {
    let Some(map) = value.try_cast::<Map>() else {
        return BTreeMap::new();
    };
    map.into_iter()
        .map(|(key, value)| (key.to_string(), dynamic_to_text(value)))
        .collect()
}
