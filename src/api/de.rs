//! Lenient field decoders. The scan API serves the same field as a JSON
//! number on one endpoint and as a string on another, and uses `null` for
//! "unknown". These helpers accept all of those and reject anything else.
//!
//! Amounts can exceed 64 bits. A JSON number that large has already been
//! rounded to `f64` by the time it reaches us, so amount fields accept
//! numbers only within the exact `u64` range and want anything bigger as a
//! string.

use serde::de::{Deserializer, Error};
use serde::Deserialize;
use serde_json::Value;

fn number_from_value<E: Error>(value: &Value) -> Result<Option<u64>, E> {
    match value {
        Value::Null => Ok(None),
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64))
            .map(Some)
            .ok_or_else(|| E::custom(format!("expected unsigned number, got {}", n))),
        Value::String(s) if s.trim().is_empty() => Ok(None),
        Value::String(s) => parse_u64(s.trim())
            .map(Some)
            .ok_or_else(|| E::custom(format!("expected numeric string, got {:?}", s))),
        other => Err(E::custom(format!("expected number, got {}", other))),
    }
}

fn parse_u64(s: &str) -> Option<u64> {
    match s.strip_prefix("0x") {
        Some(hex) => u64::from_str_radix(hex, 16).ok(),
        None => s.parse().ok(),
    }
}

pub fn u64_lenient<'de, D: Deserializer<'de>>(d: D) -> Result<u64, D::Error> {
    let value = Value::deserialize(d)?;
    Ok(number_from_value::<D::Error>(&value)?.unwrap_or(0))
}

pub fn opt_u64_lenient<'de, D: Deserializer<'de>>(d: D) -> Result<Option<u64>, D::Error> {
    let value = Value::deserialize(d)?;
    number_from_value::<D::Error>(&value)
}

pub fn i64_lenient<'de, D: Deserializer<'de>>(d: D) -> Result<i64, D::Error> {
    Ok(opt_i64_lenient(d)?.unwrap_or(0))
}

pub fn opt_i64_lenient<'de, D: Deserializer<'de>>(d: D) -> Result<Option<i64>, D::Error> {
    match Value::deserialize(d)? {
        Value::Null => Ok(None),
        Value::Number(n) => n
            .as_i64()
            .map(Some)
            .ok_or_else(|| D::Error::custom(format!("expected integer, got {}", n))),
        Value::String(s) if s.trim().is_empty() => Ok(None),
        Value::String(s) => s
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| D::Error::custom(format!("expected integer string, got {:?}", s))),
        other => Err(D::Error::custom(format!("expected integer, got {}", other))),
    }
}

pub fn string_lenient<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    Ok(opt_string_lenient(d)?.unwrap_or_default())
}

pub fn opt_string_lenient<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    match Value::deserialize(d)? {
        Value::Null => Ok(None),
        Value::String(s) if s.is_empty() => Ok(None),
        Value::String(s) => Ok(Some(s)),
        Value::Number(n) => Ok(Some(n.to_string())),
        Value::Bool(b) => Ok(Some(b.to_string())),
        other => Err(D::Error::custom(format!("expected scalar, got {}", other))),
    }
}

fn amount_from_value<E: Error>(value: Value) -> Result<Option<String>, E> {
    match value {
        Value::Null => Ok(None),
        Value::String(s) if s.trim().is_empty() => Ok(None),
        Value::String(s) => Ok(Some(s)),
        Value::Number(n) => n
            .as_u64()
            .map(|v| Some(v.to_string()))
            .ok_or_else(|| E::custom(format!("amount {} is not an exact integer", n))),
        other => Err(E::custom(format!("expected amount, got {}", other))),
    }
}

/// Integer amount as text; see the module docs for the number range.
pub fn amount_lenient<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    Ok(amount_from_value::<D::Error>(Value::deserialize(d)?)?.unwrap_or_default())
}

pub fn opt_amount_lenient<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    amount_from_value::<D::Error>(Value::deserialize(d)?)
}
