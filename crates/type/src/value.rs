// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 Gridbase

use std::fmt::{self, Display, Formatter};

use serde::{Deserialize, Serialize};
use serde_json::json;

/// A runtime cell value, as bound into statements and returned from rows.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
	Null,
	Bool(bool),
	Int(i64),
	Float(f64),
	Text(String),
	Json(serde_json::Value),
}

impl Value {
	pub fn is_null(&self) -> bool {
		matches!(self, Value::Null)
	}

	pub fn as_f64(&self) -> Option<f64> {
		match self {
			Value::Int(v) => Some(*v as f64),
			Value::Float(v) => Some(*v),
			_ => None,
		}
	}

	pub fn as_str(&self) -> Option<&str> {
		match self {
			Value::Text(v) => Some(v),
			_ => None,
		}
	}

	pub fn to_json(&self) -> serde_json::Value {
		match self {
			Value::Null => serde_json::Value::Null,
			Value::Bool(v) => json!(v),
			Value::Int(v) => json!(v),
			Value::Float(v) => json!(v),
			Value::Text(v) => json!(v),
			Value::Json(v) => v.clone(),
		}
	}

	pub fn from_json(value: serde_json::Value) -> Self {
		match value {
			serde_json::Value::Null => Value::Null,
			serde_json::Value::Bool(v) => Value::Bool(v),
			serde_json::Value::Number(n) => {
				if let Some(i) = n.as_i64() {
					Value::Int(i)
				} else {
					Value::Float(n.as_f64().unwrap_or(f64::NAN))
				}
			}
			serde_json::Value::String(v) => Value::Text(v),
			other => Value::Json(other),
		}
	}
}

impl Display for Value {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		match self {
			Value::Null => f.write_str("NULL"),
			Value::Bool(v) => write!(f, "{v}"),
			Value::Int(v) => write!(f, "{v}"),
			Value::Float(v) => write!(f, "{v}"),
			Value::Text(v) => f.write_str(v),
			Value::Json(v) => write!(f, "{v}"),
		}
	}
}

impl From<&str> for Value {
	fn from(value: &str) -> Self {
		Value::Text(value.to_string())
	}
}

impl From<String> for Value {
	fn from(value: String) -> Self {
		Value::Text(value)
	}
}

impl From<i64> for Value {
	fn from(value: i64) -> Self {
		Value::Int(value)
	}
}

impl From<f64> for Value {
	fn from(value: f64) -> Self {
		Value::Float(value)
	}
}

impl From<bool> for Value {
	fn from(value: bool) -> Self {
		Value::Bool(value)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_json_round_trip() {
		let value = Value::from_json(json!({"a": [1, 2]}));
		assert_eq!(value, Value::Json(json!({"a": [1, 2]})));
		assert_eq!(value.to_json(), json!({"a": [1, 2]}));
	}

	#[test]
	fn test_number_coercion() {
		assert_eq!(Value::from_json(json!(3)), Value::Int(3));
		assert_eq!(Value::from_json(json!(2.5)), Value::Float(2.5));
		assert_eq!(Value::Int(3).as_f64(), Some(3.0));
	}
}
