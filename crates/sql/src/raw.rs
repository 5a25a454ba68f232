// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 Gridbase

use gridbase_type::Value;

use crate::{Dialect, Error, Result, Statement};

/// A positional binding consumed by a [`RawSql`] template.
#[derive(Clone, Debug, PartialEq)]
pub enum Bind {
	/// Bound to a `??` placeholder; quoted per dialect at render time.
	Ident(String),
	/// Bound to a `?` placeholder; stays a parameter in the rendered
	/// statement.
	Value(Value),
}

impl Bind {
	fn kind(&self) -> &'static str {
		match self {
			Bind::Ident(_) => "identifier",
			Bind::Value(_) => "value",
		}
	}
}

impl From<&str> for Bind {
	fn from(value: &str) -> Self {
		Bind::Ident(value.to_string())
	}
}

impl From<Value> for Bind {
	fn from(value: Value) -> Self {
		Bind::Value(value)
	}
}

/// A SQL fragment: a template holding `?` value and `??` identifier
/// placeholders plus the bindings they consume, in order.
///
/// This is the only way engine code produces SQL text — literals and
/// identifiers are never interpolated into the template. Rendering against a
/// [`Dialect`] splices quoted identifiers and rewrites value placeholders
/// into the dialect's bind syntax, carrying the values alongside.
#[derive(Clone, Debug, PartialEq)]
pub struct RawSql {
	template: String,
	binds: Vec<Bind>,
}

impl RawSql {
	pub fn new(template: impl Into<String>, binds: Vec<Bind>) -> Self {
		Self {
			template: template.into(),
			binds,
		}
	}

	/// Plain SQL text with no placeholders (keywords, punctuation).
	pub fn lit(sql: impl Into<String>) -> Self {
		Self::new(sql, vec![])
	}

	/// A single quoted identifier reference.
	pub fn ident(name: impl Into<String>) -> Self {
		Self::new("??", vec![Bind::Ident(name.into())])
	}

	/// A single bound value.
	pub fn value(value: impl Into<Value>) -> Self {
		Self::new("?", vec![Bind::Value(value.into())])
	}

	pub fn template(&self) -> &str {
		&self.template
	}

	pub fn binds(&self) -> &[Bind] {
		&self.binds
	}

	/// Append another fragment, concatenating templates and bindings.
	pub fn push(&mut self, other: RawSql) {
		self.template.push_str(&other.template);
		self.binds.extend(other.binds);
	}

	pub fn push_sql(&mut self, sql: &str) {
		self.template.push_str(sql);
	}

	pub fn wrap(mut self, open: &str, close: &str) -> Self {
		self.template.insert_str(0, open);
		self.template.push_str(close);
		self
	}

	/// Append ` as "alias"`.
	pub fn alias(mut self, alias: impl Into<String>) -> Self {
		self.template.push_str(" as ??");
		self.binds.push(Bind::Ident(alias.into()));
		self
	}

	pub fn join(parts: impl IntoIterator<Item = RawSql>, separator: &str) -> Self {
		let mut result = RawSql::lit("");
		for (i, part) in parts.into_iter().enumerate() {
			if i > 0 {
				result.push_sql(separator);
			}
			result.push(part);
		}
		result
	}

	/// Render into a dialect-specific [`Statement`]. Identifier bindings
	/// are spliced quoted; value bindings become dialect placeholders
	/// with the values carried in order.
	pub fn render(&self, dialect: Dialect) -> Result<Statement> {
		let mut sql = String::with_capacity(self.template.len());
		let mut values = Vec::new();
		let mut binds = self.binds.iter();
		let mut consumed = 0usize;

		let bytes = self.template.as_bytes();
		let mut i = 0;
		while i < bytes.len() {
			if bytes[i] != b'?' {
				// advance over the full utf-8 character
				let ch_len = self.template[i..].chars().next().map(char::len_utf8).unwrap_or(1);
				sql.push_str(&self.template[i..i + ch_len]);
				i += ch_len;
				continue;
			}

			let is_ident = i + 1 < bytes.len() && bytes[i + 1] == b'?';
			consumed += 1;
			let bind = binds.next().ok_or_else(|| Error::BindingCountMismatch {
				template: self.template.clone(),
				expected: consumed,
				actual: self.binds.len(),
			})?;

			match (is_ident, bind) {
				(true, Bind::Ident(name)) => {
					sql.push_str(&dialect.quote_ident(name));
					i += 2;
				}
				(false, Bind::Value(value)) => {
					values.push(value.clone());
					sql.push_str(&dialect.placeholder(values.len()));
					i += 1;
				}
				(is_ident, bind) => {
					return Err(Error::BindingKindMismatch {
						template: self.template.clone(),
						position: consumed,
						expected: if is_ident {
							"identifier"
						} else {
							"value"
						},
						actual: bind.kind(),
					});
				}
			}
		}

		if binds.next().is_some() {
			return Err(Error::BindingCountMismatch {
				template: self.template.clone(),
				expected: consumed,
				actual: self.binds.len(),
			});
		}

		Ok(Statement {
			sql,
			bindings: values,
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_render_ident_and_value() {
		let raw = RawSql::new("?? = ?", vec![Bind::Ident("t.name".into()), Bind::Value(Value::from("x"))]);

		let stmt = raw.render(Dialect::Postgres).unwrap();
		assert_eq!(stmt.sql, "\"t\".\"name\" = $1");
		assert_eq!(stmt.bindings, vec![Value::from("x")]);

		let stmt = raw.render(Dialect::MySql).unwrap();
		assert_eq!(stmt.sql, "`t`.`name` = ?");
	}

	#[test]
	fn test_join_and_wrap() {
		let raw = RawSql::join([RawSql::ident("a"), RawSql::ident("b")], " || ").wrap("(", ")");
		let stmt = raw.render(Dialect::Sqlite).unwrap();
		assert_eq!(stmt.sql, "(\"a\" || \"b\")");
	}

	#[test]
	fn test_alias() {
		let stmt = RawSql::ident("city").alias("City Name").render(Dialect::Postgres).unwrap();
		assert_eq!(stmt.sql, "\"city\" as \"City Name\"");
	}

	#[test]
	fn test_missing_binding_is_error() {
		let raw = RawSql::new("? + ?", vec![Bind::Value(Value::Int(1))]);
		assert!(matches!(raw.render(Dialect::Sqlite), Err(Error::BindingCountMismatch { .. })));
	}

	#[test]
	fn test_extra_binding_is_error() {
		let raw = RawSql::new("?", vec![Bind::Value(Value::Int(1)), Bind::Value(Value::Int(2))]);
		assert!(matches!(raw.render(Dialect::Sqlite), Err(Error::BindingCountMismatch { .. })));
	}

	#[test]
	fn test_kind_mismatch_is_error() {
		let raw = RawSql::new("??", vec![Bind::Value(Value::Int(1))]);
		assert!(matches!(raw.render(Dialect::Sqlite), Err(Error::BindingKindMismatch { .. })));
	}

	#[test]
	fn test_postgres_placeholders_are_ordinal() {
		let raw = RawSql::new("? and ?", vec![Bind::Value(Value::Int(1)), Bind::Value(Value::Int(2))]);
		let stmt = raw.render(Dialect::Postgres).unwrap();
		assert_eq!(stmt.sql, "$1 and $2");
	}
}
