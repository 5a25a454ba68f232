// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 Gridbase

use std::fmt::{self, Display, Formatter};

use serde::{Deserialize, Serialize};

/// The SQL variant of a backing database.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Dialect {
	Postgres,
	MySql,
	Sqlite,
}

impl Dialect {
	/// Quote `ident`, splitting on `.` so qualified names quote each
	/// part (`alias.col` becomes `"alias"."col"`). Embedded quote
	/// characters are doubled.
	pub fn quote_ident(&self, ident: &str) -> String {
		ident.split('.').map(|part| self.quote_part(part)).collect::<Vec<_>>().join(".")
	}

	fn quote_part(&self, part: &str) -> String {
		match self {
			Dialect::Postgres | Dialect::Sqlite => {
				format!("\"{}\"", part.replace('"', "\"\""))
			}
			Dialect::MySql => format!("`{}`", part.replace('`', "``")),
		}
	}

	/// The bind placeholder for the `index`-th (1-based) parameter.
	pub fn placeholder(&self, index: usize) -> String {
		match self {
			Dialect::Postgres => format!("${index}"),
			Dialect::MySql | Dialect::Sqlite => "?".to_string(),
		}
	}

	/// SQLite lowers `CONCAT(..)` to a `||` chain instead of a native
	/// function call.
	pub fn concat_is_operator(&self) -> bool {
		matches!(self, Dialect::Sqlite)
	}

	/// Whether `SELECT .. FOR UPDATE` row locking is available.
	pub fn supports_for_update(&self) -> bool {
		matches!(self, Dialect::Postgres | Dialect::MySql)
	}

	pub fn limit_offset(&self, limit: Option<u64>, offset: Option<u64>) -> String {
		let mut clause = String::new();
		if let Some(limit) = limit {
			clause.push_str(&format!(" limit {limit}"));
		} else if offset.is_some() && *self == Dialect::Sqlite {
			// sqlite requires a LIMIT before OFFSET
			clause.push_str(" limit -1");
		}
		if let Some(offset) = offset {
			clause.push_str(&format!(" offset {offset}"));
		}
		clause
	}
}

impl Display for Dialect {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		match self {
			Dialect::Postgres => f.write_str("pg"),
			Dialect::MySql => f.write_str("mysql"),
			Dialect::Sqlite => f.write_str("sqlite"),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_quote_qualified() {
		assert_eq!(Dialect::Postgres.quote_ident("t.city"), "\"t\".\"city\"");
		assert_eq!(Dialect::MySql.quote_ident("t.city"), "`t`.`city`");
	}

	#[test]
	fn test_quote_escapes_quote_char() {
		assert_eq!(Dialect::Sqlite.quote_ident("we\"ird"), "\"we\"\"ird\"");
		assert_eq!(Dialect::MySql.quote_ident("we`ird"), "`we``ird`");
	}

	#[test]
	fn test_placeholders() {
		assert_eq!(Dialect::Postgres.placeholder(2), "$2");
		assert_eq!(Dialect::Sqlite.placeholder(2), "?");
	}

	#[test]
	fn test_sqlite_offset_needs_limit() {
		assert_eq!(Dialect::Sqlite.limit_offset(None, Some(10)), " limit -1 offset 10");
		assert_eq!(Dialect::Postgres.limit_offset(Some(25), Some(50)), " limit 25 offset 50");
	}
}
