// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 Gridbase

use gridbase_type::Value;
use serde::{Deserialize, Serialize};

/// One rendered, parameterized SQL statement.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Statement {
	pub sql: String,
	pub bindings: Vec<Value>,
}

impl Statement {
	pub fn new(sql: impl Into<String>, bindings: Vec<Value>) -> Self {
		Self {
			sql: sql.into(),
			bindings,
		}
	}
}

/// An ordered list of statements making up one logical operation.
///
/// The plan is executor-agnostic: a local transactional executor runs the
/// statements inside one transaction, a remote executor forwards the
/// pre-rendered strings to an external channel. Both consume the same plan,
/// so the SQL is byte-identical regardless of channel.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct StatementPlan {
	pub statements: Vec<Statement>,
}

impl StatementPlan {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn push(&mut self, statement: Statement) {
		self.statements.push(statement);
	}

	pub fn len(&self) -> usize {
		self.statements.len()
	}

	pub fn is_empty(&self) -> bool {
		self.statements.is_empty()
	}
}

impl From<Statement> for StatementPlan {
	fn from(statement: Statement) -> Self {
		Self {
			statements: vec![statement],
		}
	}
}

impl IntoIterator for StatementPlan {
	type Item = Statement;
	type IntoIter = std::vec::IntoIter<Statement>;

	fn into_iter(self) -> Self::IntoIter {
		self.statements.into_iter()
	}
}
