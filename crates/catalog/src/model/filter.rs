// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 Gridbase

use std::fmt::{self, Display, Formatter};

use gridbase_type::{ColumnId, Value};
use serde::{Deserialize, Serialize};

/// A filter tree: a group combines its children with one logical operator,
/// leaves compare a column against a value.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FilterTree {
	pub op: LogicalOp,
	pub children: Vec<FilterNode>,
}

impl FilterTree {
	pub fn all(children: Vec<FilterNode>) -> Self {
		Self {
			op: LogicalOp::And,
			children,
		}
	}

	pub fn any(children: Vec<FilterNode>) -> Self {
		Self {
			op: LogicalOp::Or,
			children,
		}
	}
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterNode {
	Group(FilterTree),
	Leaf {
		column_id: ColumnId,
		op: ComparisonOp,
		#[serde(default = "null_value")]
		value: Value,
	},
}

fn null_value() -> Value {
	Value::Null
}

impl FilterNode {
	pub fn leaf(column_id: impl Into<ColumnId>, op: ComparisonOp, value: impl Into<Value>) -> Self {
		FilterNode::Leaf {
			column_id: column_id.into(),
			op,
			value: value.into(),
		}
	}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogicalOp {
	And,
	Or,
}

impl Display for LogicalOp {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		match self {
			LogicalOp::And => f.write_str("and"),
			LogicalOp::Or => f.write_str("or"),
		}
	}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComparisonOp {
	Eq,
	Neq,
	Gt,
	Ge,
	Lt,
	Le,
	Like,
	NotLike,
	In,
	Blank,
	NotBlank,
}

impl Display for ComparisonOp {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		let name = match self {
			ComparisonOp::Eq => "eq",
			ComparisonOp::Neq => "neq",
			ComparisonOp::Gt => "gt",
			ComparisonOp::Ge => "ge",
			ComparisonOp::Lt => "lt",
			ComparisonOp::Le => "le",
			ComparisonOp::Like => "like",
			ComparisonOp::NotLike => "nlike",
			ComparisonOp::In => "in",
			ComparisonOp::Blank => "blank",
			ComparisonOp::NotBlank => "notblank",
		};
		f.write_str(name)
	}
}
