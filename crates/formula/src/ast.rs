// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 Gridbase

use std::collections::HashSet;
use std::fmt::{self, Display, Formatter};

use gridbase_type::Value;

#[derive(Debug, Clone, PartialEq)]
pub enum FormulaNode {
	Literal(Value),
	/// A column reference by title.
	Identifier(String),
	Call {
		name: String,
		args: Vec<FormulaNode>,
	},
	Binary {
		op: BinaryOp,
		left: Box<FormulaNode>,
		right: Box<FormulaNode>,
	},
	Unary {
		op: UnaryOp,
		arg: Box<FormulaNode>,
	},
}

impl FormulaNode {
	/// Every identifier (column title) the expression references.
	pub fn identifiers(&self) -> HashSet<String> {
		let mut out = HashSet::new();
		self.collect_identifiers(&mut out);
		out
	}

	fn collect_identifiers(&self, out: &mut HashSet<String>) {
		match self {
			FormulaNode::Literal(_) => {}
			FormulaNode::Identifier(name) => {
				out.insert(name.clone());
			}
			FormulaNode::Call {
				args, ..
			} => {
				for arg in args {
					arg.collect_identifiers(out);
				}
			}
			FormulaNode::Binary {
				left,
				right,
				..
			} => {
				left.collect_identifiers(out);
				right.collect_identifiers(out);
			}
			FormulaNode::Unary {
				arg, ..
			} => arg.collect_identifiers(out),
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
	Add,
	Sub,
	Mul,
	Div,
	Mod,
	/// String concatenation; `&` in the surface grammar, `||` in SQL.
	Concat,
}

impl BinaryOp {
	pub fn sql(&self) -> &'static str {
		match self {
			BinaryOp::Add => "+",
			BinaryOp::Sub => "-",
			BinaryOp::Mul => "*",
			BinaryOp::Div => "/",
			BinaryOp::Mod => "%",
			BinaryOp::Concat => "||",
		}
	}
}

impl Display for BinaryOp {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.write_str(self.sql())
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
	Neg,
}
