// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 Gridbase

use gridbase_sql::{Dialect, RawSql};
use gridbase_type::Value;

use crate::{
	Error, Result,
	ast::{BinaryOp, FormulaNode, UnaryOp},
};

/// Maps a column title to its SQL fragment (usually the quoted physical
/// reference, for computed columns their own fragment). Unresolved titles
/// fall back to a quoted identifier of the title itself.
pub type ColumnResolver<'a> = dyn Fn(&str) -> Option<RawSql> + 'a;

/// The closed function registry this compiler lowers. Anything else is an
/// `UnknownFunction` error, surfaced with the offending call.
const FUNCTIONS: &[&str] =
	&["ADD", "SUM", "AVG", "MIN", "MAX", "CONCAT", "UPPER", "LOWER", "TRIM", "LENGTH", "ROUND", "ABS"];

/// Lower a formula AST node into a dialect-specific SQL fragment.
///
/// The recursion threads the parent's binary operator down so a nested
/// binary expression can parenthesize itself exactly when its operator
/// differs from the parent's — precedence-safe without blanket parens.
/// Literals become `?` bindings and identifiers `??` bindings; nothing is
/// interpolated.
pub fn lower(
	node: &FormulaNode,
	dialect: Dialect,
	resolver: &ColumnResolver,
	alias: Option<&str>,
	parent_op: Option<BinaryOp>,
) -> Result<RawSql> {
	match node {
		FormulaNode::Literal(value) => Ok(aliased(RawSql::value(value.clone()), alias)),

		FormulaNode::Identifier(name) => {
			let fragment = resolver(name).unwrap_or_else(|| RawSql::ident(name.clone()));
			Ok(aliased(fragment, alias))
		}

		FormulaNode::Call {
			name,
			args,
		} => lower_call(name, args, dialect, resolver, alias, parent_op),

		FormulaNode::Binary {
			op,
			left,
			right,
		} => {
			let left = lower(left, dialect, resolver, None, Some(*op))?;
			let right = lower(right, dialect, resolver, None, Some(*op))?;

			let mut fragment = left;
			fragment.push_sql(&format!(" {} ", op.sql()));
			fragment.push(right);

			if let Some(parent) = parent_op {
				if parent != *op {
					fragment = fragment.wrap("(", ")");
				}
			}
			Ok(aliased(fragment, alias))
		}

		FormulaNode::Unary {
			op: UnaryOp::Neg,
			arg,
		} => {
			// negative numeric literals bind as one value
			if let FormulaNode::Literal(Value::Int(v)) = arg.as_ref() {
				return Ok(aliased(RawSql::value(Value::Int(-v)), alias));
			}
			if let FormulaNode::Literal(Value::Float(v)) = arg.as_ref() {
				return Ok(aliased(RawSql::value(Value::Float(-v)), alias));
			}
			let mut fragment = RawSql::lit("-");
			fragment.push(lower(arg, dialect, resolver, None, None)?);
			if parent_op.is_some() {
				fragment = fragment.wrap("(", ")");
			}
			Ok(aliased(fragment, alias))
		}
	}
}

fn lower_call(
	name: &str,
	args: &[FormulaNode],
	dialect: Dialect,
	resolver: &ColumnResolver,
	alias: Option<&str>,
	parent_op: Option<BinaryOp>,
) -> Result<RawSql> {
	match name {
		// variadic ADD/SUM rewrites into a right-associative `+` chain:
		// ADD(a, b, c) == a + (b + c)
		"ADD" | "SUM" => {
			require_args(name, 1, args)?;
			if args.len() > 1 {
				let rest = FormulaNode::Call {
					name: name.to_string(),
					args: args[1..].to_vec(),
				};
				let chain = FormulaNode::Binary {
					op: BinaryOp::Add,
					left: Box::new(args[0].clone()),
					right: Box::new(rest),
				};
				return lower(&chain, dialect, resolver, alias, parent_op);
			}
			return lower(&args[0], dialect, resolver, alias, parent_op);
		}

		// AVG over a fixed argument list divides by the argument count;
		// this is not a row-population aggregate and must stay that way
		"AVG" => {
			require_args(name, 1, args)?;
			let sum = FormulaNode::Call {
				name: "SUM".to_string(),
				args: args.to_vec(),
			};
			let avg = FormulaNode::Binary {
				op: BinaryOp::Div,
				left: Box::new(sum),
				right: Box::new(FormulaNode::Literal(Value::Int(args.len() as i64))),
			};
			return lower(&avg, dialect, resolver, alias, parent_op);
		}

		// CONCAT becomes a `||` chain on sqlite only; other dialects
		// keep the native call syntax
		"CONCAT" if dialect.concat_is_operator() => {
			require_args(name, 1, args)?;
			if args.len() > 1 {
				let rest = FormulaNode::Call {
					name: name.to_string(),
					args: args[1..].to_vec(),
				};
				let chain = FormulaNode::Binary {
					op: BinaryOp::Concat,
					left: Box::new(args[0].clone()),
					right: Box::new(rest),
				};
				return lower(&chain, dialect, resolver, alias, parent_op);
			}
			return lower(&args[0], dialect, resolver, alias, parent_op);
		}

		_ => {}
	}

	if !FUNCTIONS.contains(&name) {
		return Err(Error::UnknownFunction {
			name: name.to_string(),
			fragment: format!("{name}({} argument(s))", args.len()),
		});
	}

	let mut lowered = Vec::with_capacity(args.len());
	for arg in args {
		lowered.push(lower(arg, dialect, resolver, None, None)?);
	}
	let fragment = RawSql::join(lowered, ", ").wrap(&format!("{name}("), ")");
	Ok(aliased(fragment, alias))
}

fn aliased(fragment: RawSql, alias: Option<&str>) -> RawSql {
	match alias {
		Some(alias) => fragment.alias(alias),
		None => fragment,
	}
}

fn require_args(name: &str, expected: usize, args: &[FormulaNode]) -> Result<()> {
	if args.len() < expected {
		return Err(Error::ArityMismatch {
			name: name.to_string(),
			expected,
			actual: args.len(),
		});
	}
	Ok(())
}

#[cfg(test)]
mod tests {
	use gridbase_sql::Statement;

	use super::*;
	use crate::parse;

	fn physical(name: &str) -> Option<RawSql> {
		Some(RawSql::ident(name.to_lowercase()))
	}

	fn render(expression: &str, dialect: Dialect) -> Statement {
		let node = parse(expression).unwrap();
		lower(&node, dialect, &physical, None, None).unwrap().render(dialect).unwrap()
	}

	#[test]
	fn test_concat_is_operator_chain_on_sqlite() {
		// same-operator chains need no parens; the rewrite is a plain
		// `||` chain on sqlite
		let stmt = render("CONCAT(first, ' ', last)", Dialect::Sqlite);
		assert_eq!(stmt.sql, "\"first\" || ? || \"last\"");
		assert_eq!(stmt.bindings, vec![Value::from(" ")]);
	}

	#[test]
	fn test_concat_is_native_call_elsewhere() {
		let stmt = render("CONCAT(first, ' ', last)", Dialect::Postgres);
		assert_eq!(stmt.sql, "CONCAT(\"first\", $1, \"last\")");
		assert_eq!(stmt.bindings, vec![Value::from(" ")]);
	}

	#[test]
	fn test_add_rewrites_right_associative() {
		let stmt = render("ADD(a, b, c)", Dialect::Postgres);
		assert_eq!(stmt.sql, "\"a\" + \"b\" + \"c\"");
	}

	#[test]
	fn test_avg_divides_by_argument_count() {
		// AVG is average-of-argument-count, never a SQL aggregate
		let stmt = render("AVG(a, b, c)", Dialect::Postgres);
		assert_eq!(stmt.sql, "(\"a\" + \"b\" + \"c\") / $1");
		assert_eq!(stmt.bindings, vec![Value::Int(3)]);
	}

	#[test]
	fn test_parenthesization_differs_by_grouping() {
		// P4: different grouping of mixed operators renders differently
		let left_first = render("(a + b) * c", Dialect::Postgres);
		let right_first = render("a + (b * c)", Dialect::Postgres);
		assert_eq!(left_first.sql, "(\"a\" + \"b\") * \"c\"");
		assert_eq!(right_first.sql, "\"a\" + (\"b\" * \"c\")");
		assert_ne!(left_first.sql, right_first.sql);
	}

	#[test]
	fn test_same_operator_chain_is_not_parenthesized() {
		let stmt = render("a + b + c", Dialect::Postgres);
		assert_eq!(stmt.sql, "\"a\" + \"b\" + \"c\"");
	}

	#[test]
	fn test_literals_always_bind() {
		// P1: no literal reaches the SQL text
		let stmt = render("a * 2 + 'x'", Dialect::MySql);
		assert!(!stmt.sql.contains('2'));
		assert!(!stmt.sql.contains('x'));
		assert_eq!(stmt.bindings, vec![Value::Int(2), Value::from("x")]);
	}

	#[test]
	fn test_unknown_function_is_error() {
		let node = parse("FROBNICATE(a)").unwrap();
		let err = lower(&node, Dialect::Postgres, &physical, None, None).unwrap_err();
		assert!(matches!(err, Error::UnknownFunction { ref name, .. } if name == "FROBNICATE"));
	}

	#[test]
	fn test_alias_applied_once_at_top() {
		let node = parse("a + b").unwrap();
		let stmt = lower(&node, Dialect::Postgres, &physical, Some("Total"), None)
			.unwrap()
			.render(Dialect::Postgres)
			.unwrap();
		assert_eq!(stmt.sql, "\"a\" + \"b\" as \"Total\"");
	}

	#[test]
	fn test_division_by_literal_zero_passes_through() {
		let stmt = render("a / 0", Dialect::Postgres);
		assert_eq!(stmt.sql, "\"a\" / $1");
		assert_eq!(stmt.bindings, vec![Value::Int(0)]);
	}

	#[test]
	fn test_negative_literal_binds_as_one_value() {
		let stmt = render("a * -3", Dialect::Sqlite);
		assert_eq!(stmt.sql, "\"a\" * ?");
		assert_eq!(stmt.bindings, vec![Value::Int(-3)]);
	}

	#[test]
	fn test_unresolved_identifier_falls_back_to_quoted() {
		let node = parse("mystery + 1").unwrap();
		let none = |_: &str| None;
		let stmt = lower(&node, Dialect::Postgres, &none, None, None)
			.unwrap()
			.render(Dialect::Postgres)
			.unwrap();
		assert_eq!(stmt.sql, "\"mystery\" + $1");
	}

	#[test]
	fn test_ampersand_lowers_like_concat() {
		let sqlite = render("first & last", Dialect::Sqlite);
		assert_eq!(sqlite.sql, "\"first\" || \"last\"");
		let pg = render("first & last", Dialect::Postgres);
		assert_eq!(pg.sql, "CONCAT(\"first\", \"last\")");
	}
}
