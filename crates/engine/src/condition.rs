// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 Gridbase

use futures_util::future::BoxFuture;
use gridbase_catalog::model::{ColumnMeta, ComparisonOp, FilterNode, FilterTree};
use gridbase_column::{FragmentContext, sql_fragment};
use gridbase_sql::{Dialect, RawSql};
use gridbase_type::{AbstractType, ColumnId, ConfigError, ResolveError, Value};

use crate::Result;

/// Compile a filter tree into a WHERE predicate. An empty tree compiles
/// to nothing; an unknown column or an operator the column's type cannot
/// support is a client error naming the offender.
pub(crate) fn compile<'a>(
	ctx: &'a FragmentContext<'_>,
	columns: &'a [ColumnMeta],
	tree: &'a FilterTree,
) -> BoxFuture<'a, Result<Option<RawSql>>> {
	Box::pin(async move {
		let mut parts = Vec::with_capacity(tree.children.len());
		for child in &tree.children {
			match child {
				FilterNode::Group(group) => {
					if let Some(predicate) = compile(ctx, columns, group).await? {
						parts.push(predicate);
					}
				}
				FilterNode::Leaf {
					column_id,
					op,
					value,
				} => {
					parts.push(leaf(ctx, columns, column_id, *op, value).await?);
				}
			}
		}
		Ok(match parts.len() {
			0 => None,
			1 => parts.into_iter().next(),
			_ => Some(RawSql::join(parts, &format!(" {} ", tree.op)).wrap("(", ")")),
		})
	})
}

async fn leaf(
	ctx: &FragmentContext<'_>,
	columns: &[ColumnMeta],
	column_id: &ColumnId,
	op: ComparisonOp,
	value: &Value,
) -> Result<RawSql> {
	let column = columns.iter().find(|column| column.id == *column_id).ok_or_else(|| {
		ResolveError::ColumnNotFound {
			column: column_id.clone(),
		}
	})?;
	// Resolve through the target chain so a numeric lookup keeps its
	// number operators instead of degrading to text comparison.
	let abstract_type = gridbase_column::resolve_abstract_type(ctx.catalog, column).await?;
	if !supported(op, abstract_type) {
		return Err(ConfigError::UnsupportedComparisonOperator {
			operator: op.to_string(),
			abstract_type,
			column: column.id.clone(),
		}
		.into());
	}

	let fragment = sql_fragment(ctx, column).await?;
	Ok(match op {
		// JSON emptiness: `eq ''` matches NULL, `{}` and `[]`, per
		// dialect. Everything else would be naive string equality.
		ComparisonOp::Eq if abstract_type == AbstractType::Json && is_empty_text(value) => {
			json_empty(ctx.dialect, fragment)
		}
		ComparisonOp::Neq if abstract_type == AbstractType::Json && is_empty_text(value) => {
			json_empty(ctx.dialect, fragment).wrap("not ", "")
		}
		ComparisonOp::Eq if value.is_null() => {
			let mut predicate = fragment;
			predicate.push_sql(" is null");
			predicate
		}
		ComparisonOp::Neq if value.is_null() => {
			let mut predicate = fragment;
			predicate.push_sql(" is not null");
			predicate
		}
		ComparisonOp::Eq => binary(fragment, "=", value),
		// neq matches nulls too: a row without a value is "not equal"
		ComparisonOp::Neq => {
			let mut predicate = binary(fragment.clone(), "!=", value);
			predicate.push_sql(" or ");
			predicate.push(fragment);
			predicate.push_sql(" is null");
			predicate.wrap("(", ")")
		}
		ComparisonOp::Gt => binary(fragment, ">", value),
		ComparisonOp::Ge => binary(fragment, ">=", value),
		ComparisonOp::Lt => binary(fragment, "<", value),
		ComparisonOp::Le => binary(fragment, "<=", value),
		ComparisonOp::Like => binary(fragment, "like", value),
		ComparisonOp::NotLike => binary(fragment, "not like", value),
		ComparisonOp::In => in_list(fragment, value),
		ComparisonOp::Blank => blank(fragment, abstract_type, ctx.dialect),
		ComparisonOp::NotBlank => blank(fragment, abstract_type, ctx.dialect).wrap("not ", ""),
	})
}

fn supported(op: ComparisonOp, abstract_type: AbstractType) -> bool {
	use ComparisonOp::*;
	match abstract_type {
		AbstractType::Text => true,
		AbstractType::Number | AbstractType::Temporal => !matches!(op, Like | NotLike),
		AbstractType::Boolean => matches!(op, Eq | Neq | Blank | NotBlank),
		AbstractType::Json => matches!(op, Eq | Neq | Blank | NotBlank),
	}
}

fn binary(fragment: RawSql, op: &str, value: &Value) -> RawSql {
	let mut predicate = fragment;
	predicate.push_sql(&format!(" {op} "));
	predicate.push(RawSql::value(value.clone()));
	predicate
}

fn in_list(fragment: RawSql, value: &Value) -> RawSql {
	let items: Vec<Value> = match value {
		Value::Json(serde_json::Value::Array(items)) => {
			items.iter().cloned().map(Value::from_json).collect()
		}
		Value::Null => Vec::new(),
		other => vec![other.clone()],
	};
	if items.is_empty() {
		// IN over the empty set selects nothing
		return RawSql::lit("1 = 0");
	}
	let mut predicate = fragment;
	predicate.push_sql(" in (");
	predicate.push(RawSql::join(items.into_iter().map(RawSql::value), ", "));
	predicate.push_sql(")");
	predicate
}

fn blank(fragment: RawSql, abstract_type: AbstractType, dialect: Dialect) -> RawSql {
	match abstract_type {
		AbstractType::Text => {
			let mut predicate = fragment.clone();
			predicate.push_sql(" is null or ");
			predicate.push(fragment);
			predicate.push_sql(" = ");
			predicate.push(RawSql::value(""));
			predicate.wrap("(", ")")
		}
		AbstractType::Json => json_empty(dialect, fragment),
		_ => {
			let mut predicate = fragment;
			predicate.push_sql(" is null");
			predicate.wrap("(", ")")
		}
	}
}

/// The dialect-specific JSON emptiness test: NULL, `{}` or `[]`.
fn json_empty(dialect: Dialect, fragment: RawSql) -> RawSql {
	match dialect {
		Dialect::MySql => {
			let mut predicate = fragment.clone();
			predicate.push_sql(" is null or json_length(");
			predicate.push(fragment);
			predicate.push_sql(") = 0");
			predicate.wrap("(", ")")
		}
		Dialect::Postgres | Dialect::Sqlite => {
			let cast = if dialect == Dialect::Postgres {
				"::text"
			} else {
				""
			};
			let mut predicate = fragment.clone();
			predicate.push_sql(" is null or ");
			let mut eq_obj = fragment.clone();
			eq_obj.push_sql(cast);
			eq_obj.push_sql(" = ");
			eq_obj.push(RawSql::value("{}"));
			predicate.push(eq_obj);
			predicate.push_sql(" or ");
			let mut eq_arr = fragment;
			eq_arr.push_sql(cast);
			eq_arr.push_sql(" = ");
			eq_arr.push(RawSql::value("[]"));
			predicate.push(eq_arr);
			predicate.wrap("(", ")")
		}
	}
}

fn is_empty_text(value: &Value) -> bool {
	value.as_str() == Some("")
}
