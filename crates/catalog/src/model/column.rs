// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 Gridbase

use std::collections::HashSet;

use gridbase_type::{AbstractType, ColumnId, RollupFn, TableId, Uidt};
use serde::{Deserialize, Serialize};

/// A column of exactly one table. `column_name` is `None` for purely
/// virtual columns (rollup, lookup, formula, link), which have no physical
/// storage of their own.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ColumnMeta {
	pub id: ColumnId,
	pub fk_table_id: TableId,
	pub title: String,
	pub column_name: Option<String>,
	pub uidt: Uidt,
	pub options: ColumnOptions,
	/// Part of the composite primary key.
	pub pk: bool,
	/// The table's primary-value (display title) column; at most one
	/// per table.
	pub pv: bool,
}

impl ColumnMeta {
	/// The abstract type used for aggregate validation and filter
	/// predicate mapping.
	pub fn abstract_type(&self) -> AbstractType {
		self.uidt.abstract_type().unwrap_or(AbstractType::Text)
	}

	/// Column ids this column's configuration references. Used to
	/// detect cascades when a referenced column is renamed or deleted.
	pub fn dependencies(&self) -> HashSet<ColumnId> {
		match &self.options {
			ColumnOptions::Plain => HashSet::new(),
			ColumnOptions::Link(link) => {
				HashSet::from([link.child_column_id.clone(), link.parent_column_id.clone()])
			}
			ColumnOptions::Rollup(rollup) => {
				HashSet::from([rollup.link_column_id.clone(), rollup.target_column_id.clone()])
			}
			ColumnOptions::Lookup(lookup) => {
				HashSet::from([lookup.link_column_id.clone(), lookup.target_column_id.clone()])
			}
			ColumnOptions::Formula(_) => HashSet::new(),
		}
	}
}

/// Type-specific options payload, one case per `uidt`. Closed by
/// construction: a variant carries only the fields valid for its kind.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ColumnOptions {
	Plain,
	Link(LinkOptions),
	Rollup(RollupOptions),
	Lookup(LookupOptions),
	Formula(FormulaOptions),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationType {
	HasMany,
	BelongsTo,
	ManyToMany,
}

/// How two tables connect. Shared by both participating tables; the child
/// column holds the foreign key, the parent column the referenced key.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LinkOptions {
	pub relation_type: RelationType,
	pub child_column_id: ColumnId,
	pub parent_column_id: ColumnId,
	/// Junction table, many-to-many only.
	pub junction_table_id: Option<TableId>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RollupOptions {
	/// The link column the rollup aggregates through.
	pub link_column_id: ColumnId,
	/// The column on the related table fed into the aggregate.
	pub target_column_id: ColumnId,
	pub function: RollupFn,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LookupOptions {
	pub link_column_id: ColumnId,
	pub target_column_id: ColumnId,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FormulaOptions {
	/// The raw user-entered expression; parsed and cached by the
	/// formula compiler keyed on (expression, dialect).
	pub expression: String,
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_rollup_dependencies() {
		let column = ColumnMeta {
			id: ColumnId::from("col_r"),
			fk_table_id: TableId::from("tbl_1"),
			title: "Total".to_string(),
			column_name: None,
			uidt: Uidt::Rollup,
			options: ColumnOptions::Rollup(RollupOptions {
				link_column_id: ColumnId::from("col_link"),
				target_column_id: ColumnId::from("col_target"),
				function: RollupFn::Sum,
			}),
			pk: false,
			pv: false,
		};

		let deps = column.dependencies();
		assert!(deps.contains(&ColumnId::from("col_link")));
		assert!(deps.contains(&ColumnId::from("col_target")));
		assert_eq!(deps.len(), 2);
	}

	#[test]
	fn test_options_serde_tagged() {
		let options = ColumnOptions::Lookup(LookupOptions {
			link_column_id: ColumnId::from("col_l"),
			target_column_id: ColumnId::from("col_t"),
		});
		let json = serde_json::to_value(&options).unwrap();
		assert_eq!(json["kind"], "lookup");
		let back: ColumnOptions = serde_json::from_value(json).unwrap();
		assert_eq!(back, options);
	}
}
