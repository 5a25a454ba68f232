// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 Gridbase

use gridbase_type::{ColumnId, ConfigError};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
	#[error(transparent)]
	Config(#[from] ConfigError),

	#[error(transparent)]
	Catalog(#[from] gridbase_catalog::Error),

	#[error(transparent)]
	Formula(#[from] gridbase_formula::Error),

	#[error(transparent)]
	Sql(#[from] gridbase_sql::Error),

	/// A link column has no scalar value; the query builder consumes
	/// its join spec instead of splicing it into a select list.
	#[error("column `{column}` is a link and cannot be selected as a scalar")]
	NotSelectable {
		column: ColumnId,
	},

	#[error("column `{column}` is not a link")]
	NotALink {
		column: ColumnId,
	},

	#[error("column `{column}` has no physical storage name")]
	MissingPhysicalName {
		column: ColumnId,
	},

	#[error("column `{column}` participates in a circular reference")]
	CircularReference {
		column: ColumnId,
	},
}
