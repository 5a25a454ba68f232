// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 Gridbase

use gridbase_type::{ColumnId, ConfigError, ResolveError, TableId};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
	#[error(transparent)]
	Resolve(#[from] ResolveError),

	#[error(transparent)]
	Config(#[from] ConfigError),

	#[error(transparent)]
	Catalog(#[from] gridbase_catalog::Error),

	#[error(transparent)]
	Column(#[from] gridbase_column::Error),

	#[error(transparent)]
	Formula(#[from] gridbase_formula::Error),

	#[error(transparent)]
	Sql(#[from] gridbase_sql::Error),

	/// Driver failure, surfaced once with the driver message attached.
	/// Zero retries at this layer.
	#[error("storage operation failed: {reason}")]
	Storage {
		reason: String,
	},

	#[error("operation timed out after {elapsed_ms}ms")]
	Timeout {
		elapsed_ms: u64,
	},

	/// Row-addressed operations need at least one primary-key column.
	#[error("table `{table}` has no primary key column")]
	MissingPrimaryKey {
		table: TableId,
	},

	/// A bulk row omitted the value for its key column.
	#[error("bulk row is missing a value for key column `{column}`")]
	MissingKeyValue {
		column: ColumnId,
	},
}
