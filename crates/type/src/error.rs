// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 Gridbase

use crate::{AbstractType, ColumnId, RollupFn, TableId, ViewId};

/// Configuration errors, detected at column/view create-or-update time or
/// when compiling filters. Always surfaced to the caller, never defaulted.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
	#[error("aggregate `{function}` is not valid for {target_type} column `{column}`")]
	InvalidAggregateForType {
		function: RollupFn,
		target_type: AbstractType,
		column: ColumnId,
	},

	#[error("column `{column}` references `{referenced}` which does not exist")]
	DanglingColumnReference {
		column: ColumnId,
		referenced: ColumnId,
	},

	#[error("comparison operator `{operator}` is not supported for {abstract_type} column `{column}`")]
	UnsupportedComparisonOperator {
		operator: String,
		abstract_type: AbstractType,
		column: ColumnId,
	},

	#[error("lookup `{column}` recurses through a has-many lookup; only one has-many hop is supported")]
	LookupDepthExceeded {
		column: ColumnId,
	},
}

/// Resolution errors: the caller supplied an id that does not resolve
/// against the current metadata. Client errors, never a silent fallback.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ResolveError {
	#[error("table `{table}` not found")]
	TableNotFound {
		table: TableId,
	},

	#[error("view `{view}` not found")]
	ViewNotFound {
		view: ViewId,
	},

	#[error("column `{column}` not found")]
	ColumnNotFound {
		column: ColumnId,
	},
}
