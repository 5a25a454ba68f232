// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 Gridbase

mod column;
mod filter;
mod table;
mod view;

pub use column::{
	ColumnMeta, ColumnOptions, FormulaOptions, LinkOptions, LookupOptions, RelationType, RollupOptions,
};
pub use filter::{ComparisonOp, FilterNode, FilterTree, LogicalOp};
pub use table::TableMeta;
pub use view::{Sort, SortDirection, ViewColumn, ViewMeta};
