// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 Gridbase

use gridbase_type::{ColumnId, SourceId, TableId};
use serde::{Deserialize, Serialize};

/// A logical relation: display title, physical storage name and the
/// ordered set of columns it owns.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TableMeta {
	pub id: TableId,
	pub source_id: SourceId,
	pub title: String,
	/// Physical storage name in the backing database.
	pub table_name: String,
	/// Ordered column ids; the order is the table's canonical column
	/// order before any per-view override.
	pub column_ids: Vec<ColumnId>,
}

impl TableMeta {
	pub fn new(
		id: impl Into<TableId>,
		source_id: impl Into<SourceId>,
		title: impl Into<String>,
		table_name: impl Into<String>,
	) -> Self {
		Self {
			id: id.into(),
			source_id: source_id.into(),
			title: title.into(),
			table_name: table_name.into(),
			column_ids: Vec::new(),
		}
	}
}
