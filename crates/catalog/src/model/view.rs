// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 Gridbase

use gridbase_type::{ColumnId, TableId, ViewId};
use serde::{Deserialize, Serialize};

use crate::model::FilterTree;

/// A saved filter/sort/visible-column configuration over a table. A view
/// never mutates the table; it only changes what is applied at read time.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ViewMeta {
	pub id: ViewId,
	pub fk_table_id: TableId,
	pub title: String,
	/// Per-view column overrides, in view order.
	pub columns: Vec<ViewColumn>,
	pub filter: Option<FilterTree>,
	pub sorts: Vec<Sort>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ViewColumn {
	pub column_id: ColumnId,
	pub show: bool,
	pub order: u32,
	pub width: Option<u32>,
}

impl ViewColumn {
	pub fn visible(column_id: impl Into<ColumnId>, order: u32) -> Self {
		Self {
			column_id: column_id.into(),
			show: true,
			order,
			width: None,
		}
	}
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Sort {
	pub column_id: ColumnId,
	pub direction: SortDirection,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
	Asc,
	Desc,
}

impl SortDirection {
	pub fn sql(&self) -> &'static str {
		match self {
			SortDirection::Asc => "asc",
			SortDirection::Desc => "desc",
		}
	}
}
