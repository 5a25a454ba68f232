// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 Gridbase

use gridbase_catalog::model::{FilterTree, Sort};
use gridbase_type::{ColumnId, ViewId};

/// Parameters for `list`/`count`. A request-supplied filter combines with
/// the view's saved filter with AND; request sorts take precedence over
/// the view's.
#[derive(Clone, Debug, Default)]
pub struct ListParams {
	pub view: Option<ViewId>,
	pub filter: Option<FilterTree>,
	pub sorts: Vec<Sort>,
	pub limit: Option<u64>,
	pub offset: Option<u64>,
	/// Link columns to expand into nested records.
	pub expand: Vec<ColumnId>,
}

impl ListParams {
	pub fn for_view(view: impl Into<ViewId>) -> Self {
		Self {
			view: Some(view.into()),
			..Self::default()
		}
	}

	pub fn filtered(filter: FilterTree) -> Self {
		Self {
			filter: Some(filter),
			..Self::default()
		}
	}
}

#[derive(Clone, Debug, Default)]
pub struct ReadParams {
	pub view: Option<ViewId>,
	pub expand: Vec<ColumnId>,
}
