// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 Gridbase

use std::fmt::{self, Display, Formatter};

use serde::{Deserialize, Serialize};

/// Cache scopes, one per cached entity kind. Keys are unique within a
/// scope; the full key used in exports is `scope:key`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheScope {
	Source,
	Table,
	Column,
	View,
}

impl CacheScope {
	/// The parent scope a child's list registration lives under; the
	/// child-to-parent walk of `deep_del` follows this.
	pub fn parent(&self) -> Option<CacheScope> {
		match self {
			CacheScope::Source => None,
			CacheScope::Table => Some(CacheScope::Source),
			CacheScope::Column | CacheScope::View => Some(CacheScope::Table),
		}
	}
}

impl Display for CacheScope {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		match self {
			CacheScope::Source => f.write_str("source"),
			CacheScope::Table => f.write_str("table"),
			CacheScope::Column => f.write_str("column"),
			CacheScope::View => f.write_str("view"),
		}
	}
}

/// Direction of a `deep_del` cascade.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DelDirection {
	/// Drop the key and every entry registered in its child lists,
	/// walking the child-to-parent linkage recorded by
	/// `append_to_list`. Deleting a table this way drops its cached
	/// columns and views without a second metadata read.
	ChildToParent,
	/// Drop only the key and its own list registrations; cached child
	/// entries survive.
	ParentToChild,
}
