// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 Gridbase

use gridbase_type::ResolveError;

use crate::CacheScope;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
	#[error(transparent)]
	Resolve(#[from] ResolveError),

	/// A persistent-store read or write failed; populate-on-miss
	/// failures surface here instead of masquerading as "not found".
	#[error("metadata store operation failed: {reason}")]
	Store {
		reason: String,
	},

	#[error("metadata under {scope}:{key} could not be deserialized: {reason}")]
	Corrupt {
		scope: CacheScope,
		key: String,
		reason: String,
	},
}
