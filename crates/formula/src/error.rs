// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 Gridbase

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
	#[error("formula parse failed at `{fragment}`: {reason}")]
	Parse {
		/// The offending substring of the expression.
		fragment: String,
		reason: String,
	},

	#[error("unknown function `{name}` in `{fragment}`")]
	UnknownFunction {
		name: String,
		fragment: String,
	},

	#[error("function `{name}` expects at least {expected} argument(s), {actual} given")]
	ArityMismatch {
		name: String,
		expected: usize,
		actual: usize,
	},

	#[error(transparent)]
	Sql(#[from] gridbase_sql::Error),
}
