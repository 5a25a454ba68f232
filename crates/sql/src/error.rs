// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 Gridbase

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
	#[error("template `{template}` expects {expected} bindings, {actual} were supplied")]
	BindingCountMismatch {
		template: String,
		expected: usize,
		actual: usize,
	},

	#[error("placeholder {position} in `{template}` expects {expected}, a {actual} was bound")]
	BindingKindMismatch {
		template: String,
		position: usize,
		expected: &'static str,
		actual: &'static str,
	},
}
