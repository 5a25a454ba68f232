// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 Gridbase

use std::time::Duration;

/// Request scope an engine instance operates under. The engine itself is
/// request-scoped; only the metadata cache is shared between requests.
#[derive(Clone, Debug, Default)]
pub struct EngineContext {
	pub workspace_id: String,
	pub base_id: String,
	/// Upper bound for any single driver round-trip. `None` waits
	/// indefinitely.
	pub timeout: Option<Duration>,
}

impl EngineContext {
	pub fn new(workspace_id: impl Into<String>, base_id: impl Into<String>) -> Self {
		Self {
			workspace_id: workspace_id.into(),
			base_id: base_id.into(),
			timeout: None,
		}
	}

	pub fn with_timeout(mut self, timeout: Duration) -> Self {
		self.timeout = Some(timeout);
		self
	}
}
