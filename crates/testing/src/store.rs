// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 Gridbase

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;
use gridbase_catalog::{CacheScope, Error, MetaStore, Result};

/// In-memory metadata store for tests. Supports fault injection so the
/// populate-on-miss error path can be exercised.
#[derive(Debug, Default)]
pub struct MemoryMetaStore {
	rows: DashMap<(CacheScope, String), serde_json::Value>,
	fail_reads: AtomicBool,
}

impl MemoryMetaStore {
	pub fn new() -> Self {
		Self::default()
	}

	/// Seed a row directly, bypassing the catalog.
	pub fn seed(&self, scope: CacheScope, key: &str, value: serde_json::Value) {
		self.rows.insert((scope, key.to_string()), value);
	}

	pub fn contains(&self, scope: CacheScope, key: &str) -> bool {
		self.rows.contains_key(&(scope, key.to_string()))
	}

	/// Make every subsequent read fail, to prove fetch errors propagate
	/// instead of turning into "not found".
	pub fn fail_reads(&self, fail: bool) {
		self.fail_reads.store(fail, Ordering::SeqCst);
	}

	fn check_read(&self) -> Result<()> {
		if self.fail_reads.load(Ordering::SeqCst) {
			return Err(Error::Store {
				reason: "injected read failure".to_string(),
			});
		}
		Ok(())
	}
}

#[async_trait]
impl MetaStore for MemoryMetaStore {
	async fn fetch(&self, scope: CacheScope, key: &str) -> Result<Option<serde_json::Value>> {
		self.check_read()?;
		Ok(self.rows.get(&(scope, key.to_string())).map(|row| row.value().clone()))
	}

	async fn fetch_children(&self, scope: CacheScope, parent: &str) -> Result<Vec<serde_json::Value>> {
		self.check_read()?;
		let parent_field = match scope {
			CacheScope::Column | CacheScope::View => "fk_table_id",
			CacheScope::Table => "source_id",
			CacheScope::Source => return Ok(Vec::new()),
		};
		Ok(self
			.rows
			.iter()
			.filter(|row| row.key().0 == scope && row.value()[parent_field] == parent)
			.map(|row| row.value().clone())
			.collect())
	}

	async fn insert(&self, scope: CacheScope, key: &str, value: serde_json::Value) -> Result<()> {
		self.rows.insert((scope, key.to_string()), value);
		Ok(())
	}

	async fn update(&self, scope: CacheScope, key: &str, value: serde_json::Value) -> Result<()> {
		self.rows.insert((scope, key.to_string()), value);
		Ok(())
	}

	async fn remove(&self, scope: CacheScope, key: &str) -> Result<()> {
		self.rows.remove(&(scope, key.to_string()));
		Ok(())
	}
}
