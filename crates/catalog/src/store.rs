// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 Gridbase

use async_trait::async_trait;

use crate::{CacheScope, Result};

/// The persistent metadata store boundary.
///
/// The catalog never bypasses this for the first read of any entity; it
/// only bypasses it on cache hits. Implementations live outside the engine
/// (the real one is backed by the meta database; tests use an in-memory
/// fake).
#[async_trait]
pub trait MetaStore: Send + Sync {
	async fn fetch(&self, scope: CacheScope, key: &str) -> Result<Option<serde_json::Value>>;

	/// All entries of `scope` belonging to `parent` (for example every
	/// column row of one table).
	async fn fetch_children(&self, scope: CacheScope, parent: &str) -> Result<Vec<serde_json::Value>>;

	async fn insert(&self, scope: CacheScope, key: &str, value: serde_json::Value) -> Result<()>;

	async fn update(&self, scope: CacheScope, key: &str, value: serde_json::Value) -> Result<()>;

	async fn remove(&self, scope: CacheScope, key: &str) -> Result<()>;
}
