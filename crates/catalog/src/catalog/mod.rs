// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 Gridbase

mod column;
mod table;
mod view;

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::{CacheScope, Error, MetaCache, MetaStore, Result};

/// Read-through/write-through metadata service.
///
/// Reads check the [`MetaCache`] first and fall back to the [`MetaStore`],
/// populating the cache on the way out. Every mutator persists first, then
/// updates the cache before returning — the cache is synchronously
/// consistent with the last completed write from this process.
///
/// Constructed once per process and passed by handle; there is no global.
#[derive(Clone)]
pub struct Catalog {
	cache: Arc<MetaCache>,
	store: Arc<dyn MetaStore>,
}

impl Catalog {
	pub fn new(cache: Arc<MetaCache>, store: Arc<dyn MetaStore>) -> Self {
		Self {
			cache,
			store,
		}
	}

	pub fn cache(&self) -> &Arc<MetaCache> {
		&self.cache
	}

	pub fn store(&self) -> &Arc<dyn MetaStore> {
		&self.store
	}

	/// Read-through fetch: cache hit, or store fetch + populate. Store
	/// errors propagate; they are never treated as "not found".
	pub(crate) async fn fetch_cached<T: DeserializeOwned>(
		&self,
		scope: CacheScope,
		key: &str,
	) -> Result<Option<T>> {
		if let Some(value) = self.cache.get(scope, key) {
			return Ok(Some(decode(scope, key, value.as_ref())?));
		}

		let Some(value) = self.store.fetch(scope, key).await? else {
			return Ok(None);
		};
		let decoded = decode(scope, key, &value)?;
		self.cache.set(scope, key, value);
		Ok(Some(decoded))
	}
}

pub(crate) fn decode<T: DeserializeOwned>(scope: CacheScope, key: &str, value: &serde_json::Value) -> Result<T> {
	serde_json::from_value(value.clone()).map_err(|err| Error::Corrupt {
		scope,
		key: key.to_string(),
		reason: err.to_string(),
	})
}

pub(crate) fn encode<T: Serialize>(scope: CacheScope, key: &str, value: &T) -> Result<serde_json::Value> {
	serde_json::to_value(value).map_err(|err| Error::Corrupt {
		scope,
		key: key.to_string(),
		reason: err.to_string(),
	})
}
