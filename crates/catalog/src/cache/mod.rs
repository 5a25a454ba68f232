// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 Gridbase

mod scope;

use std::sync::Arc;

use dashmap::DashMap;
use serde_json::json;
use tracing::trace;

pub use scope::{CacheScope, DelDirection};

type FullKey = (CacheScope, String);

/// Process-wide metadata cache.
///
/// Entries are immutable values replaced wholesale on every write, so a
/// reader holding an `Arc` always sees a consistent snapshot of one entry;
/// only the maps themselves are synchronized. The cache is synchronously
/// consistent with the last completed metadata write from this process —
/// every mutator updates it before returning. It makes no cross-process
/// guarantee; the persistent store stays the source of truth on cold start.
#[derive(Debug, Default)]
pub struct MetaCache {
	entries: DashMap<FullKey, Arc<serde_json::Value>>,
	/// Parent list registrations: (scope, parent key) -> child full
	/// keys, used by `deep_del` to cascade without a metadata read.
	lists: DashMap<FullKey, Vec<FullKey>>,
}

impl MetaCache {
	pub fn new() -> Self {
		Self::default()
	}

	/// Never touches the persistent store; a miss returns `None` and
	/// the caller populates.
	pub fn get(&self, scope: CacheScope, key: &str) -> Option<Arc<serde_json::Value>> {
		self.entries.get(&(scope, key.to_string())).map(|entry| Arc::clone(entry.value()))
	}

	/// Unconditional overwrite, used both on populate-after-miss and on
	/// update. The entry is replaced as a whole, never mutated in place.
	pub fn set(&self, scope: CacheScope, key: &str, value: serde_json::Value) {
		trace!(%scope, key, "cache set");
		self.entries.insert((scope, key.to_string()), Arc::new(value));
	}

	/// Merge fields into an existing cached object. A miss is a no-op
	/// by contract: the populate-on-miss path recovers, so an absent
	/// key is never an error here.
	pub fn update(&self, scope: CacheScope, key: &str, partial: serde_json::Value) {
		let Some(mut entry) = self.entries.get_mut(&(scope, key.to_string())) else {
			return;
		};
		let mut merged = entry.value().as_ref().clone();
		if let (Some(target), Some(fields)) = (merged.as_object_mut(), partial.as_object()) {
			for (field, value) in fields {
				target.insert(field.clone(), value.clone());
			}
		}
		// single atomic replace; readers see old or new, never a torn mix
		*entry.value_mut() = Arc::new(merged);
	}

	/// Delete one entry and drop its registration from any parent list.
	/// Absent keys are a no-op.
	pub fn del(&self, scope: CacheScope, key: &str) {
		let full = (scope, key.to_string());
		self.entries.remove(&full);
		if let Some(parent_scope) = scope.parent() {
			for mut list in self.lists.iter_mut() {
				if list.key().0 == parent_scope {
					list.value_mut().retain(|child| child != &full);
				}
			}
		}
	}

	/// Delete an entry together with its appended child lists.
	pub fn deep_del(&self, scope: CacheScope, key: &str, direction: DelDirection) {
		let full = (scope, key.to_string());
		if direction == DelDirection::ChildToParent {
			if let Some((_, children)) = self.lists.remove(&full) {
				for (child_scope, child_key) in children {
					self.deep_del(child_scope, &child_key, direction);
				}
			}
		} else {
			self.lists.remove(&full);
		}
		self.del(scope, key);
	}

	/// Register child keys under a parent's list for cascade deletion.
	/// Duplicate appends are idempotent.
	pub fn append_to_list(&self, scope: CacheScope, list_key: &str, children: &[(CacheScope, String)]) {
		let mut list = self.lists.entry((scope, list_key.to_string())).or_default();
		for child in children {
			if !list.contains(child) {
				list.push(child.clone());
			}
		}
	}

	/// Administrative dump keyed `scope:key`; diagnostics only, not a
	/// stable wire contract.
	pub fn export(&self) -> serde_json::Value {
		let mut dump = serde_json::Map::new();
		for entry in self.entries.iter() {
			let (scope, key) = entry.key();
			dump.insert(format!("{scope}:{key}"), entry.value().as_ref().clone());
		}
		json!(dump)
	}

	/// Administrative flush of everything.
	pub fn destroy(&self) {
		self.entries.clear();
		self.lists.clear();
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_get_miss_returns_none() {
		let cache = MetaCache::new();
		assert!(cache.get(CacheScope::Table, "tbl_1").is_none());
	}

	#[test]
	fn test_set_then_get() {
		let cache = MetaCache::new();
		cache.set(CacheScope::Table, "tbl_1", json!({"title": "City"}));
		let value = cache.get(CacheScope::Table, "tbl_1").unwrap();
		assert_eq!(value.as_ref(), &json!({"title": "City"}));
	}

	#[test]
	fn test_set_overwrites() {
		let cache = MetaCache::new();
		cache.set(CacheScope::Table, "tbl_1", json!({"title": "City"}));
		cache.set(CacheScope::Table, "tbl_1", json!({"title": "Town"}));
		let value = cache.get(CacheScope::Table, "tbl_1").unwrap();
		assert_eq!(value["title"], "Town");
	}

	#[test]
	fn test_update_merges_fields() {
		let cache = MetaCache::new();
		cache.set(CacheScope::Column, "col_1", json!({"title": "Name", "pk": false}));
		cache.update(CacheScope::Column, "col_1", json!({"title": "Full Name"}));
		let value = cache.get(CacheScope::Column, "col_1").unwrap();
		assert_eq!(value["title"], "Full Name");
		assert_eq!(value["pk"], false);
	}

	#[test]
	fn test_update_absent_is_noop() {
		let cache = MetaCache::new();
		cache.update(CacheScope::Column, "col_404", json!({"title": "x"}));
		assert!(cache.get(CacheScope::Column, "col_404").is_none());
	}

	#[test]
	fn test_del_absent_is_noop() {
		let cache = MetaCache::new();
		cache.del(CacheScope::Column, "col_404");
	}

	#[test]
	fn test_old_snapshot_survives_overwrite() {
		let cache = MetaCache::new();
		cache.set(CacheScope::Table, "tbl_1", json!({"title": "City"}));
		let snapshot = cache.get(CacheScope::Table, "tbl_1").unwrap();
		cache.set(CacheScope::Table, "tbl_1", json!({"title": "Town"}));
		// the reader's Arc still sees the value it read
		assert_eq!(snapshot["title"], "City");
		assert_eq!(cache.get(CacheScope::Table, "tbl_1").unwrap()["title"], "Town");
	}

	#[test]
	fn test_deep_del_drops_registered_children() {
		let cache = MetaCache::new();
		cache.set(CacheScope::Table, "tbl_1", json!({"title": "City"}));
		cache.set(CacheScope::Column, "col_1", json!({"title": "id"}));
		cache.set(CacheScope::Column, "col_2", json!({"title": "name"}));
		cache.set(CacheScope::View, "vw_1", json!({"title": "Default"}));
		cache.append_to_list(CacheScope::Table, "tbl_1", &[
			(CacheScope::Column, "col_1".to_string()),
			(CacheScope::Column, "col_2".to_string()),
			(CacheScope::View, "vw_1".to_string()),
		]);

		cache.deep_del(CacheScope::Table, "tbl_1", DelDirection::ChildToParent);

		assert!(cache.get(CacheScope::Table, "tbl_1").is_none());
		assert!(cache.get(CacheScope::Column, "col_1").is_none());
		assert!(cache.get(CacheScope::Column, "col_2").is_none());
		assert!(cache.get(CacheScope::View, "vw_1").is_none());
	}

	#[test]
	fn test_parent_to_child_leaves_children() {
		let cache = MetaCache::new();
		cache.set(CacheScope::Table, "tbl_1", json!({}));
		cache.set(CacheScope::Column, "col_1", json!({}));
		cache.append_to_list(CacheScope::Table, "tbl_1", &[(CacheScope::Column, "col_1".to_string())]);

		cache.deep_del(CacheScope::Table, "tbl_1", DelDirection::ParentToChild);

		assert!(cache.get(CacheScope::Table, "tbl_1").is_none());
		assert!(cache.get(CacheScope::Column, "col_1").is_some());
	}

	#[test]
	fn test_append_is_idempotent() {
		let cache = MetaCache::new();
		cache.append_to_list(CacheScope::Table, "tbl_1", &[(CacheScope::Column, "col_1".to_string())]);
		cache.append_to_list(CacheScope::Table, "tbl_1", &[(CacheScope::Column, "col_1".to_string())]);
		let list = cache.lists.get(&(CacheScope::Table, "tbl_1".to_string())).unwrap();
		assert_eq!(list.len(), 1);
	}

	#[test]
	fn test_del_unregisters_from_parent_list() {
		let cache = MetaCache::new();
		cache.set(CacheScope::Column, "col_1", json!({}));
		cache.append_to_list(CacheScope::Table, "tbl_1", &[(CacheScope::Column, "col_1".to_string())]);

		cache.del(CacheScope::Column, "col_1");

		let list = cache.lists.get(&(CacheScope::Table, "tbl_1".to_string())).unwrap();
		assert!(list.is_empty());
	}

	#[test]
	fn test_export_keyed_scope_colon_key() {
		let cache = MetaCache::new();
		cache.set(CacheScope::Table, "tbl_1", json!({"title": "City"}));
		let dump = cache.export();
		assert_eq!(dump["table:tbl_1"]["title"], "City");
	}

	#[test]
	fn test_destroy_flushes_everything() {
		let cache = MetaCache::new();
		cache.set(CacheScope::Table, "tbl_1", json!({}));
		cache.append_to_list(CacheScope::Table, "tbl_1", &[(CacheScope::Column, "col_1".to_string())]);
		cache.destroy();
		assert!(cache.get(CacheScope::Table, "tbl_1").is_none());
		assert_eq!(cache.export(), json!({}));
	}

	#[test]
	fn test_last_write_wins_sequence() {
		// a get never returns anything but the last non-deleting write
		let cache = MetaCache::new();
		cache.set(CacheScope::Column, "col_1", json!({"v": 1}));
		cache.update(CacheScope::Column, "col_1", json!({"v": 2}));
		assert_eq!(cache.get(CacheScope::Column, "col_1").unwrap()["v"], 2);
		cache.del(CacheScope::Column, "col_1");
		assert!(cache.get(CacheScope::Column, "col_1").is_none());
		cache.set(CacheScope::Column, "col_1", json!({"v": 3}));
		assert_eq!(cache.get(CacheScope::Column, "col_1").unwrap()["v"], 3);
	}
}
