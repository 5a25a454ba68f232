// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 Gridbase

use gridbase_type::{ResolveError, TableId};
use tracing::instrument;

use crate::{
	CacheScope, DelDirection, Result,
	catalog::{Catalog, encode},
	model::TableMeta,
};

impl Catalog {
	#[instrument(name = "catalog::table::find", level = "trace", skip(self))]
	pub async fn find_table(&self, id: &TableId) -> Result<Option<TableMeta>> {
		let table: Option<TableMeta> = self.fetch_cached(CacheScope::Table, id.as_str()).await?;
		// register under the source so dropping a source cascades
		if let Some(meta) = &table {
			self.cache().append_to_list(CacheScope::Source, meta.source_id.as_str(), &[(
				CacheScope::Table,
				id.0.clone(),
			)]);
		}
		Ok(table)
	}

	/// Resolve or fail with `TableNotFound`; never falls back to a
	/// different table.
	pub async fn table(&self, id: &TableId) -> Result<TableMeta> {
		self.find_table(id).await?.ok_or_else(|| {
			ResolveError::TableNotFound {
				table: id.clone(),
			}
			.into()
		})
	}

	#[instrument(name = "catalog::table::create", level = "trace", skip(self, table))]
	pub async fn create_table(&self, table: TableMeta) -> Result<TableMeta> {
		let key = table.id.0.clone();
		let value = encode(CacheScope::Table, &key, &table)?;
		self.store().insert(CacheScope::Table, &key, value.clone()).await?;
		self.cache().set(CacheScope::Table, &key, value);
		self.cache().append_to_list(CacheScope::Source, table.source_id.as_str(), &[(
			CacheScope::Table,
			key,
		)]);
		Ok(table)
	}

	#[instrument(name = "catalog::table::update", level = "trace", skip(self, table))]
	pub async fn update_table(&self, table: TableMeta) -> Result<TableMeta> {
		let key = table.id.0.clone();
		let value = encode(CacheScope::Table, &key, &table)?;
		self.store().update(CacheScope::Table, &key, value.clone()).await?;
		// wholesale replace keeps the entry atomic for readers
		self.cache().set(CacheScope::Table, &key, value);
		Ok(table)
	}

	/// Delete a table, its columns and its views, then cascade the
	/// cache drop so no stale child entry survives.
	#[instrument(name = "catalog::table::delete", level = "trace", skip(self))]
	pub async fn delete_table(&self, id: &TableId) -> Result<()> {
		let table = self.table(id).await?;
		for column_id in &table.column_ids {
			self.store().remove(CacheScope::Column, column_id.as_str()).await?;
		}
		for view in self.views_for_table(id).await? {
			self.store().remove(CacheScope::View, view.id.as_str()).await?;
		}
		self.store().remove(CacheScope::Table, id.as_str()).await?;
		self.cache().deep_del(CacheScope::Table, id.as_str(), DelDirection::ChildToParent);
		Ok(())
	}
}
