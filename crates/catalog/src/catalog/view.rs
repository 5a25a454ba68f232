// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 Gridbase

use gridbase_type::{ResolveError, TableId, ViewId};
use tracing::instrument;

use crate::{
	CacheScope, Result,
	catalog::{Catalog, decode, encode},
	model::ViewMeta,
};

impl Catalog {
	#[instrument(name = "catalog::view::find", level = "trace", skip(self))]
	pub async fn find_view(&self, id: &ViewId) -> Result<Option<ViewMeta>> {
		let view: Option<ViewMeta> = self.fetch_cached(CacheScope::View, id.as_str()).await?;
		if let Some(meta) = &view {
			self.cache().append_to_list(CacheScope::Table, meta.fk_table_id.as_str(), &[(
				CacheScope::View,
				id.0.clone(),
			)]);
		}
		Ok(view)
	}

	pub async fn view(&self, id: &ViewId) -> Result<ViewMeta> {
		self.find_view(id).await?.ok_or_else(|| {
			ResolveError::ViewNotFound {
				view: id.clone(),
			}
			.into()
		})
	}

	/// All views of a table, straight from the store (no per-table view
	/// list is cached; individual views populate on the way through).
	#[instrument(name = "catalog::view::list", level = "trace", skip(self))]
	pub async fn views_for_table(&self, table_id: &TableId) -> Result<Vec<ViewMeta>> {
		let rows = self.store().fetch_children(CacheScope::View, table_id.as_str()).await?;
		let mut views = Vec::with_capacity(rows.len());
		for row in rows {
			let view: ViewMeta = decode(CacheScope::View, table_id.as_str(), &row)?;
			self.cache().set(CacheScope::View, view.id.as_str(), row);
			self.cache().append_to_list(CacheScope::Table, table_id.as_str(), &[(
				CacheScope::View,
				view.id.0.clone(),
			)]);
			views.push(view);
		}
		Ok(views)
	}

	#[instrument(name = "catalog::view::create", level = "trace", skip(self, view))]
	pub async fn create_view(&self, view: ViewMeta) -> Result<ViewMeta> {
		let key = view.id.0.clone();
		let value = encode(CacheScope::View, &key, &view)?;
		self.store().insert(CacheScope::View, &key, value.clone()).await?;
		self.cache().set(CacheScope::View, &key, value);
		self.cache().append_to_list(CacheScope::Table, view.fk_table_id.as_str(), &[(
			CacheScope::View,
			key,
		)]);
		Ok(view)
	}

	#[instrument(name = "catalog::view::update", level = "trace", skip(self, view))]
	pub async fn update_view(&self, view: ViewMeta) -> Result<ViewMeta> {
		let key = view.id.0.clone();
		let value = encode(CacheScope::View, &key, &view)?;
		self.store().update(CacheScope::View, &key, value.clone()).await?;
		self.cache().set(CacheScope::View, &key, value);
		Ok(view)
	}

	#[instrument(name = "catalog::view::delete", level = "trace", skip(self))]
	pub async fn delete_view(&self, id: &ViewId) -> Result<()> {
		self.store().remove(CacheScope::View, id.as_str()).await?;
		self.cache().del(CacheScope::View, id.as_str());
		Ok(())
	}
}
