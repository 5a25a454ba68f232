// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 Gridbase

use gridbase_type::{ColumnId, ResolveError, TableId};
use tracing::instrument;

use crate::{
	CacheScope, Result,
	catalog::{Catalog, encode},
	model::ColumnMeta,
};

impl Catalog {
	#[instrument(name = "catalog::column::find", level = "trace", skip(self))]
	pub async fn find_column(&self, id: &ColumnId) -> Result<Option<ColumnMeta>> {
		let column: Option<ColumnMeta> = self.fetch_cached(CacheScope::Column, id.as_str()).await?;
		if let Some(meta) = &column {
			self.cache().append_to_list(CacheScope::Table, meta.fk_table_id.as_str(), &[(
				CacheScope::Column,
				id.0.clone(),
			)]);
		}
		Ok(column)
	}

	pub async fn column(&self, id: &ColumnId) -> Result<ColumnMeta> {
		self.find_column(id).await?.ok_or_else(|| {
			ResolveError::ColumnNotFound {
				column: id.clone(),
			}
			.into()
		})
	}

	/// All columns of a table in canonical order. A dangling id in the
	/// table's column list is a data-integrity error, not a silent
	/// skip.
	#[instrument(name = "catalog::column::list", level = "trace", skip(self))]
	pub async fn columns_for_table(&self, table_id: &TableId) -> Result<Vec<ColumnMeta>> {
		let table = self.table(table_id).await?;
		let mut columns = Vec::with_capacity(table.column_ids.len());
		for column_id in &table.column_ids {
			columns.push(self.column(column_id).await?);
		}
		Ok(columns)
	}

	/// The table's primary-value column, if one exists.
	pub async fn primary_value_column(&self, table_id: &TableId) -> Result<Option<ColumnMeta>> {
		Ok(self.columns_for_table(table_id).await?.into_iter().find(|column| column.pv))
	}

	/// The table's primary-key columns, in canonical order.
	pub async fn primary_key_columns(&self, table_id: &TableId) -> Result<Vec<ColumnMeta>> {
		Ok(self.columns_for_table(table_id).await?.into_iter().filter(|column| column.pk).collect())
	}

	/// Persist a new column, append it to the owning table's column
	/// list and populate the cache, all before returning.
	#[instrument(name = "catalog::column::create", level = "trace", skip(self, column))]
	pub async fn create_column(&self, column: ColumnMeta) -> Result<ColumnMeta> {
		let key = column.id.0.clone();
		let value = encode(CacheScope::Column, &key, &column)?;
		self.store().insert(CacheScope::Column, &key, value.clone()).await?;

		let mut table = self.table(&column.fk_table_id).await?;
		if !table.column_ids.contains(&column.id) {
			table.column_ids.push(column.id.clone());
			table = self.update_table(table).await?;
		}

		self.cache().set(CacheScope::Column, &key, value);
		self.cache().append_to_list(CacheScope::Table, table.id.as_str(), &[(CacheScope::Column, key)]);
		Ok(column)
	}

	#[instrument(name = "catalog::column::update", level = "trace", skip(self, column))]
	pub async fn update_column(&self, column: ColumnMeta) -> Result<ColumnMeta> {
		let key = column.id.0.clone();
		let value = encode(CacheScope::Column, &key, &column)?;
		self.store().update(CacheScope::Column, &key, value.clone()).await?;
		self.cache().set(CacheScope::Column, &key, value);
		Ok(column)
	}

	/// Rename keeps everything else intact; callers owning formula
	/// caches invalidate dependents after this returns.
	pub async fn rename_column(&self, id: &ColumnId, title: impl Into<String>) -> Result<ColumnMeta> {
		let mut column = self.column(id).await?;
		column.title = title.into();
		self.update_column(column).await
	}

	#[instrument(name = "catalog::column::delete", level = "trace", skip(self))]
	pub async fn delete_column(&self, id: &ColumnId) -> Result<()> {
		let column = self.column(id).await?;
		self.store().remove(CacheScope::Column, id.as_str()).await?;

		let mut table = self.table(&column.fk_table_id).await?;
		table.column_ids.retain(|column_id| column_id != id);
		self.update_table(table).await?;

		self.cache().del(CacheScope::Column, id.as_str());
		Ok(())
	}
}
