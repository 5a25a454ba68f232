// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 Gridbase

use gridbase_catalog::{
	Catalog,
	model::{ColumnMeta, ColumnOptions, LinkOptions, TableMeta},
};
use gridbase_type::TableId;
use tracing::instrument;

use crate::{Error, Result};

/// A link column with both sides resolved against the catalog.
///
/// For has-many and belongs-to links, `child_column` is the foreign key on
/// the child table and `parent_column` the referenced key on the parent.
/// For many-to-many links both are the participating tables' key columns
/// and the foreign keys live on the junction table, named
/// `<table_name>_<key_name>`.
#[derive(Clone, Debug)]
pub struct LinkContext {
	pub options: LinkOptions,
	pub child_column: ColumnMeta,
	pub child_table: TableMeta,
	pub parent_column: ColumnMeta,
	pub parent_table: TableMeta,
	pub junction_table: Option<TableMeta>,
}

/// How to reach the records on the other side of a link, seen from `base`.
/// The engine turns this into a correlated subquery or a join; either way
/// the correlation is `related.related_key = base.base_key`, hopping
/// through `junction` when present.
#[derive(Clone, Debug)]
pub struct JoinSpec {
	pub related_table: TableMeta,
	/// Physical key on the base table.
	pub base_key: String,
	/// Physical key on the related table.
	pub related_key: String,
	pub junction: Option<Junction>,
}

#[derive(Clone, Debug)]
pub struct Junction {
	pub table: TableMeta,
	/// Junction foreign key pointing back at the base table.
	pub base_fk: String,
	/// Junction foreign key pointing at the related table.
	pub related_fk: String,
}

impl LinkContext {
	/// The table on the other side of the link, seen from `base`.
	pub fn related_table(&self, base: &TableId) -> &TableMeta {
		if *base == self.parent_table.id {
			&self.child_table
		} else {
			&self.parent_table
		}
	}

	/// Whether traversal from `base` can reach more than one record.
	pub fn multi_row(&self, base: &TableId) -> bool {
		self.junction_table.is_some() || *base == self.parent_table.id
	}

	pub fn join_spec(&self, base: &TableId) -> Result<JoinSpec> {
		let base_is_parent = *base == self.parent_table.id;

		if let Some(junction) = &self.junction_table {
			let (base_table, base_column, related_table, related_column) = if base_is_parent {
				(&self.parent_table, &self.parent_column, &self.child_table, &self.child_column)
			} else {
				(&self.child_table, &self.child_column, &self.parent_table, &self.parent_column)
			};
			let base_key = physical(base_column)?.to_string();
			let related_key = physical(related_column)?.to_string();
			return Ok(JoinSpec {
				related_table: related_table.clone(),
				junction: Some(Junction {
					table: junction.clone(),
					base_fk: junction_fk(base_table, &base_key),
					related_fk: junction_fk(related_table, &related_key),
				}),
				base_key,
				related_key,
			});
		}

		if base_is_parent {
			Ok(JoinSpec {
				related_table: self.child_table.clone(),
				base_key: physical(&self.parent_column)?.to_string(),
				related_key: physical(&self.child_column)?.to_string(),
				junction: None,
			})
		} else {
			Ok(JoinSpec {
				related_table: self.parent_table.clone(),
				base_key: physical(&self.child_column)?.to_string(),
				related_key: physical(&self.parent_column)?.to_string(),
				junction: None,
			})
		}
	}
}

/// Resolve every table and column a link column's options name.
#[instrument(name = "column::link::resolve", level = "trace", skip(catalog, link_column), fields(column = %link_column.id))]
pub async fn resolve_link(catalog: &Catalog, link_column: &ColumnMeta) -> Result<LinkContext> {
	let ColumnOptions::Link(options) = &link_column.options else {
		return Err(Error::NotALink {
			column: link_column.id.clone(),
		});
	};

	let child_column = catalog.column(&options.child_column_id).await?;
	let parent_column = catalog.column(&options.parent_column_id).await?;
	let child_table = catalog.table(&child_column.fk_table_id).await?;
	let parent_table = catalog.table(&parent_column.fk_table_id).await?;
	let junction_table = match &options.junction_table_id {
		Some(id) => Some(catalog.table(id).await?),
		None => None,
	};

	Ok(LinkContext {
		options: options.clone(),
		child_column,
		child_table,
		parent_column,
		parent_table,
		junction_table,
	})
}

pub(crate) fn physical(column: &ColumnMeta) -> Result<&str> {
	column.column_name.as_deref().ok_or_else(|| Error::MissingPhysicalName {
		column: column.id.clone(),
	})
}

fn junction_fk(table: &TableMeta, key: &str) -> String {
	format!("{}_{}", table.table_name, key)
}

#[cfg(test)]
mod tests {
	use gridbase_testing::country_city_fixture;

	use super::*;

	#[tokio::test]
	async fn test_resolve_has_many() {
		let fx = country_city_fixture();
		let link = fx.catalog.column(&fx.country_cities).await.unwrap();
		let ctx = resolve_link(&fx.catalog, &link).await.unwrap();

		assert_eq!(ctx.parent_table.id, fx.country);
		assert_eq!(ctx.child_table.id, fx.city);
		assert_eq!(ctx.related_table(&fx.country).id, fx.city);
		assert!(ctx.multi_row(&fx.country));
		assert!(!ctx.multi_row(&fx.city));
	}

	#[tokio::test]
	async fn test_join_spec_orients_by_base_side() {
		let fx = country_city_fixture();
		let link = fx.catalog.column(&fx.country_cities).await.unwrap();
		let ctx = resolve_link(&fx.catalog, &link).await.unwrap();

		let outward = ctx.join_spec(&fx.country).unwrap();
		assert_eq!(outward.related_table.id, fx.city);
		assert_eq!(outward.base_key, "id");
		assert_eq!(outward.related_key, "country_id");

		let inward = ctx.join_spec(&fx.city).unwrap();
		assert_eq!(inward.related_table.id, fx.country);
		assert_eq!(inward.base_key, "country_id");
		assert_eq!(inward.related_key, "id");
	}

	#[tokio::test]
	async fn test_resolve_rejects_non_link() {
		let fx = country_city_fixture();
		let name = fx.catalog.column(&fx.city_name).await.unwrap();
		let err = resolve_link(&fx.catalog, &name).await.unwrap_err();
		assert!(matches!(err, Error::NotALink { .. }));
	}
}
