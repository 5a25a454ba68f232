// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 Gridbase

use gridbase_catalog::{CacheScope, Error};
use gridbase_testing::country_city_fixture;
use gridbase_type::{ColumnId, ResolveError, TableId};

#[tokio::test]
async fn test_first_read_populates_the_cache() {
	let fx = country_city_fixture();
	assert!(fx.cache.get(CacheScope::Table, "tbl_city").is_none());

	let table = fx.catalog.table(&fx.city).await.unwrap();
	assert_eq!(table.title, "City");
	assert!(fx.cache.get(CacheScope::Table, "tbl_city").is_some());

	// subsequent reads never touch the store
	fx.store.fail_reads(true);
	let again = fx.catalog.table(&fx.city).await.unwrap();
	assert_eq!(again, table);
}

#[tokio::test]
async fn test_store_failure_is_not_a_miss() {
	let fx = country_city_fixture();
	fx.store.fail_reads(true);

	let err = fx.catalog.table(&fx.city).await.unwrap_err();
	assert!(matches!(err, Error::Store { .. }));
}

#[tokio::test]
async fn test_unknown_table_resolves_to_typed_error() {
	let fx = country_city_fixture();
	let err = fx.catalog.table(&TableId::from("tbl_missing")).await.unwrap_err();
	assert!(matches!(
		err,
		Error::Resolve(ResolveError::TableNotFound { table }) if table.as_str() == "tbl_missing"
	));
}

#[tokio::test]
async fn test_rename_is_visible_immediately() {
	let fx = country_city_fixture();
	fx.catalog.rename_column(&fx.city_name, "City Name").await.unwrap();

	let column = fx.catalog.column(&fx.city_name).await.unwrap();
	assert_eq!(column.title, "City Name");
	// and the physical mapping is untouched
	assert_eq!(column.column_name.as_deref(), Some("name"));
}

#[tokio::test]
async fn test_delete_table_cascades_cached_children() {
	let fx = country_city_fixture();

	// warm the cache so there are child entries to cascade over
	fx.catalog.columns_for_table(&fx.city).await.unwrap();
	fx.catalog.view(&fx.city_default_view).await.unwrap();
	assert!(fx.cache.get(CacheScope::Column, "col_city_name").is_some());

	fx.catalog.delete_table(&fx.city).await.unwrap();

	assert!(fx.cache.get(CacheScope::Table, "tbl_city").is_none());
	assert!(fx.cache.get(CacheScope::Column, "col_city_name").is_none());
	assert!(!fx.store.contains(CacheScope::Table, "tbl_city"));
	assert!(!fx.store.contains(CacheScope::Column, "col_city_name"));
	assert!(!fx.store.contains(CacheScope::View, "vw_city_default"));
}

#[tokio::test]
async fn test_delete_column_shrinks_the_table_list() {
	let fx = country_city_fixture();
	fx.catalog.delete_column(&fx.city_population).await.unwrap();

	let columns = fx.catalog.columns_for_table(&fx.city).await.unwrap();
	assert!(columns.iter().all(|column| column.id != fx.city_population));
	assert!(matches!(
		fx.catalog.column(&fx.city_population).await.unwrap_err(),
		Error::Resolve(ResolveError::ColumnNotFound { .. })
	));
}

#[tokio::test]
async fn test_dangling_column_id_in_table_list_is_an_error() {
	let fx = country_city_fixture();
	let mut table = fx.catalog.table(&fx.city).await.unwrap();
	table.column_ids.push(ColumnId::from("col_city_ghost"));
	fx.catalog.update_table(table).await.unwrap();

	let err = fx.catalog.columns_for_table(&fx.city).await.unwrap_err();
	assert!(matches!(
		err,
		Error::Resolve(ResolveError::ColumnNotFound { column }) if column.as_str() == "col_city_ghost"
	));
}
