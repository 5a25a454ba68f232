// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 Gridbase

use std::sync::Arc;

use gridbase_catalog::{
	CacheScope, Catalog, MetaCache,
	model::{
		ColumnMeta, ColumnOptions, FormulaOptions, LinkOptions, LookupOptions, RelationType, RollupOptions,
		TableMeta, ViewColumn, ViewMeta,
	},
};
use gridbase_type::{ColumnId, RollupFn, TableId, Uidt, ViewId};

use crate::MemoryMetaStore;

/// The two-table world most suites run against: `Country` has-many
/// `City`, with rollups, lookups and a formula on top.
pub struct CountryCityFixture {
	pub store: Arc<MemoryMetaStore>,
	pub cache: Arc<MetaCache>,
	pub catalog: Catalog,

	pub country: TableId,
	pub city: TableId,
	pub city_default_view: ViewId,

	pub country_id: ColumnId,
	pub country_name: ColumnId,
	pub country_cities: ColumnId,
	pub country_city_count: ColumnId,
	pub country_population: ColumnId,
	pub country_first_city: ColumnId,

	pub city_id: ColumnId,
	pub city_name: ColumnId,
	pub city_population: ColumnId,
	pub city_country_fk: ColumnId,
	pub city_country: ColumnId,
	pub city_country_name: ColumnId,
	pub city_label: ColumnId,
}

fn plain(
	id: &str,
	table: &str,
	title: &str,
	column_name: &str,
	uidt: Uidt,
	pk: bool,
	pv: bool,
) -> ColumnMeta {
	ColumnMeta {
		id: ColumnId::from(id),
		fk_table_id: TableId::from(table),
		title: title.to_string(),
		column_name: Some(column_name.to_string()),
		uidt,
		options: ColumnOptions::Plain,
		pk,
		pv,
	}
}

fn virtual_column(id: &str, table: &str, title: &str, uidt: Uidt, options: ColumnOptions) -> ColumnMeta {
	ColumnMeta {
		id: ColumnId::from(id),
		fk_table_id: TableId::from(table),
		title: title.to_string(),
		column_name: None,
		uidt,
		options,
		pk: false,
		pv: false,
	}
}

/// Seed the store directly (the fixture is the persisted state; the cache
/// starts cold so read-through paths are exercised).
pub fn country_city_fixture() -> CountryCityFixture {
	crate::init_tracing();
	let store = Arc::new(MemoryMetaStore::new());
	let cache = Arc::new(MetaCache::new());
	let catalog = Catalog::new(Arc::clone(&cache), store.clone());

	let mut country = TableMeta::new("tbl_country", "src_main", "Country", "country");
	country.column_ids = vec![
		ColumnId::from("col_country_id"),
		ColumnId::from("col_country_name"),
		ColumnId::from("col_country_cities"),
		ColumnId::from("col_country_city_count"),
		ColumnId::from("col_country_population"),
		ColumnId::from("col_country_first_city"),
	];

	let mut city = TableMeta::new("tbl_city", "src_main", "City", "city");
	city.column_ids = vec![
		ColumnId::from("col_city_id"),
		ColumnId::from("col_city_name"),
		ColumnId::from("col_city_population"),
		ColumnId::from("col_city_country_fk"),
		ColumnId::from("col_city_country"),
		ColumnId::from("col_city_country_name"),
		ColumnId::from("col_city_label"),
	];

	let has_many = LinkOptions {
		relation_type: RelationType::HasMany,
		child_column_id: ColumnId::from("col_city_country_fk"),
		parent_column_id: ColumnId::from("col_country_id"),
		junction_table_id: None,
	};
	let belongs_to = LinkOptions {
		relation_type: RelationType::BelongsTo,
		..has_many.clone()
	};

	let columns = vec![
		plain("col_country_id", "tbl_country", "Id", "id", Uidt::Number, true, false),
		plain("col_country_name", "tbl_country", "Name", "name", Uidt::SingleLineText, false, true),
		virtual_column(
			"col_country_cities",
			"tbl_country",
			"Cities",
			Uidt::LinkToAnotherRecord,
			ColumnOptions::Link(has_many),
		),
		virtual_column(
			"col_country_city_count",
			"tbl_country",
			"City Count",
			Uidt::Rollup,
			ColumnOptions::Rollup(RollupOptions {
				link_column_id: ColumnId::from("col_country_cities"),
				target_column_id: ColumnId::from("col_city_id"),
				function: RollupFn::Count,
			}),
		),
		virtual_column(
			"col_country_population",
			"tbl_country",
			"Total Population",
			Uidt::Rollup,
			ColumnOptions::Rollup(RollupOptions {
				link_column_id: ColumnId::from("col_country_cities"),
				target_column_id: ColumnId::from("col_city_population"),
				function: RollupFn::Sum,
			}),
		),
		virtual_column(
			"col_country_first_city",
			"tbl_country",
			"First City",
			Uidt::Lookup,
			ColumnOptions::Lookup(LookupOptions {
				link_column_id: ColumnId::from("col_country_cities"),
				target_column_id: ColumnId::from("col_city_name"),
			}),
		),
		plain("col_city_id", "tbl_city", "Id", "id", Uidt::Number, true, false),
		plain("col_city_name", "tbl_city", "Name", "name", Uidt::SingleLineText, false, true),
		plain("col_city_population", "tbl_city", "Population", "population", Uidt::Number, false, false),
		plain("col_city_country_fk", "tbl_city", "CountryId", "country_id", Uidt::Number, false, false),
		virtual_column(
			"col_city_country",
			"tbl_city",
			"Country",
			Uidt::LinkToAnotherRecord,
			ColumnOptions::Link(belongs_to),
		),
		virtual_column(
			"col_city_country_name",
			"tbl_city",
			"Country Name",
			Uidt::Lookup,
			ColumnOptions::Lookup(LookupOptions {
				link_column_id: ColumnId::from("col_city_country"),
				target_column_id: ColumnId::from("col_country_name"),
			}),
		),
		virtual_column(
			"col_city_label",
			"tbl_city",
			"Label",
			Uidt::Formula,
			ColumnOptions::Formula(FormulaOptions {
				expression: "CONCAT({Name}, ' / ', {Country Name})".to_string(),
			}),
		),
	];

	let view = ViewMeta {
		id: ViewId::from("vw_city_default"),
		fk_table_id: city.id.clone(),
		title: "Default".to_string(),
		columns: vec![
			ViewColumn::visible("col_city_id", 1),
			ViewColumn::visible("col_city_name", 2),
			ViewColumn::visible("col_city_population", 3),
			ViewColumn {
				column_id: ColumnId::from("col_city_country_fk"),
				show: false,
				order: 4,
				width: None,
			},
			ViewColumn::visible("col_city_country_name", 5),
		],
		filter: None,
		sorts: Vec::new(),
	};

	store.seed(CacheScope::Table, "tbl_country", serde_json::to_value(&country).unwrap());
	store.seed(CacheScope::Table, "tbl_city", serde_json::to_value(&city).unwrap());
	for column in &columns {
		store.seed(CacheScope::Column, column.id.as_str(), serde_json::to_value(column).unwrap());
	}
	store.seed(CacheScope::View, "vw_city_default", serde_json::to_value(&view).unwrap());

	CountryCityFixture {
		store,
		cache,
		catalog,
		country: TableId::from("tbl_country"),
		city: TableId::from("tbl_city"),
		city_default_view: ViewId::from("vw_city_default"),
		country_id: ColumnId::from("col_country_id"),
		country_name: ColumnId::from("col_country_name"),
		country_cities: ColumnId::from("col_country_cities"),
		country_city_count: ColumnId::from("col_country_city_count"),
		country_population: ColumnId::from("col_country_population"),
		country_first_city: ColumnId::from("col_country_first_city"),
		city_id: ColumnId::from("col_city_id"),
		city_name: ColumnId::from("col_city_name"),
		city_population: ColumnId::from("col_city_population"),
		city_country_fk: ColumnId::from("col_city_country_fk"),
		city_country: ColumnId::from("col_city_country"),
		city_country_name: ColumnId::from("col_city_country_name"),
		city_label: ColumnId::from("col_city_label"),
	}
}
