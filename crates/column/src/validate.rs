// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 Gridbase

use std::collections::HashSet;

use gridbase_catalog::{
	Catalog,
	model::{ColumnMeta, ColumnOptions, LookupOptions, RollupOptions},
};
use gridbase_type::{ColumnId, ConfigError};
use tracing::instrument;

use crate::{Result, link::resolve_link};

/// Validate a column's configuration against the current metadata.
///
/// Called on column create and update, and again by mutators on any column
/// the changed column is a dependency of, so a deleted or retyped target
/// surfaces as a configuration error instead of broken SQL at query time.
#[instrument(name = "column::validate", level = "trace", skip(catalog, column), fields(column = %column.id))]
pub async fn validate_config(catalog: &Catalog, column: &ColumnMeta) -> Result<()> {
	match &column.options {
		ColumnOptions::Plain => Ok(()),
		ColumnOptions::Link(_) => {
			resolve_link(catalog, column).await?;
			Ok(())
		}
		ColumnOptions::Rollup(rollup) => validate_rollup(catalog, column, rollup).await,
		ColumnOptions::Lookup(lookup) => validate_lookup(catalog, column, lookup).await,
		ColumnOptions::Formula(formula) => {
			let ast = gridbase_formula::parse(&formula.expression)?;
			let titles = titles_for_table(catalog, column).await?;
			for title in ast.identifiers() {
				if !titles.contains(&title) {
					return Err(dangling(column, ColumnId::from(title)).into());
				}
			}
			Ok(())
		}
	}
}

async fn validate_rollup(catalog: &Catalog, column: &ColumnMeta, rollup: &RollupOptions) -> Result<()> {
	let link = require_link(catalog, column, &rollup.link_column_id).await?;
	let Some(target) = catalog.find_column(&rollup.target_column_id).await? else {
		return Err(dangling(column, rollup.target_column_id.clone()).into());
	};
	if target.fk_table_id != link.related_table(&column.fk_table_id).id {
		return Err(dangling(column, rollup.target_column_id.clone()).into());
	}

	// The target may itself be virtual; a lookup of a numeric column
	// aggregates like a number, not like its Text storage fallback.
	let target_type = crate::resolve_abstract_type(catalog, &target).await?;
	if !rollup.function.accepts(target_type) {
		return Err(ConfigError::InvalidAggregateForType {
			function: rollup.function,
			target_type,
			column: column.id.clone(),
		}
		.into());
	}
	Ok(())
}

async fn validate_lookup(catalog: &Catalog, column: &ColumnMeta, lookup: &LookupOptions) -> Result<()> {
	let link = require_link(catalog, column, &lookup.link_column_id).await?;
	let Some(target) = catalog.find_column(&lookup.target_column_id).await? else {
		return Err(dangling(column, lookup.target_column_id.clone()).into());
	};
	let related = link.related_table(&column.fk_table_id);
	if target.fk_table_id != related.id {
		return Err(dangling(column, lookup.target_column_id.clone()).into());
	}

	// A multi-row lookup picks the first related record; chaining a
	// second multi-row hop through it has no defined first record.
	if link.multi_row(&column.fk_table_id) {
		if let ColumnOptions::Lookup(nested) = &target.options {
			let nested_link = require_link(catalog, &target, &nested.link_column_id).await?;
			if nested_link.multi_row(&target.fk_table_id) {
				return Err(ConfigError::LookupDepthExceeded {
					column: column.id.clone(),
				}
				.into());
			}
		}
	}
	Ok(())
}

/// Resolve a rollup/lookup's traversal column, which must exist and be a
/// link.
async fn require_link(
	catalog: &Catalog,
	column: &ColumnMeta,
	link_column_id: &ColumnId,
) -> Result<crate::LinkContext> {
	let Some(link_column) = catalog.find_column(link_column_id).await? else {
		return Err(dangling(column, link_column_id.clone()).into());
	};
	if !matches!(link_column.options, ColumnOptions::Link(_)) {
		return Err(dangling(column, link_column_id.clone()).into());
	}
	resolve_link(catalog, &link_column).await
}

/// Column ids this column depends on, with formula titles resolved against
/// the owning table. Drives cascade re-validation when a column changes.
pub async fn resolve_dependencies(catalog: &Catalog, column: &ColumnMeta) -> Result<HashSet<ColumnId>> {
	let mut dependencies = column.dependencies();
	if let ColumnOptions::Formula(formula) = &column.options {
		let ast = gridbase_formula::parse(&formula.expression)?;
		let siblings = catalog.columns_for_table(&column.fk_table_id).await?;
		for title in ast.identifiers() {
			if let Some(sibling) = siblings.iter().find(|sibling| sibling.title == title) {
				dependencies.insert(sibling.id.clone());
			}
		}
	}
	Ok(dependencies)
}

async fn titles_for_table(catalog: &Catalog, column: &ColumnMeta) -> Result<HashSet<String>> {
	Ok(catalog
		.columns_for_table(&column.fk_table_id)
		.await?
		.into_iter()
		.filter(|sibling| sibling.id != column.id)
		.map(|sibling| sibling.title)
		.collect())
}

fn dangling(column: &ColumnMeta, referenced: ColumnId) -> ConfigError {
	ConfigError::DanglingColumnReference {
		column: column.id.clone(),
		referenced,
	}
}

#[cfg(test)]
mod tests {
	use gridbase_catalog::model::{ColumnOptions, FormulaOptions, RollupOptions};
	use gridbase_testing::country_city_fixture;
	use gridbase_type::RollupFn;

	use super::*;
	use crate::Error;

	#[tokio::test]
	async fn test_fixture_columns_validate() {
		let fx = country_city_fixture();
		for table in [&fx.country, &fx.city] {
			for column in fx.catalog.columns_for_table(table).await.unwrap() {
				validate_config(&fx.catalog, &column).await.unwrap();
			}
		}
	}

	#[tokio::test]
	async fn test_sum_over_text_is_rejected() {
		let fx = country_city_fixture();
		let mut rollup = fx.catalog.column(&fx.country_population).await.unwrap();
		rollup.options = ColumnOptions::Rollup(RollupOptions {
			link_column_id: fx.country_cities.clone(),
			target_column_id: fx.city_name.clone(),
			function: RollupFn::Sum,
		});

		let err = validate_config(&fx.catalog, &rollup).await.unwrap_err();
		assert!(matches!(
			err,
			Error::Config(ConfigError::InvalidAggregateForType { function: RollupFn::Sum, .. })
		));
	}

	#[tokio::test]
	async fn test_sum_over_numeric_lookup_is_accepted() {
		let fx = country_city_fixture();

		// retarget City's lookup at the numeric country id, then sum it
		// from Country: the whole chain is numeric, so the aggregate
		// must validate
		let mut lookup = fx.catalog.column(&fx.city_country_name).await.unwrap();
		lookup.options = ColumnOptions::Lookup(LookupOptions {
			link_column_id: fx.city_country.clone(),
			target_column_id: fx.country_id.clone(),
		});
		fx.catalog.update_column(lookup).await.unwrap();

		let mut rollup = fx.catalog.column(&fx.country_population).await.unwrap();
		rollup.options = ColumnOptions::Rollup(RollupOptions {
			link_column_id: fx.country_cities.clone(),
			target_column_id: fx.city_country_name.clone(),
			function: RollupFn::Sum,
		});
		validate_config(&fx.catalog, &rollup).await.unwrap();
	}

	#[tokio::test]
	async fn test_deleted_target_surfaces_as_dangling() {
		// deleting a column a lookup targets must fail that lookup's
		// re-validation, not silently drop it
		let fx = country_city_fixture();
		fx.catalog.delete_column(&fx.country_name).await.unwrap();

		let lookup = fx.catalog.column(&fx.city_country_name).await.unwrap();
		let err = validate_config(&fx.catalog, &lookup).await.unwrap_err();
		assert!(matches!(
			err,
			Error::Config(ConfigError::DanglingColumnReference { ref referenced, .. })
				if *referenced == fx.country_name
		));
	}

	#[tokio::test]
	async fn test_bt_lookup_may_target_multi_row_lookup() {
		let fx = country_city_fixture();
		let mut lookup = fx.catalog.column(&fx.city_country_name).await.unwrap();
		lookup.options = ColumnOptions::Lookup(LookupOptions {
			link_column_id: fx.city_country.clone(),
			target_column_id: fx.country_first_city.clone(),
		});
		// the outer hop is belongs-to (single-row), so chaining into
		// Country's has-many lookup stays within one multi-row hop
		validate_config(&fx.catalog, &lookup).await.unwrap();
	}

	#[tokio::test]
	async fn test_second_multi_row_hop_is_rejected() {
		let fx = country_city_fixture();

		// give City a multi-row link of its own (a self-referencing
		// has-many), then make its lookup traverse it
		let self_link = ColumnMeta {
			id: ColumnId::from("col_city_children"),
			fk_table_id: fx.city.clone(),
			title: "Children".to_string(),
			column_name: None,
			uidt: gridbase_type::Uidt::LinkToAnotherRecord,
			options: ColumnOptions::Link(gridbase_catalog::model::LinkOptions {
				relation_type: gridbase_catalog::model::RelationType::HasMany,
				child_column_id: fx.city_country_fk.clone(),
				parent_column_id: fx.city_id.clone(),
				junction_table_id: None,
			}),
			pk: false,
			pv: false,
		};
		fx.catalog.create_column(self_link).await.unwrap();

		let mut inner = fx.catalog.column(&fx.city_country_name).await.unwrap();
		inner.options = ColumnOptions::Lookup(LookupOptions {
			link_column_id: ColumnId::from("col_city_children"),
			target_column_id: fx.city_name.clone(),
		});
		fx.catalog.update_column(inner).await.unwrap();

		// Country -> has-many Cities -> has-many lookup: two multi-row
		// hops, no defined first record
		let mut outer = fx.catalog.column(&fx.country_first_city).await.unwrap();
		outer.options = ColumnOptions::Lookup(LookupOptions {
			link_column_id: fx.country_cities.clone(),
			target_column_id: fx.city_country_name.clone(),
		});
		let err = validate_config(&fx.catalog, &outer).await.unwrap_err();
		assert!(matches!(err, Error::Config(ConfigError::LookupDepthExceeded { .. })));
	}

	#[tokio::test]
	async fn test_formula_referencing_missing_title() {
		let fx = country_city_fixture();
		let mut formula = fx.catalog.column(&fx.city_label).await.unwrap();
		formula.options = ColumnOptions::Formula(FormulaOptions {
			expression: "{Name} & {Vanished}".to_string(),
		});

		let err = validate_config(&fx.catalog, &formula).await.unwrap_err();
		assert!(matches!(
			err,
			Error::Config(ConfigError::DanglingColumnReference { ref referenced, .. })
				if referenced.as_str() == "Vanished"
		));
	}

	#[tokio::test]
	async fn test_formula_dependencies_resolve_to_ids() {
		let fx = country_city_fixture();
		let formula = fx.catalog.column(&fx.city_label).await.unwrap();
		let deps = resolve_dependencies(&fx.catalog, &formula).await.unwrap();
		assert!(deps.contains(&fx.city_name));
		assert!(deps.contains(&fx.city_country_name));
	}
}
