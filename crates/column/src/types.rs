// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 Gridbase

use std::collections::HashSet;

use futures_util::future::BoxFuture;
use gridbase_catalog::{
	Catalog,
	model::{ColumnMeta, ColumnOptions},
};
use gridbase_type::{AbstractType, ColumnId, RollupFn};

use crate::{Error, Result};

/// The effective abstract type of a column, following virtual columns
/// through their targets.
///
/// A lookup carries its target's type; `min`/`max` rollups do too, while
/// every other aggregate yields a number. Formulas stay text — their
/// result type depends on the expression, and text admits every
/// comparison operator. Link columns shape as nested JSON.
pub async fn resolve_abstract_type(catalog: &Catalog, column: &ColumnMeta) -> Result<AbstractType> {
	let mut visiting = HashSet::new();
	resolve(catalog, column.clone(), &mut visiting).await
}

fn resolve<'a>(
	catalog: &'a Catalog,
	column: ColumnMeta,
	visiting: &'a mut HashSet<ColumnId>,
) -> BoxFuture<'a, Result<AbstractType>> {
	Box::pin(async move {
		if !column.uidt.is_virtual() {
			return Ok(column.abstract_type());
		}
		if !visiting.insert(column.id.clone()) {
			return Err(Error::CircularReference {
				column: column.id,
			});
		}

		let resolved = match &column.options {
			ColumnOptions::Plain => Ok(column.abstract_type()),
			ColumnOptions::Link(_) => Ok(AbstractType::Json),
			ColumnOptions::Rollup(rollup) => match rollup.function {
				RollupFn::Min | RollupFn::Max => {
					let target = catalog.column(&rollup.target_column_id).await?;
					resolve(catalog, target, visiting).await
				}
				_ => Ok(AbstractType::Number),
			},
			ColumnOptions::Lookup(lookup) => {
				let target = catalog.column(&lookup.target_column_id).await?;
				resolve(catalog, target, visiting).await
			}
			ColumnOptions::Formula(_) => Ok(AbstractType::Text),
		};

		visiting.remove(&column.id);
		resolved
	})
}

#[cfg(test)]
mod tests {
	use gridbase_catalog::model::{LookupOptions, RollupOptions};
	use gridbase_testing::country_city_fixture;

	use super::*;

	#[tokio::test]
	async fn test_lookup_carries_target_type() {
		let fx = country_city_fixture();
		let lookup = fx.catalog.column(&fx.city_country_name).await.unwrap();
		let resolved = resolve_abstract_type(&fx.catalog, &lookup).await.unwrap();
		assert_eq!(resolved, AbstractType::Text);

		let mut numeric = lookup.clone();
		numeric.options = ColumnOptions::Lookup(LookupOptions {
			link_column_id: fx.city_country.clone(),
			target_column_id: fx.country_id.clone(),
		});
		let resolved = resolve_abstract_type(&fx.catalog, &numeric).await.unwrap();
		assert_eq!(resolved, AbstractType::Number);
	}

	#[tokio::test]
	async fn test_rollup_type_depends_on_function() {
		let fx = country_city_fixture();
		let mut rollup = fx.catalog.column(&fx.country_population).await.unwrap();
		let resolved = resolve_abstract_type(&fx.catalog, &rollup).await.unwrap();
		assert_eq!(resolved, AbstractType::Number);

		// min/max inherit the target's type instead
		rollup.options = ColumnOptions::Rollup(RollupOptions {
			link_column_id: fx.country_cities.clone(),
			target_column_id: fx.city_name.clone(),
			function: RollupFn::Min,
		});
		let resolved = resolve_abstract_type(&fx.catalog, &rollup).await.unwrap();
		assert_eq!(resolved, AbstractType::Text);
	}
}
