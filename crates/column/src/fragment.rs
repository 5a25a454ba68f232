// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 Gridbase

use std::collections::{HashMap, HashSet};

use futures_util::future::BoxFuture;
use gridbase_catalog::{
	Catalog,
	model::{ColumnMeta, ColumnOptions, LookupOptions, RollupOptions},
};
use gridbase_formula::FormulaCache;
use gridbase_sql::{Dialect, RawSql};
use gridbase_type::{ColumnId, ConfigError, RollupFn};
use tracing::instrument;

use crate::{
	AliasGen, Error, Result,
	link::{JoinSpec, LinkContext, physical, resolve_link},
};

/// Everything fragment generation needs besides the column itself.
///
/// `base_alias` is the alias the surrounding statement gives the column's
/// own table; nested subqueries re-enter with the subquery's alias via
/// [`FragmentContext::with_alias`].
#[derive(Clone)]
pub struct FragmentContext<'a> {
	pub catalog: &'a Catalog,
	pub formulas: &'a FormulaCache,
	pub dialect: Dialect,
	pub base_alias: String,
	pub aliases: &'a AliasGen,
}

impl<'a> FragmentContext<'a> {
	pub fn new(
		catalog: &'a Catalog,
		formulas: &'a FormulaCache,
		dialect: Dialect,
		base_alias: impl Into<String>,
		aliases: &'a AliasGen,
	) -> Self {
		Self {
			catalog,
			formulas,
			dialect,
			base_alias: base_alias.into(),
			aliases,
		}
	}

	pub fn with_alias(&self, alias: impl Into<String>) -> FragmentContext<'a> {
		FragmentContext {
			base_alias: alias.into(),
			..self.clone()
		}
	}

	/// A `base_alias.column` identifier reference.
	fn base_ref(&self, column_name: &str) -> RawSql {
		RawSql::ident(format!("{}.{}", self.base_alias, column_name))
	}
}

/// The SQL fragment selecting this column's value for one row of
/// `base_alias`.
///
/// Plain columns are a qualified identifier; rollups and lookups become
/// correlated subqueries; formulas lower their cached AST with sibling
/// columns resolved recursively. Link columns have no scalar fragment.
#[instrument(name = "column::fragment", level = "trace", skip(ctx, column), fields(column = %column.id, dialect = ?ctx.dialect))]
pub async fn sql_fragment(ctx: &FragmentContext<'_>, column: &ColumnMeta) -> Result<RawSql> {
	let mut visiting = HashSet::new();
	fragment(ctx, column.clone(), &mut visiting).await
}

fn fragment<'a>(
	ctx: &'a FragmentContext<'_>,
	column: ColumnMeta,
	visiting: &'a mut HashSet<ColumnId>,
) -> BoxFuture<'a, Result<RawSql>> {
	Box::pin(async move {
		if !column.uidt.is_virtual() {
			return Ok(ctx.base_ref(physical(&column)?));
		}

		if !visiting.insert(column.id.clone()) {
			return Err(Error::CircularReference {
				column: column.id,
			});
		}

		let result = match &column.options {
			ColumnOptions::Plain => Ok(ctx.base_ref(physical(&column)?)),
			ColumnOptions::Link(_) => Err(Error::NotSelectable {
				column: column.id.clone(),
			}),
			ColumnOptions::Rollup(rollup) => rollup_fragment(ctx, &column, rollup).await,
			ColumnOptions::Lookup(lookup) => lookup_fragment(ctx, &column, lookup, visiting).await,
			ColumnOptions::Formula(formula) => {
				formula_fragment(ctx, &column, &formula.expression, visiting).await
			}
		};

		visiting.remove(&column.id);
		result
	})
}

/// `(select agg(..) from related as rt [join junction ..] where
/// rt.related_key = base.base_key)`
async fn rollup_fragment(
	ctx: &FragmentContext<'_>,
	column: &ColumnMeta,
	rollup: &RollupOptions,
) -> Result<RawSql> {
	let link = traversal_link(ctx.catalog, column, &rollup.link_column_id).await?;
	let spec = link.join_spec(&column.fk_table_id)?;
	let related_alias = ctx.aliases.next();

	let aggregate = match rollup.function {
		RollupFn::Count => RawSql::lit("count(*)"),
		function => {
			let target = ctx.catalog.column(&rollup.target_column_id).await?;
			let target_ref = RawSql::ident(format!("{}.{}", related_alias, physical(&target)?));
			let open = if function.is_distinct() {
				format!("{}(distinct ", function.sql_name())
			} else {
				format!("{}(", function.sql_name())
			};
			target_ref.wrap(&open, ")")
		}
	};

	let (source, correlation) = join_parts(ctx, &spec, &related_alias);
	let mut subquery = RawSql::lit("(select ");
	subquery.push(aggregate);
	subquery.push_sql(" from ");
	subquery.push(source);
	subquery.push_sql(" where ");
	subquery.push(correlation);
	subquery.push_sql(")");
	Ok(subquery)
}

/// `(select target from related as rt .. where ..)`, with `order by pk
/// limit 1` appended on multi-row links so the lookup is the first related
/// record.
async fn lookup_fragment<'a>(
	ctx: &FragmentContext<'_>,
	column: &ColumnMeta,
	lookup: &LookupOptions,
	visiting: &'a mut HashSet<ColumnId>,
) -> Result<RawSql> {
	let link = traversal_link(ctx.catalog, column, &lookup.link_column_id).await?;
	let multi_row = link.multi_row(&column.fk_table_id);
	let spec = link.join_spec(&column.fk_table_id)?;
	let related_alias = ctx.aliases.next();

	let target = ctx.catalog.column(&lookup.target_column_id).await?;
	if multi_row && is_multi_row_lookup(ctx.catalog, &target).await? {
		return Err(ConfigError::LookupDepthExceeded {
			column: column.id.clone(),
		}
		.into());
	}

	// the target may itself be computed; re-enter with the subquery's
	// alias as the base
	let nested = ctx.with_alias(related_alias.clone());
	let target_fragment = fragment(&nested, target, visiting).await?;

	let (source, correlation) = join_parts(ctx, &spec, &related_alias);
	let mut subquery = RawSql::lit("(select ");
	subquery.push(target_fragment);
	subquery.push_sql(" from ");
	subquery.push(source);
	subquery.push_sql(" where ");
	subquery.push(correlation);
	if multi_row {
		let order_key = match spec.junction {
			Some(_) => spec.related_key.clone(),
			None => first_pk_name(ctx.catalog, &spec).await?.unwrap_or_else(|| spec.related_key.clone()),
		};
		subquery.push_sql(" order by ");
		subquery.push(RawSql::ident(format!("{related_alias}.{order_key}")));
		subquery.push_sql(" asc limit 1");
	}
	subquery.push_sql(")");
	Ok(subquery)
}

async fn formula_fragment<'a>(
	ctx: &FragmentContext<'_>,
	column: &ColumnMeta,
	expression: &str,
	visiting: &'a mut HashSet<ColumnId>,
) -> Result<RawSql> {
	let compiled = ctx.formulas.compile(expression, ctx.dialect)?;

	let siblings = ctx.catalog.columns_for_table(&column.fk_table_id).await?;
	let mut resolved: HashMap<String, RawSql> = HashMap::new();
	for title in &compiled.dependencies {
		let Some(sibling) = siblings.iter().find(|sibling| &sibling.title == title) else {
			// surfaced as a quoted identifier by the lowering fallback;
			// create/update validation rejects it before it gets here
			continue;
		};
		let sibling_fragment = fragment(ctx, sibling.clone(), visiting).await?;
		resolved.insert(title.clone(), sibling_fragment);
	}

	let resolver = |title: &str| resolved.get(title).cloned();
	Ok(gridbase_formula::lower(&compiled.ast, ctx.dialect, &resolver, None, None)?)
}

/// The subquery's `from` source and its correlation predicate.
///
/// Direct links correlate the related table's key to the base row;
/// many-to-many links join the junction on the related side and correlate
/// the junction's base foreign key instead.
fn join_parts(ctx: &FragmentContext<'_>, spec: &JoinSpec, related_alias: &str) -> (RawSql, RawSql) {
	let mut source = RawSql::ident(spec.related_table.table_name.clone());
	source.push_sql(" as ");
	source.push(RawSql::ident(related_alias.to_string()));

	let correlated = match &spec.junction {
		Some(junction) => {
			let junction_alias = ctx.aliases.next();
			source.push_sql(" inner join ");
			source.push(RawSql::ident(junction.table.table_name.clone()));
			source.push_sql(" as ");
			source.push(RawSql::ident(junction_alias.clone()));
			source.push_sql(" on ");
			source.push(RawSql::ident(format!("{}.{}", junction_alias, junction.related_fk)));
			source.push_sql(" = ");
			source.push(RawSql::ident(format!("{}.{}", related_alias, spec.related_key)));
			RawSql::ident(format!("{}.{}", junction_alias, junction.base_fk))
		}
		None => RawSql::ident(format!("{}.{}", related_alias, spec.related_key)),
	};

	let mut correlation = correlated;
	correlation.push_sql(" = ");
	correlation.push(ctx.base_ref(&spec.base_key));
	(source, correlation)
}

async fn traversal_link(
	catalog: &Catalog,
	column: &ColumnMeta,
	link_column_id: &ColumnId,
) -> Result<LinkContext> {
	let Some(link_column) = catalog.find_column(link_column_id).await? else {
		return Err(ConfigError::DanglingColumnReference {
			column: column.id.clone(),
			referenced: link_column_id.clone(),
		}
		.into());
	};
	resolve_link(catalog, &link_column).await
}

async fn is_multi_row_lookup(catalog: &Catalog, column: &ColumnMeta) -> Result<bool> {
	let ColumnOptions::Lookup(lookup) = &column.options else {
		return Ok(false);
	};
	let link = traversal_link(catalog, column, &lookup.link_column_id).await?;
	Ok(link.multi_row(&column.fk_table_id))
}

async fn first_pk_name(catalog: &Catalog, spec: &JoinSpec) -> Result<Option<String>> {
	let pks = catalog.primary_key_columns(&spec.related_table.id).await?;
	match pks.first() {
		Some(pk) => Ok(Some(physical(pk)?.to_string())),
		None => Ok(None),
	}
}

#[cfg(test)]
mod tests {
	use gridbase_catalog::model::FormulaOptions;
	use gridbase_sql::Statement;
	use gridbase_testing::{CountryCityFixture, country_city_fixture};
	use gridbase_type::Value;

	use super::*;

	async fn render(fx: &CountryCityFixture, column: &ColumnId, dialect: Dialect) -> Statement {
		let formulas = FormulaCache::new();
		let aliases = AliasGen::default();
		let ctx = FragmentContext::new(&fx.catalog, &formulas, dialect, "base", &aliases);
		let column = fx.catalog.column(column).await.unwrap();
		sql_fragment(&ctx, &column).await.unwrap().render(dialect).unwrap()
	}

	#[tokio::test]
	async fn test_plain_column_is_qualified_identifier() {
		let fx = country_city_fixture();
		let stmt = render(&fx, &fx.city_name, Dialect::Postgres).await;
		assert_eq!(stmt.sql, "\"base\".\"name\"");
		assert!(stmt.bindings.is_empty());
	}

	#[tokio::test]
	async fn test_count_rollup_subquery() {
		let fx = country_city_fixture();
		let stmt = render(&fx, &fx.country_city_count, Dialect::Sqlite).await;
		assert_eq!(
			stmt.sql,
			"(select count(*) from \"city\" as \"__gb_alias_0\" \
			 where \"__gb_alias_0\".\"country_id\" = \"base\".\"id\")"
		);
	}

	#[tokio::test]
	async fn test_sum_rollup_aggregates_target() {
		let fx = country_city_fixture();
		let stmt = render(&fx, &fx.country_population, Dialect::Postgres).await;
		assert_eq!(
			stmt.sql,
			"(select sum(\"__gb_alias_0\".\"population\") from \"city\" as \"__gb_alias_0\" \
			 where \"__gb_alias_0\".\"country_id\" = \"base\".\"id\")"
		);
	}

	#[tokio::test]
	async fn test_every_rollup_function_shape() {
		let fx = country_city_fixture();
		let cases = [
			(RollupFn::Count, "count(*)"),
			(RollupFn::Sum, "sum(\"__gb_alias_0\".\"population\")"),
			(RollupFn::Avg, "avg(\"__gb_alias_0\".\"population\")"),
			(RollupFn::Min, "min(\"__gb_alias_0\".\"population\")"),
			(RollupFn::Max, "max(\"__gb_alias_0\".\"population\")"),
			(RollupFn::CountDistinct, "count(distinct \"__gb_alias_0\".\"population\")"),
			(RollupFn::SumDistinct, "sum(distinct \"__gb_alias_0\".\"population\")"),
			(RollupFn::AvgDistinct, "avg(distinct \"__gb_alias_0\".\"population\")"),
		];
		for (function, aggregate) in cases {
			let mut column = fx.catalog.column(&fx.country_population).await.unwrap();
			let ColumnOptions::Rollup(rollup) = &mut column.options else {
				unreachable!()
			};
			rollup.function = function;
			fx.catalog.update_column(column).await.unwrap();

			let stmt = render(&fx, &fx.country_population, Dialect::Postgres).await;
			assert_eq!(
				stmt.sql,
				format!(
					"(select {aggregate} from \"city\" as \"__gb_alias_0\" \
					 where \"__gb_alias_0\".\"country_id\" = \"base\".\"id\")"
				),
				"shape for {function}"
			);
		}
	}

	#[tokio::test]
	async fn test_belongs_to_lookup_subquery() {
		let fx = country_city_fixture();
		let stmt = render(&fx, &fx.city_country_name, Dialect::Postgres).await;
		assert_eq!(
			stmt.sql,
			"(select \"__gb_alias_0\".\"name\" from \"country\" as \"__gb_alias_0\" \
			 where \"__gb_alias_0\".\"id\" = \"base\".\"country_id\")"
		);
	}

	#[tokio::test]
	async fn test_has_many_lookup_picks_first_by_key() {
		let fx = country_city_fixture();
		let stmt = render(&fx, &fx.country_first_city, Dialect::Postgres).await;
		assert_eq!(
			stmt.sql,
			"(select \"__gb_alias_0\".\"name\" from \"city\" as \"__gb_alias_0\" \
			 where \"__gb_alias_0\".\"country_id\" = \"base\".\"id\" \
			 order by \"__gb_alias_0\".\"id\" asc limit 1)"
		);
	}

	#[tokio::test]
	async fn test_formula_inlines_lookup_and_binds_literal() {
		let fx = country_city_fixture();
		let stmt = render(&fx, &fx.city_label, Dialect::Sqlite).await;
		assert_eq!(
			stmt.sql,
			"\"base\".\"name\" || ? || \
			 (select \"__gb_alias_0\".\"name\" from \"country\" as \"__gb_alias_0\" \
			 where \"__gb_alias_0\".\"id\" = \"base\".\"country_id\")"
		);
		assert_eq!(stmt.bindings, vec![Value::from(" / ")]);
	}

	#[tokio::test]
	async fn test_link_column_is_not_selectable() {
		let fx = country_city_fixture();
		let formulas = FormulaCache::new();
		let aliases = AliasGen::default();
		let ctx = FragmentContext::new(&fx.catalog, &formulas, Dialect::Postgres, "base", &aliases);
		let column = fx.catalog.column(&fx.city_country).await.unwrap();
		let err = sql_fragment(&ctx, &column).await.unwrap_err();
		assert!(matches!(err, Error::NotSelectable { .. }));
	}

	#[tokio::test]
	async fn test_mutually_recursive_formulas_error() {
		let fx = country_city_fixture();
		let mut label = fx.catalog.column(&fx.city_label).await.unwrap();
		label.options = ColumnOptions::Formula(FormulaOptions {
			expression: "{Mirror}".to_string(),
		});
		fx.catalog.update_column(label).await.unwrap();
		fx.catalog
			.create_column(ColumnMeta {
				id: ColumnId::from("col_city_mirror"),
				fk_table_id: fx.city.clone(),
				title: "Mirror".to_string(),
				column_name: None,
				uidt: gridbase_type::Uidt::Formula,
				options: ColumnOptions::Formula(FormulaOptions {
					expression: "{Label}".to_string(),
				}),
				pk: false,
				pv: false,
			})
			.await
			.unwrap();

		let formulas = FormulaCache::new();
		let aliases = AliasGen::default();
		let ctx = FragmentContext::new(&fx.catalog, &formulas, Dialect::Postgres, "base", &aliases);
		let column = fx.catalog.column(&fx.city_label).await.unwrap();
		let err = sql_fragment(&ctx, &column).await.unwrap_err();
		assert!(matches!(err, Error::CircularReference { .. }));
	}
}
