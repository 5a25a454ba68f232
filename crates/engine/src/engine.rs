// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 Gridbase

use std::future::Future;
use std::sync::Arc;

use gridbase_catalog::{
	Catalog,
	model::{ColumnMeta, ComparisonOp, FilterNode, FilterTree},
};
use gridbase_column::{JoinSpec, LinkContext, resolve_link};
use gridbase_formula::FormulaCache;
use gridbase_sql::{Dialect, RawSql, StatementPlan};
use gridbase_type::{ColumnId, ResolveError, TableId, Value};
use tracing::instrument;

use crate::{
	Driver, EngineContext, Error, ListParams, ReadParams, Result,
	builder::{QueryBuilder, Resolved, resolve},
	executor::run_plan,
	shape::{PARENT_KEY, Record, nest_children},
};

/// The virtual table engine: one instance per request scope, sharing only
/// the metadata cache (through the catalog) and the formula cache.
pub struct Engine {
	catalog: Catalog,
	formulas: Arc<FormulaCache>,
	driver: Arc<dyn Driver>,
	context: EngineContext,
}

impl Engine {
	pub fn new(
		catalog: Catalog,
		formulas: Arc<FormulaCache>,
		driver: Arc<dyn Driver>,
		context: EngineContext,
	) -> Self {
		Self {
			catalog,
			formulas,
			driver,
			context,
		}
	}

	pub fn catalog(&self) -> &Catalog {
		&self.catalog
	}

	pub fn context(&self) -> &EngineContext {
		&self.context
	}

	pub fn dialect(&self) -> Dialect {
		self.driver.dialect()
	}

	/// Diagnostic dump of the metadata cache, keyed `scope:key`.
	pub fn export_meta_cache(&self) -> serde_json::Value {
		self.catalog.cache().export()
	}

	#[instrument(name = "engine::list", level = "trace", skip(self, params), fields(table = %table))]
	pub async fn list(&self, table: &TableId, params: &ListParams) -> Result<Vec<Record>> {
		let mut resolved = resolve(&self.catalog, table, params.view.as_ref()).await?;
		let expansions = self.resolve_expansions(&mut resolved, &params.expand).await?;

		let builder = QueryBuilder::new(&self.catalog, &self.formulas, self.dialect(), &resolved);
		let where_clause = builder.where_clause(params.filter.as_ref()).await?;
		let sorts = if params.sorts.is_empty() {
			resolved.view.as_ref().map(|view| view.sorts.clone()).unwrap_or_default()
		} else {
			params.sorts.clone()
		};
		let query = builder
			.list_query(where_clause.as_ref(), &sorts, params.limit, params.offset, false)
			.await?;

		let mut records = self.query(&query).await?;
		for (link, link_ctx, spec) in &expansions {
			self.expand_link(&resolved, link, link_ctx, spec, &mut records).await?;
		}
		Ok(records)
	}

	#[instrument(name = "engine::count", level = "trace", skip(self, params), fields(table = %table))]
	pub async fn count(&self, table: &TableId, params: &ListParams) -> Result<u64> {
		let resolved = resolve(&self.catalog, table, params.view.as_ref()).await?;
		let builder = QueryBuilder::new(&self.catalog, &self.formulas, self.dialect(), &resolved);
		let where_clause = builder.where_clause(params.filter.as_ref()).await?;
		let rows = self.query(&builder.count_query(where_clause.as_ref())).await?;

		let count = rows
			.first()
			.and_then(|row| row.get("count"))
			.and_then(Value::as_f64)
			.unwrap_or(0.0);
		Ok(count as u64)
	}

	#[instrument(name = "engine::read", level = "trace", skip(self, params), fields(table = %table))]
	pub async fn read(
		&self,
		table: &TableId,
		id: &Value,
		params: &ReadParams,
	) -> Result<Option<Record>> {
		let mut resolved = resolve(&self.catalog, table, params.view.as_ref()).await?;
		let expansions = self.resolve_expansions(&mut resolved, &params.expand).await?;

		let builder = QueryBuilder::new(&self.catalog, &self.formulas, self.dialect(), &resolved);
		let predicate = builder.pk_predicate(id)?;
		let query = builder.list_query(Some(&predicate), &[], Some(1), None, false).await?;

		let mut records = self.query(&query).await?;
		for (link, link_ctx, spec) in &expansions {
			self.expand_link(&resolved, link, link_ctx, spec, &mut records).await?;
		}
		Ok(records.into_iter().next())
	}

	#[instrument(name = "engine::insert", level = "trace", skip(self, data), fields(table = %table))]
	pub async fn insert(&self, table: &TableId, data: Record) -> Result<Record> {
		let resolved = resolve(&self.catalog, table, None).await?;
		let builder = QueryBuilder::new(&self.catalog, &self.formulas, self.dialect(), &resolved);
		let statement = builder.insert_statement(&data)?.render(self.dialect())?;
		self.with_timeout(self.driver.execute(&statement)).await?;

		if let Ok(pk) = resolved.first_pk() {
			if let Some(id) = data.get(&pk.title) {
				if let Some(record) = self.read(table, &id.clone(), &ReadParams::default()).await? {
					return Ok(record);
				}
			}
		}
		Ok(data)
	}

	/// Update one row by key, then read it back shaped. `None` when no
	/// row matched.
	#[instrument(name = "engine::update", level = "trace", skip(self, patch), fields(table = %table))]
	pub async fn update(
		&self,
		table: &TableId,
		id: &Value,
		patch: Record,
	) -> Result<Option<Record>> {
		let resolved = resolve(&self.catalog, table, None).await?;
		let builder = QueryBuilder::new(&self.catalog, &self.formulas, self.dialect(), &resolved);
		let predicate = builder.pk_predicate(id)?;

		let mut plan = StatementPlan::new();
		if let Some(lock) = builder.lock_statement(&predicate)? {
			plan.push(lock.render(self.dialect())?);
		}
		plan.push(builder.update_statement(&patch, &predicate)?.render(self.dialect())?);
		self.run_plan(&plan).await?;

		self.read(table, id, &ReadParams::default()).await
	}

	#[instrument(name = "engine::delete", level = "trace", skip(self), fields(table = %table))]
	pub async fn delete(&self, table: &TableId, id: &Value) -> Result<u64> {
		let resolved = resolve(&self.catalog, table, None).await?;
		let builder = QueryBuilder::new(&self.catalog, &self.formulas, self.dialect(), &resolved);
		let predicate = builder.pk_predicate(id)?;

		let mut plan = StatementPlan::new();
		if let Some(lock) = builder.lock_statement(&predicate)? {
			plan.push(lock.render(self.dialect())?);
		}
		plan.push(builder.delete_statement(&predicate).render(self.dialect())?);
		self.run_plan(&plan).await
	}

	#[instrument(name = "engine::bulk_insert", level = "trace", skip(self, rows), fields(table = %table, rows = rows.len()))]
	pub async fn bulk_insert(&self, table: &TableId, rows: Vec<Record>) -> Result<u64> {
		let resolved = resolve(&self.catalog, table, None).await?;
		let builder = QueryBuilder::new(&self.catalog, &self.formulas, self.dialect(), &resolved);

		let mut plan = StatementPlan::new();
		for row in &rows {
			plan.push(builder.insert_statement(row)?.render(self.dialect())?);
		}
		self.run_plan(&plan).await
	}

	/// Each row carries its own key value under the key column's title.
	#[instrument(name = "engine::bulk_update", level = "trace", skip(self, rows), fields(table = %table, rows = rows.len()))]
	pub async fn bulk_update(&self, table: &TableId, rows: Vec<Record>) -> Result<u64> {
		let resolved = resolve(&self.catalog, table, None).await?;
		let builder = QueryBuilder::new(&self.catalog, &self.formulas, self.dialect(), &resolved);
		let pk_title = resolved.first_pk()?.title.clone();
		let pk_id = resolved.first_pk()?.id.clone();

		let mut plan = StatementPlan::new();
		for mut row in rows {
			let Some(id) = row.shift_remove(&pk_title) else {
				return Err(Error::MissingKeyValue {
					column: pk_id.clone(),
				});
			};
			let predicate = builder.pk_predicate(&id)?;
			plan.push(builder.update_statement(&row, &predicate)?.render(self.dialect())?);
		}
		self.run_plan(&plan).await
	}

	/// One UPDATE against every row the filter matches.
	#[instrument(name = "engine::bulk_update_all", level = "trace", skip(self, filter, patch), fields(table = %table))]
	pub async fn bulk_update_all(
		&self,
		table: &TableId,
		filter: Option<&FilterTree>,
		patch: Record,
	) -> Result<u64> {
		let resolved = resolve(&self.catalog, table, None).await?;
		let builder = QueryBuilder::new(&self.catalog, &self.formulas, self.dialect(), &resolved);
		let predicate = builder.where_clause(filter).await?.unwrap_or_else(|| RawSql::lit("1 = 1"));
		let statement = builder.update_statement(&patch, &predicate)?.render(self.dialect())?;
		self.run_plan(&StatementPlan::from(statement)).await
	}

	/// Delete rows by key, returning a snapshot of what was removed.
	#[instrument(name = "engine::bulk_delete", level = "trace", skip(self, ids), fields(table = %table, rows = ids.len()))]
	pub async fn bulk_delete(&self, table: &TableId, ids: Vec<Value>) -> Result<Vec<Record>> {
		let resolved = resolve(&self.catalog, table, None).await?;
		let pk_id = resolved.first_pk()?.id.clone();
		let items: Vec<serde_json::Value> = ids.iter().map(Value::to_json).collect();
		let filter = FilterTree::all(vec![FilterNode::Leaf {
			column_id: pk_id,
			op: ComparisonOp::In,
			value: Value::Json(serde_json::Value::Array(items)),
		}]);
		self.snapshot_and_delete(&resolved, Some(&filter)).await
	}

	/// Delete every row the filter matches, returning the snapshot.
	#[instrument(name = "engine::bulk_delete_all", level = "trace", skip(self, filter), fields(table = %table))]
	pub async fn bulk_delete_all(
		&self,
		table: &TableId,
		filter: Option<&FilterTree>,
	) -> Result<Vec<Record>> {
		let resolved = resolve(&self.catalog, table, None).await?;
		self.snapshot_and_delete(&resolved, filter).await
	}

	/// Snapshot the doomed rows with the compiled predicate, then delete
	/// with that same predicate. One compile pass, so the snapshot and
	/// the delete target exactly the same row set.
	async fn snapshot_and_delete(
		&self,
		resolved: &Resolved,
		filter: Option<&FilterTree>,
	) -> Result<Vec<Record>> {
		let builder = QueryBuilder::new(&self.catalog, &self.formulas, self.dialect(), resolved);
		let where_clause = builder.where_clause(filter).await?;

		let snapshot_query =
			builder.list_query(where_clause.as_ref(), &[], None, None, false).await?;
		let snapshot = self.query(&snapshot_query).await?;

		let predicate = where_clause.unwrap_or_else(|| RawSql::lit("1 = 1"));
		let delete = builder.delete_statement(&predicate).render(self.dialect())?;
		self.run_plan(&StatementPlan::from(delete)).await?;
		Ok(snapshot)
	}

	async fn resolve_expansions(
		&self,
		resolved: &mut Resolved,
		expand: &[ColumnId],
	) -> Result<Vec<(ColumnMeta, LinkContext, JoinSpec)>> {
		let mut expansions = Vec::with_capacity(expand.len());
		for link_id in expand {
			let link = resolved
				.columns
				.iter()
				.find(|column| column.id == *link_id)
				.cloned()
				.ok_or_else(|| ResolveError::ColumnNotFound {
					column: link_id.clone(),
				})?;
			let link_ctx = resolve_link(&self.catalog, &link).await?;
			let spec = link_ctx.join_spec(&resolved.table.id)?;
			// the correlation key must be selected for shaping to group on
			if let Some(base_column) = resolved.column_by_physical(&spec.base_key) {
				let id = base_column.id.clone();
				resolved.ensure_visible(&id);
			}
			expansions.push((link, link_ctx, spec));
		}
		Ok(expansions)
	}

	/// One child query per expanded link: the related table's shaped
	/// select list plus the correlation key, for every parent key seen.
	async fn expand_link(
		&self,
		resolved: &Resolved,
		link: &ColumnMeta,
		link_ctx: &LinkContext,
		spec: &JoinSpec,
		records: &mut [Record],
	) -> Result<()> {
		let base_column = resolved.column_by_physical(&spec.base_key).ok_or_else(|| {
			ResolveError::ColumnNotFound {
				column: ColumnId::from(spec.base_key.as_str()),
			}
		})?;
		let base_title = base_column.title.clone();
		let multi_row = link_ctx.multi_row(&resolved.table.id);

		let keys: Vec<Value> = records
			.iter()
			.filter_map(|record| record.get(&base_title))
			.filter(|value| !value.is_null())
			.cloned()
			.collect();
		if keys.is_empty() {
			nest_children(records, &base_title, &link.title, Vec::new(), multi_row);
			return Ok(());
		}

		let related_resolved = resolve(&self.catalog, &spec.related_table.id, None).await?;
		let child_builder =
			QueryBuilder::new(&self.catalog, &self.formulas, self.dialect(), &related_resolved);

		let correlation = match &spec.junction {
			Some(junction) => {
				RawSql::ident(format!("{}.{}", junction.table.table_name, junction.base_fk))
			}
			None => RawSql::ident(format!("{}.{}", spec.related_table.table_name, spec.related_key)),
		};

		let mut query = RawSql::lit("select ");
		query.push(child_builder.select_list().await?);
		query.push_sql(", ");
		query.push(correlation.clone().alias(PARENT_KEY));
		query.push_sql(" from ");
		query.push(RawSql::ident(spec.related_table.table_name.clone()));
		if let Some(junction) = &spec.junction {
			query.push_sql(" inner join ");
			query.push(RawSql::ident(junction.table.table_name.clone()));
			query.push_sql(" on ");
			query.push(RawSql::ident(format!("{}.{}", junction.table.table_name, junction.related_fk)));
			query.push_sql(" = ");
			query.push(RawSql::ident(format!(
				"{}.{}",
				spec.related_table.table_name, spec.related_key
			)));
		}
		query.push_sql(" where ");
		query.push(correlation);
		query.push_sql(" in (");
		query.push(RawSql::join(keys.into_iter().map(RawSql::value), ", "));
		query.push_sql(")");
		if let Some(order) = child_builder.order_by(&[]).await? {
			query.push_sql(" order by ");
			query.push(order);
		}

		let children = self.query(&query).await?;
		nest_children(records, &base_title, &link.title, children, multi_row);
		Ok(())
	}

	/// The timeout lives inside the executor so an expired local
	/// transaction is rolled back, never abandoned open.
	async fn run_plan(&self, plan: &StatementPlan) -> Result<u64> {
		run_plan(self.driver.as_ref(), plan, self.context.timeout).await
	}

	async fn query(&self, raw: &RawSql) -> Result<Vec<Record>> {
		let statement = raw.render(self.dialect())?;
		self.with_timeout(self.driver.query(&statement)).await
	}

	async fn with_timeout<T>(&self, operation: impl Future<Output = Result<T>>) -> Result<T> {
		match self.context.timeout {
			Some(limit) => match tokio::time::timeout(limit, operation).await {
				Ok(result) => result,
				Err(_) => Err(Error::Timeout {
					elapsed_ms: limit.as_millis() as u64,
				}),
			},
			None => operation.await,
		}
	}
}
