// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 Gridbase

use gridbase_catalog::{
	Catalog,
	model::{ColumnMeta, FilterTree, Sort, SortDirection, TableMeta, ViewMeta},
};
use gridbase_column::{AliasGen, FragmentContext, sql_fragment};
use gridbase_formula::FormulaCache;
use gridbase_sql::{Dialect, RawSql};
use gridbase_type::{ColumnId, ResolveError, TableId, Uidt, Value, ViewId};
use tracing::{debug, instrument};

use crate::{Error, Result, condition, shape::Record};

/// Table, view and column metadata resolved for one request.
#[derive(Clone, Debug)]
pub(crate) struct Resolved {
	pub table: TableMeta,
	pub view: Option<ViewMeta>,
	/// All columns of the table, canonical order.
	pub columns: Vec<ColumnMeta>,
	/// The visible, ordered column set for this request.
	pub visible: Vec<ColumnMeta>,
	pub pk: Vec<ColumnMeta>,
}

/// Fetch table/view/column metadata and compute the visible column set.
/// The primary-value column is always included, view hide or not.
#[instrument(name = "engine::resolve", level = "trace", skip(catalog))]
pub(crate) async fn resolve(
	catalog: &Catalog,
	table_id: &TableId,
	view_id: Option<&ViewId>,
) -> Result<Resolved> {
	let table = catalog.table(table_id).await?;
	let columns = catalog.columns_for_table(table_id).await?;

	let view = match view_id {
		Some(id) => {
			let view = catalog.view(id).await?;
			if view.fk_table_id != *table_id {
				return Err(ResolveError::ViewNotFound {
					view: id.clone(),
				}
				.into());
			}
			Some(view)
		}
		None => None,
	};

	let visible = match &view {
		Some(view) => {
			let mut ordered = view.columns.clone();
			ordered.sort_by_key(|column| column.order);
			let mut visible: Vec<ColumnMeta> = ordered
				.iter()
				.filter(|view_column| view_column.show)
				.filter_map(|view_column| {
					columns.iter().find(|column| column.id == view_column.column_id).cloned()
				})
				.collect();
			if let Some(pv) = columns.iter().find(|column| column.pv) {
				if !visible.iter().any(|column| column.id == pv.id) {
					visible.push(pv.clone());
				}
			}
			visible
		}
		None => columns.clone(),
	};

	let pk = columns.iter().filter(|column| column.pk).cloned().collect();
	Ok(Resolved {
		table,
		view,
		columns,
		visible,
		pk,
	})
}

impl Resolved {
	pub fn column_by_title(&self, title: &str) -> Option<&ColumnMeta> {
		self.columns.iter().find(|column| column.title == title)
	}

	pub fn column_by_physical(&self, name: &str) -> Option<&ColumnMeta> {
		self.columns.iter().find(|column| column.column_name.as_deref() == Some(name))
	}

	pub fn first_pk(&self) -> Result<&ColumnMeta> {
		self.pk.first().ok_or_else(|| Error::MissingPrimaryKey {
			table: self.table.id.clone(),
		})
	}

	/// Force a column into the visible set, keeping order stable.
	pub fn ensure_visible(&mut self, id: &ColumnId) {
		if !self.visible.iter().any(|column| column.id == *id) {
			if let Some(column) = self.columns.iter().find(|column| column.id == *id) {
				self.visible.push(column.clone());
			}
		}
	}
}

/// Assembles the statements of one logical operation. One builder per
/// operation so subquery aliases stay unique across its statements.
pub(crate) struct QueryBuilder<'a> {
	catalog: &'a Catalog,
	formulas: &'a FormulaCache,
	dialect: Dialect,
	resolved: &'a Resolved,
	aliases: AliasGen,
}

impl<'a> QueryBuilder<'a> {
	pub fn new(
		catalog: &'a Catalog,
		formulas: &'a FormulaCache,
		dialect: Dialect,
		resolved: &'a Resolved,
	) -> Self {
		Self {
			catalog,
			formulas,
			dialect,
			resolved,
			aliases: AliasGen::default(),
		}
	}

	pub fn fragment_ctx(&self) -> FragmentContext<'_> {
		FragmentContext::new(
			self.catalog,
			self.formulas,
			self.dialect,
			self.resolved.table.table_name.clone(),
			&self.aliases,
		)
	}

	/// The select list: every visible non-link column's fragment aliased
	/// under its title. Links are expanded during shaping, not selected.
	pub async fn select_list(&self) -> Result<RawSql> {
		let ctx = self.fragment_ctx();
		let mut parts = Vec::with_capacity(self.resolved.visible.len());
		for column in &self.resolved.visible {
			if column.uidt == Uidt::LinkToAnotherRecord {
				continue;
			}
			let fragment = sql_fragment(&ctx, column).await?;
			parts.push(fragment.alias(column.title.clone()));
		}
		Ok(RawSql::join(parts, ", "))
	}

	/// Compile view and request filters into one predicate. Both present
	/// combine with AND.
	pub async fn where_clause(&self, request_filter: Option<&FilterTree>) -> Result<Option<RawSql>> {
		let ctx = self.fragment_ctx();
		let view_filter = self.resolved.view.as_ref().and_then(|view| view.filter.as_ref());

		let mut compiled = Vec::new();
		for filter in [view_filter, request_filter].into_iter().flatten() {
			if let Some(predicate) =
				condition::compile(&ctx, &self.resolved.columns, filter).await?
			{
				compiled.push(predicate);
			}
		}
		Ok(match compiled.len() {
			0 => None,
			1 => compiled.into_iter().next(),
			_ => Some(RawSql::join(compiled, " and ")),
		})
	}

	/// ORDER BY with a deterministic primary-key tiebreak so pagination
	/// is reproducible.
	pub async fn order_by(&self, sorts: &[Sort]) -> Result<Option<RawSql>> {
		let ctx = self.fragment_ctx();
		let mut parts = Vec::new();
		for sort in sorts {
			let column = self
				.resolved
				.columns
				.iter()
				.find(|column| column.id == sort.column_id)
				.ok_or_else(|| ResolveError::ColumnNotFound {
					column: sort.column_id.clone(),
				})?;
			let mut fragment = sql_fragment(&ctx, column).await?;
			fragment.push_sql(&format!(" {}", sort.direction.sql()));
			// MySQL and SQLite order NULLs before non-NULLs ascending;
			// Postgres defaults to the opposite, so pin it
			if self.dialect == Dialect::Postgres {
				fragment.push_sql(match sort.direction {
					SortDirection::Asc => " nulls first",
					SortDirection::Desc => " nulls last",
				});
			}
			parts.push(fragment);
		}
		for pk in &self.resolved.pk {
			if sorts.iter().any(|sort| sort.column_id == pk.id) {
				continue;
			}
			let mut fragment = sql_fragment(&ctx, pk).await?;
			fragment.push_sql(" asc");
			parts.push(fragment);
		}
		Ok(if parts.is_empty() {
			None
		} else {
			Some(RawSql::join(parts, ", "))
		})
	}

	pub async fn list_query(
		&self,
		where_clause: Option<&RawSql>,
		sorts: &[Sort],
		limit: Option<u64>,
		offset: Option<u64>,
		locking: bool,
	) -> Result<RawSql> {
		let mut query = RawSql::lit("select ");
		query.push(self.select_list().await?);
		query.push_sql(" from ");
		query.push(RawSql::ident(self.resolved.table.table_name.clone()));
		if let Some(predicate) = where_clause {
			query.push_sql(" where ");
			query.push(predicate.clone());
		}
		if let Some(order) = self.order_by(sorts).await? {
			query.push_sql(" order by ");
			query.push(order);
		}
		query.push_sql(&self.dialect.limit_offset(limit, offset));
		if locking && self.dialect.supports_for_update() {
			query.push_sql(" for update");
		}
		Ok(query)
	}

	pub fn count_query(&self, where_clause: Option<&RawSql>) -> RawSql {
		let mut query = RawSql::lit("select count(*) as ");
		query.push(RawSql::ident("count"));
		query.push_sql(" from ");
		query.push(RawSql::ident(self.resolved.table.table_name.clone()));
		if let Some(predicate) = where_clause {
			query.push_sql(" where ");
			query.push(predicate.clone());
		}
		query
	}

	/// `pk = ?` for the table's first primary-key column.
	pub fn pk_predicate(&self, id: &Value) -> Result<RawSql> {
		let pk = self.resolved.first_pk()?;
		let name = pk.column_name.as_deref().ok_or_else(|| {
			gridbase_column::Error::MissingPhysicalName {
				column: pk.id.clone(),
			}
		})?;
		let mut predicate =
			RawSql::ident(format!("{}.{}", self.resolved.table.table_name, name));
		predicate.push_sql(" = ");
		predicate.push(RawSql::value(id.clone()));
		Ok(predicate)
	}

	/// INSERT from a title-keyed record. Unknown titles are a client
	/// error; virtual columns in the payload are skipped.
	pub fn insert_statement(&self, data: &Record) -> Result<RawSql> {
		let mut names = Vec::new();
		let mut values = Vec::new();
		for (title, value) in data {
			let column = self.writable_column(title)?;
			let Some(name) = column.column_name.as_deref() else {
				continue;
			};
			names.push(RawSql::ident(name.to_string()));
			values.push(RawSql::value(value.clone()));
		}

		let mut statement = RawSql::lit("insert into ");
		statement.push(RawSql::ident(self.resolved.table.table_name.clone()));
		statement.push_sql(" (");
		statement.push(RawSql::join(names, ", "));
		statement.push_sql(") values (");
		statement.push(RawSql::join(values, ", "));
		statement.push_sql(")");
		Ok(statement)
	}

	/// UPDATE SET from a title-keyed patch, with the given predicate.
	pub fn update_statement(&self, patch: &Record, predicate: &RawSql) -> Result<RawSql> {
		let mut assignments = Vec::new();
		for (title, value) in patch {
			let column = self.writable_column(title)?;
			let Some(name) = column.column_name.as_deref() else {
				continue;
			};
			let mut assignment = RawSql::ident(name.to_string());
			assignment.push_sql(" = ");
			assignment.push(RawSql::value(value.clone()));
			assignments.push(assignment);
		}

		let mut statement = RawSql::lit("update ");
		statement.push(RawSql::ident(self.resolved.table.table_name.clone()));
		statement.push_sql(" set ");
		statement.push(RawSql::join(assignments, ", "));
		statement.push_sql(" where ");
		statement.push(predicate.clone());
		Ok(statement)
	}

	pub fn delete_statement(&self, predicate: &RawSql) -> RawSql {
		let mut statement = RawSql::lit("delete from ");
		statement.push(RawSql::ident(self.resolved.table.table_name.clone()));
		statement.push_sql(" where ");
		statement.push(predicate.clone());
		statement
	}

	/// `select pk .. for update` row lock ahead of a single-row write,
	/// where the dialect has one.
	pub fn lock_statement(&self, predicate: &RawSql) -> Result<Option<RawSql>> {
		if !self.dialect.supports_for_update() {
			return Ok(None);
		}
		let pk = self.resolved.first_pk()?;
		let name = pk.column_name.as_deref().ok_or_else(|| {
			gridbase_column::Error::MissingPhysicalName {
				column: pk.id.clone(),
			}
		})?;
		let mut statement = RawSql::lit("select ");
		statement.push(RawSql::ident(format!("{}.{}", self.resolved.table.table_name, name)));
		statement.push_sql(" from ");
		statement.push(RawSql::ident(self.resolved.table.table_name.clone()));
		statement.push_sql(" where ");
		statement.push(predicate.clone());
		statement.push_sql(" for update");
		Ok(Some(statement))
	}

	fn writable_column(&self, title: &str) -> Result<&ColumnMeta> {
		let column = self.resolved.column_by_title(title).ok_or_else(|| {
			ResolveError::ColumnNotFound {
				column: ColumnId::from(title),
			}
		})?;
		if column.uidt.is_virtual() {
			debug!(title, "skipping virtual column in write payload");
		}
		Ok(column)
	}
}
