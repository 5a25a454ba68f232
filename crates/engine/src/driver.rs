// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 Gridbase

use async_trait::async_trait;
use gridbase_sql::{Dialect, Statement};
use gridbase_type::Value;
use indexmap::IndexMap;

use crate::Result;

/// One raw result row, column titles in select-list order.
pub type Row = IndexMap<String, Value>;

/// The backing-database boundary. Statements are always parameterized;
/// a driver never receives values spliced into SQL text.
///
/// `is_external` selects the execution channel for bulk writes: local
/// stores get one transaction, external/federated stores get the same
/// pre-rendered statements forwarded individually. The SQL is identical
/// either way.
#[async_trait]
pub trait Driver: Send + Sync {
	fn dialect(&self) -> Dialect;

	fn is_external(&self) -> bool {
		false
	}

	async fn query(&self, statement: &Statement) -> Result<Vec<Row>>;

	/// Run a write statement, returning the affected row count.
	async fn execute(&self, statement: &Statement) -> Result<u64>;

	async fn begin(&self) -> Result<()>;
	async fn commit(&self) -> Result<()>;
	async fn rollback(&self) -> Result<()>;
}
